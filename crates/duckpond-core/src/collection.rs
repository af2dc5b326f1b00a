use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Color assigned to a duck when the client supplies none.
pub const DEFAULT_COLOR: &str = "#FFD700";
/// Label assigned to a duck added with an empty name.
pub const DEFAULT_NAME: &str = "Duck";

/// One annotated item in a user's collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duck {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_owned()
}

impl Duck {
    /// Empty name and color fall back to the defaults rather than failing.
    pub fn new(name: &str, color: &str) -> Self {
        Self {
            name: if name.is_empty() { DEFAULT_NAME.to_owned() } else { name.to_owned() },
            color: if color.is_empty() { DEFAULT_COLOR.to_owned() } else { color.to_owned() },
        }
    }
}

/// A user's collection of annotated ducks.
///
/// Invariants upheld after every operation:
/// - `items` keys are exactly `1..=count` (dense, no gaps, no duplicates)
/// - `annotations` keys are a subset of `items` keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub items: BTreeMap<u32, Duck>,
    #[serde(default)]
    pub annotations: BTreeMap<u32, String>,
}

impl Collection {
    /// Append a duck at index `count + 1`.
    pub fn add(&mut self, name: &str, color: &str) -> u32 {
        let index = self.count + 1;
        self.items.insert(index, Duck::new(name, color));
        self.count = index;
        index
    }

    /// Remove the duck at `index` and renumber the survivors to close the
    /// gap, carrying each surviving annotation to its item's new index.
    ///
    /// A missing index is a silent no-op so concurrent admin/user deletions
    /// never surface as failures.
    pub fn remove(&mut self, index: u32) {
        if self.items.remove(&index).is_none() {
            return;
        }
        self.annotations.remove(&index);
        self.reconcile();
    }

    /// Reset to the empty collection. Idempotent.
    pub fn clear(&mut self) {
        self.count = 0;
        self.items.clear();
        self.annotations.clear();
    }

    /// Attach a comment to an existing item. No-op if the index is absent,
    /// which keeps the annotation keys a subset of the item keys.
    pub fn annotate(&mut self, index: u32, text: impl Into<String>) {
        if self.items.contains_key(&index) {
            self.annotations.insert(index, text.into());
        }
    }

    /// Rebuild a collection from a client-submitted snapshot.
    ///
    /// Lenient merge: keys that fail to parse or fall outside `1..=count`
    /// are dropped, annotations without a surviving item are dropped, and
    /// the result is compacted so the dense-index invariant holds even for
    /// gappy input.
    pub fn from_snapshot(
        count: u32,
        items: BTreeMap<String, Duck>,
        annotations: BTreeMap<String, String>,
    ) -> Self {
        let mut collection = Self::default();
        for (key, duck) in items {
            match key.parse::<u32>() {
                Ok(index) if index >= 1 && index <= count => {
                    collection.items.insert(index, duck);
                }
                _ => {}
            }
        }
        for (key, text) in annotations {
            if let Ok(index) = key.parse::<u32>() {
                if collection.items.contains_key(&index) {
                    collection.annotations.insert(index, text);
                }
            }
        }
        collection.reconcile();
        collection
    }

    /// Renumber items to `1..=N` in ascending index order, move annotations
    /// with their items and drop any annotation without one.
    pub fn reconcile(&mut self) {
        let items = std::mem::take(&mut self.items);
        let annotations = std::mem::take(&mut self.annotations);
        for (next, (old_index, duck)) in (1u32..).zip(items) {
            if let Some(text) = annotations.get(&old_index) {
                self.annotations.insert(next, text.clone());
            }
            self.items.insert(next, duck);
        }
        self.count = self.items.len() as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(c: &Collection) {
        assert_eq!(c.count as usize, c.items.len());
        for (expected, actual) in (1..=c.count).zip(c.items.keys().copied()) {
            assert_eq!(expected, actual);
        }
        for key in c.annotations.keys() {
            assert!(c.items.contains_key(key));
        }
    }

    #[test]
    fn test_add_assigns_dense_indices() {
        let mut c = Collection::default();
        assert_eq!(c.add("Quackers", "#FF0000"), 1);
        assert_eq!(c.add("Bill", "#00FF00"), 2);
        assert_eq!(c.add("Puddles", "#0000FF"), 3);
        assert_eq!(c.count, 3);
        assert_invariants(&c);
    }

    #[test]
    fn test_empty_name_and_color_use_defaults() {
        let mut c = Collection::default();
        c.add("", "");
        assert_eq!(c.items[&1].name, DEFAULT_NAME);
        assert_eq!(c.items[&1].color, DEFAULT_COLOR);
    }

    #[test]
    fn test_remove_compacts_and_carries_annotations() {
        let mut c = Collection::default();
        c.add("A", "#111111");
        c.add("B", "#222222");
        c.add("C", "#333333");
        c.annotate(3, "nice");

        c.remove(2);

        assert_eq!(c.count, 2);
        assert_eq!(c.items[&1].name, "A");
        assert_eq!(c.items[&2].name, "C");
        assert_eq!(c.annotations.get(&2).map(String::as_str), Some("nice"));
        assert!(c.annotations.get(&3).is_none());
        assert_invariants(&c);
    }

    #[test]
    fn test_remove_preserves_relative_order() {
        let mut c = Collection::default();
        for name in ["one", "two", "three", "four", "five"] {
            c.add(name, "");
        }
        c.remove(3);

        assert_eq!(c.items[&1].name, "one");
        assert_eq!(c.items[&2].name, "two");
        assert_eq!(c.items[&3].name, "four");
        assert_eq!(c.items[&4].name, "five");
        assert_invariants(&c);
    }

    #[test]
    fn test_remove_missing_index_is_noop() {
        let mut c = Collection::default();
        c.add("A", "");
        let before = c.clone();

        c.remove(0);
        c.remove(2);
        c.remove(99);

        assert_eq!(c, before);
    }

    #[test]
    fn test_remove_last_item_yields_empty_collection() {
        let mut c = Collection::default();
        c.add("A", "");
        c.annotate(1, "solo");
        c.remove(1);

        assert_eq!(c, Collection::default());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut c = Collection::default();
        c.add("A", "");
        c.annotate(1, "note");

        c.clear();
        let once = c.clone();
        c.clear();

        assert_eq!(c, once);
        assert_eq!(c, Collection::default());
    }

    #[test]
    fn test_annotate_missing_index_is_dropped() {
        let mut c = Collection::default();
        c.add("A", "");
        c.annotate(2, "ghost");
        assert!(c.annotations.is_empty());
    }

    #[test]
    fn test_from_snapshot_drops_malformed_and_out_of_range_keys() {
        let items = BTreeMap::from([
            ("1".to_owned(), Duck::new("A", "")),
            ("0".to_owned(), Duck::new("zero", "")),
            ("4".to_owned(), Duck::new("beyond", "")),
            ("abc".to_owned(), Duck::new("junk", "")),
            ("2".to_owned(), Duck::new("B", "")),
        ]);
        let annotations = BTreeMap::from([
            ("2".to_owned(), "kept".to_owned()),
            ("4".to_owned(), "orphan".to_owned()),
            ("xyz".to_owned(), "junk".to_owned()),
        ]);

        let c = Collection::from_snapshot(3, items, annotations);

        assert_eq!(c.count, 2);
        assert_eq!(c.items[&1].name, "A");
        assert_eq!(c.items[&2].name, "B");
        assert_eq!(c.annotations.get(&2).map(String::as_str), Some("kept"));
        assert_invariants(&c);
    }

    #[test]
    fn test_from_snapshot_compacts_gappy_input() {
        let items = BTreeMap::from([
            ("1".to_owned(), Duck::new("A", "")),
            ("3".to_owned(), Duck::new("C", "")),
        ]);
        let annotations = BTreeMap::from([("3".to_owned(), "nice".to_owned())]);

        let c = Collection::from_snapshot(3, items, annotations);

        assert_eq!(c.count, 2);
        assert_eq!(c.items[&2].name, "C");
        assert_eq!(c.annotations.get(&2).map(String::as_str), Some("nice"));
        assert_invariants(&c);
    }

    #[test]
    fn test_from_snapshot_zero_count_drops_everything() {
        let items = BTreeMap::from([("1".to_owned(), Duck::new("A", ""))]);
        let c = Collection::from_snapshot(0, items, BTreeMap::new());
        assert_eq!(c, Collection::default());
    }

    #[test]
    fn test_invariants_hold_across_mixed_operations() {
        let mut c = Collection::default();
        for i in 0..10 {
            c.add(&format!("duck{i}"), "");
        }
        c.annotate(5, "five");
        c.annotate(10, "ten");
        c.remove(1);
        c.remove(4);
        c.remove(100);
        assert_invariants(&c);

        c = Collection::from_snapshot(
            c.count,
            c.items.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            c.annotations.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        );
        assert_invariants(&c);
        c.clear();
        assert_invariants(&c);
    }

    #[test]
    fn test_json_shape_uses_string_keys() {
        let mut c = Collection::default();
        c.add("A", "#123456");
        c.annotate(1, "note");

        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["items"]["1"]["name"], "A");
        assert_eq!(value["annotations"]["1"], "note");

        let back: Collection = serde_json::from_value(value).unwrap();
        assert_eq!(back, c);
    }
}
