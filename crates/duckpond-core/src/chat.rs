use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of messages retained in the feed.
pub const FEED_CAPACITY: usize = 50;
/// Author sentinel for server-generated messages.
pub const SYSTEM_AUTHOR: &str = "system";

/// A single chat message. `id` is a display ordinal assigned monotonically
/// within the current feed, not a primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub author: String,
    pub text: String,
    pub timestamp: String,
}

/// The server-wide bounded chat feed: appending past [`FEED_CAPACITY`]
/// drops the oldest entries, keeping the newest in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFeed {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl ChatFeed {
    /// Append a message stamped with a short-form time, truncating from the
    /// front if the feed is full. Returns the assigned id.
    pub fn push(&mut self, author: &str, text: &str, now: DateTime<Utc>) -> u64 {
        let id = self.messages.last().map_or(1, |m| m.id + 1);
        self.messages.push(ChatMessage {
            id,
            author: author.to_owned(),
            text: text.to_owned(),
            timestamp: now.format("%H:%M").to_string(),
        });
        if self.messages.len() > FEED_CAPACITY {
            let excess = self.messages.len() - FEED_CAPACITY;
            self.messages.drain(..excess);
        }
        id
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut feed = ChatFeed::default();
        let now = Utc::now();
        assert_eq!(feed.push("alice", "hi", now), 1);
        assert_eq!(feed.push("bob", "hey", now), 2);
        assert_eq!(feed.push("alice", "how goes", now), 3);
    }

    #[test]
    fn test_truncation_keeps_newest_fifty_in_order() {
        let mut feed = ChatFeed::default();
        let now = Utc::now();
        for i in 0..60 {
            feed.push("alice", &format!("msg {i}"), now);
        }
        assert_eq!(feed.messages.len(), FEED_CAPACITY);
        assert_eq!(feed.messages.first().map(|m| m.text.as_str()), Some("msg 10"));
        assert_eq!(feed.messages.last().map(|m| m.text.as_str()), Some("msg 59"));
        for pair in feed.messages.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
    }

    #[test]
    fn test_clear_empties_feed() {
        let mut feed = ChatFeed::default();
        feed.push("alice", "hi", Utc::now());
        feed.clear();
        assert!(feed.messages.is_empty());
        // The next id restarts from the counter basis.
        assert_eq!(feed.push(SYSTEM_AUTHOR, "fresh start", Utc::now()), 1);
    }
}
