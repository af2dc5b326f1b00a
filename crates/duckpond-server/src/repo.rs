use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use duckpond_core::chat::ChatFeed;
use duckpond_core::collection::Collection;
use duckpond_core::presence::{self, PresenceRecord};
use duckpond_core::tasks::TaskList;

use crate::error::AppError;
use crate::store::KvStore;

const USER_PREFIX: &str = "user:";
const PRESENCE_PREFIX: &str = "presence:";
const COLLECTION_PREFIX: &str = "collection:";
const TASKS_PREFIX: &str = "tasks:";
const CHAT_KEY: &str = "chat";

/// A user the presence tracker currently counts as active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveUser {
    pub username: String,
    pub status: String,
}

/// Typed accessors over the key-value collaborator.
///
/// One entity, one key; the prefix scan is confined to [`list_users`] and
/// [`list_active`].
///
/// [`list_users`]: Repository::list_users
/// [`list_active`]: Repository::list_active
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn KvStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    async fn load_or_default<T>(&self, key: &str) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match self.store.get(key).await? {
            Some(value) => Ok(serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("malformed record at {key}: {e}");
                T::default()
            })),
            None => Ok(T::default()),
        }
    }

    // --- users ---

    pub async fn user_exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(self
            .store
            .get(&format!("{USER_PREFIX}{username}"))
            .await?
            .is_some())
    }

    /// Create the profile key. Returns false when the name is already taken.
    pub async fn register_user(&self, username: &str) -> Result<bool, AppError> {
        let key = format!("{USER_PREFIX}{username}");
        if self.store.get(&key).await?.is_some() {
            return Ok(false);
        }
        self.store
            .put(&key, serde_json::json!({ "username": username }))
            .await?;
        Ok(true)
    }

    /// All registered usernames, derived from the profile key prefix.
    pub async fn list_users(&self) -> Result<Vec<String>, AppError> {
        let keys = self.store.keys_with_prefix(USER_PREFIX).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(USER_PREFIX).map(str::to_owned))
            .collect())
    }

    /// Best-effort multi-key delete: a failed key is logged and skipped, so
    /// a partial failure leaves orphans rather than aborting.
    pub async fn delete_user(&self, username: &str) -> Result<(), AppError> {
        for key in [
            format!("{USER_PREFIX}{username}"),
            format!("{PRESENCE_PREFIX}{username}"),
            format!("{COLLECTION_PREFIX}{username}"),
            format!("{TASKS_PREFIX}{username}"),
        ] {
            if let Err(e) = self.store.delete(&key).await {
                tracing::warn!("failed to delete {key}: {e}");
            }
        }
        Ok(())
    }

    // --- collections ---

    /// A missing or malformed record decays to the empty collection.
    pub async fn load_collection(&self, username: &str) -> Result<Collection, AppError> {
        self.load_or_default(&format!("{COLLECTION_PREFIX}{username}"))
            .await
    }

    /// The whole collection lands in a single write, so `count`, `items`
    /// and `annotations` are never visible out of step.
    pub async fn save_collection(
        &self,
        username: &str,
        collection: &Collection,
    ) -> Result<(), AppError> {
        self.store
            .put(
                &format!("{COLLECTION_PREFIX}{username}"),
                serde_json::to_value(collection)?,
            )
            .await?;
        Ok(())
    }

    pub async fn add_duck(&self, username: &str, name: &str, color: &str) -> Result<u32, AppError> {
        let mut collection = self.load_collection(username).await?;
        let index = collection.add(name, color);
        self.save_collection(username, &collection).await?;
        Ok(index)
    }

    pub async fn remove_duck(&self, username: &str, index: u32) -> Result<(), AppError> {
        let mut collection = self.load_collection(username).await?;
        collection.remove(index);
        self.save_collection(username, &collection).await
    }

    /// Idempotent: clearing an already-empty collection writes the same
    /// empty record.
    pub async fn clear_ducks(&self, username: &str) -> Result<(), AppError> {
        let mut collection = self.load_collection(username).await?;
        collection.clear();
        self.save_collection(username, &collection).await
    }

    /// Add one duck to each user. A failure for one user is logged and the
    /// rest continue; returns how many users were affected.
    pub async fn bulk_add(&self, users: &[String], name: &str, color: &str) -> usize {
        let mut affected = 0;
        for user in users {
            match self.add_duck(user, name, color).await {
                Ok(_) => affected += 1,
                Err(e) => tracing::warn!("bulk add skipped {user}: {e}"),
            }
        }
        affected
    }

    // --- presence ---

    pub async fn load_presence(&self, username: &str) -> Result<Option<PresenceRecord>, AppError> {
        match self
            .store
            .get(&format!("{PRESENCE_PREFIX}{username}"))
            .await?
        {
            Some(value) => Ok(serde_json::from_value(value).ok()),
            None => Ok(None),
        }
    }

    async fn save_presence(
        &self,
        username: &str,
        record: &PresenceRecord,
    ) -> Result<(), AppError> {
        self.store
            .put(
                &format!("{PRESENCE_PREFIX}{username}"),
                serde_json::to_value(record)?,
            )
            .await?;
        Ok(())
    }

    /// Refresh `last_seen`, keeping the previous status unless one is given.
    pub async fn heartbeat(&self, username: &str, status: Option<&str>) -> Result<(), AppError> {
        let prev = self.load_presence(username).await?;
        let record = PresenceRecord::heartbeat(prev.as_ref(), status, Utc::now());
        self.save_presence(username, &record).await
    }

    /// Explicit status update; an empty status is a validation error.
    pub async fn set_status(&self, username: &str, status: &str) -> Result<(), AppError> {
        presence::validate_status(status)?;
        self.heartbeat(username, Some(status)).await
    }

    pub async fn mark_offline(&self, username: &str) -> Result<(), AppError> {
        self.save_presence(username, &PresenceRecord::offline(Utc::now()))
            .await
    }

    /// Every user whose presence record passes `is_active`. Order is
    /// whatever the store enumeration yields; malformed records are skipped.
    pub async fn list_active(
        &self,
        now: DateTime<Utc>,
        window: TimeDelta,
    ) -> Result<Vec<ActiveUser>, AppError> {
        let mut active = Vec::new();
        for key in self.store.keys_with_prefix(PRESENCE_PREFIX).await? {
            let Some(username) = key.strip_prefix(PRESENCE_PREFIX) else {
                continue;
            };
            let Some(value) = self.store.get(&key).await? else {
                continue;
            };
            let Ok(record) = serde_json::from_value::<PresenceRecord>(value) else {
                continue;
            };
            if record.is_active(now, window) {
                active.push(ActiveUser {
                    username: username.to_owned(),
                    status: record.status,
                });
            }
        }
        Ok(active)
    }

    // --- chat ---

    pub async fn load_feed(&self) -> Result<ChatFeed, AppError> {
        self.load_or_default(CHAT_KEY).await
    }

    pub async fn save_feed(&self, feed: &ChatFeed) -> Result<(), AppError> {
        self.store
            .put(CHAT_KEY, serde_json::to_value(feed)?)
            .await?;
        Ok(())
    }

    /// Append under last-write-wins; concurrent sends may drop one another,
    /// which the feed tolerates.
    pub async fn push_message(&self, author: &str, text: &str) -> Result<(), AppError> {
        let mut feed = self.load_feed().await?;
        feed.push(author, text, Utc::now());
        self.save_feed(&feed).await
    }

    pub async fn clear_feed(&self) -> Result<(), AppError> {
        self.save_feed(&ChatFeed::default()).await
    }

    // --- tasks ---

    pub async fn load_tasks(&self, username: &str) -> Result<TaskList, AppError> {
        self.load_or_default(&format!("{TASKS_PREFIX}{username}"))
            .await
    }

    pub async fn save_tasks(&self, username: &str, tasks: &TaskList) -> Result<(), AppError> {
        self.store
            .put(
                &format!("{TASKS_PREFIX}{username}"),
                serde_json::to_value(tasks)?,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use duckpond_core::presence::{STATUS_ACTIVE, STATUS_OFFLINE};

    fn repo() -> Repository {
        Repository::new(Arc::new(MemStore::new()))
    }

    fn window() -> TimeDelta {
        TimeDelta::minutes(5)
    }

    #[tokio::test]
    async fn test_register_and_list_users() {
        let repo = repo();
        assert!(repo.register_user("alice").await.unwrap());
        assert!(!repo.register_user("alice").await.unwrap());
        assert!(repo.register_user("bob").await.unwrap());

        let mut users = repo.list_users().await.unwrap();
        users.sort();
        assert_eq!(users, vec!["alice".to_owned(), "bob".to_owned()]);
    }

    #[tokio::test]
    async fn test_delete_user_removes_all_records() {
        let repo = repo();
        repo.register_user("alice").await.unwrap();
        repo.add_duck("alice", "Quackers", "").await.unwrap();
        repo.heartbeat("alice", None).await.unwrap();

        repo.delete_user("alice").await.unwrap();

        assert!(!repo.user_exists("alice").await.unwrap());
        assert!(repo.load_presence("alice").await.unwrap().is_none());
        assert_eq!(repo.load_collection("alice").await.unwrap(), Collection::default());
        // Double delete stays silent.
        repo.delete_user("alice").await.unwrap();
    }

    #[tokio::test]
    async fn test_heartbeat_defaults_then_preserves_status() {
        let repo = repo();
        repo.heartbeat("alice", None).await.unwrap();
        let record = repo.load_presence("alice").await.unwrap().unwrap();
        assert_eq!(record.status, STATUS_ACTIVE);

        repo.set_status("alice", "lunch").await.unwrap();
        repo.heartbeat("alice", None).await.unwrap();
        let record = repo.load_presence("alice").await.unwrap().unwrap();
        assert_eq!(record.status, "lunch");
    }

    #[tokio::test]
    async fn test_set_status_rejects_empty() {
        let repo = repo();
        let err = repo.set_status("alice", "").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(repo.load_presence("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_active_applies_window_and_offline_sentinel() {
        let repo = repo();
        let now = Utc::now();

        repo.save_presence("fresh", &PresenceRecord::new("working", now - TimeDelta::seconds(299)))
            .await
            .unwrap();
        repo.save_presence("stale", &PresenceRecord::new("working", now - TimeDelta::seconds(301)))
            .await
            .unwrap();
        repo.save_presence("gone", &PresenceRecord::new(STATUS_OFFLINE, now))
            .await
            .unwrap();
        repo.save_presence(
            "garbled",
            &PresenceRecord {
                status: "working".to_owned(),
                last_seen: "???".to_owned(),
            },
        )
        .await
        .unwrap();

        let active = repo.list_active(now, window()).await.unwrap();
        assert_eq!(
            active,
            vec![ActiveUser {
                username: "fresh".to_owned(),
                status: "working".to_owned()
            }]
        );
    }

    #[tokio::test]
    async fn test_mark_offline_hides_user() {
        let repo = repo();
        repo.heartbeat("alice", None).await.unwrap();
        repo.mark_offline("alice").await.unwrap();
        let active = repo.list_active(Utc::now(), window()).await.unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn test_bulk_add_touches_every_user() {
        let repo = repo();
        repo.register_user("alice").await.unwrap();
        repo.register_user("bob").await.unwrap();
        repo.add_duck("alice", "Quackers", "").await.unwrap();

        let users = vec!["alice".to_owned(), "bob".to_owned()];
        let affected = repo.bulk_add(&users, "Gift", "#FFD700").await;

        assert_eq!(affected, 2);
        assert_eq!(repo.load_collection("alice").await.unwrap().count, 2);
        assert_eq!(repo.load_collection("bob").await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_malformed_collection_decays_to_default() {
        let repo = repo();
        repo.store
            .put("collection:alice", serde_json::json!("not a collection"))
            .await
            .unwrap();
        assert_eq!(
            repo.load_collection("alice").await.unwrap(),
            Collection::default()
        );
    }

    #[tokio::test]
    async fn test_feed_round_trip() {
        let repo = repo();
        repo.push_message("alice", "hello").await.unwrap();
        repo.push_message("bob", "hi").await.unwrap();

        let feed = repo.load_feed().await.unwrap();
        assert_eq!(feed.messages.len(), 2);
        assert_eq!(feed.messages[0].author, "alice");

        repo.clear_feed().await.unwrap();
        assert!(repo.load_feed().await.unwrap().messages.is_empty());
    }
}
