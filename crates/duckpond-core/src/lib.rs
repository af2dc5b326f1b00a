pub mod chat;
pub mod collection;
pub mod error;
pub mod presence;
pub mod tasks;

pub use chat::{ChatFeed, ChatMessage, FEED_CAPACITY, SYSTEM_AUTHOR};
pub use collection::{Collection, Duck, DEFAULT_COLOR, DEFAULT_NAME};
pub use error::DomainError;
pub use presence::{PresenceRecord, DEFAULT_WINDOW_SECS, STATUS_ACTIVE, STATUS_OFFLINE};
pub use tasks::{TaskItem, TaskList};
