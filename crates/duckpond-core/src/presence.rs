use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Status recorded when a user first appears or heartbeats with no prior
/// record.
pub const STATUS_ACTIVE: &str = "active";
/// Status recorded on logout; excluded from the active list regardless of
/// how fresh `last_seen` is.
pub const STATUS_OFFLINE: &str = "offline";

/// Default presence window in seconds (5 minutes).
pub const DEFAULT_WINDOW_SECS: i64 = 300;

/// One user's last observed status and heartbeat time.
///
/// `last_seen` is RFC 3339 text rather than a typed timestamp: a malformed
/// value must degrade to "inactive", never fail the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub status: String,
    pub last_seen: String,
}

impl PresenceRecord {
    /// Build a record stamped at `now`.
    pub fn new(status: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            status: status.into(),
            last_seen: now.to_rfc3339(),
        }
    }

    /// Heartbeat transition: refresh `last_seen`, keeping the previous
    /// status unless an explicit one is given. A user with no prior record
    /// starts as [`STATUS_ACTIVE`].
    pub fn heartbeat(
        prev: Option<&PresenceRecord>,
        status: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let status = status
            .map(str::to_owned)
            .or_else(|| prev.map(|p| p.status.clone()))
            .unwrap_or_else(|| STATUS_ACTIVE.to_owned());
        Self::new(status, now)
    }

    /// The record written on logout.
    pub fn offline(now: DateTime<Utc>) -> Self {
        Self::new(STATUS_OFFLINE, now)
    }

    /// Active iff the status is not the offline sentinel and the last
    /// heartbeat is strictly younger than `window`.
    pub fn is_active(&self, now: DateTime<Utc>, window: TimeDelta) -> bool {
        if self.status == STATUS_OFFLINE {
            return false;
        }
        match DateTime::parse_from_rfc3339(&self.last_seen) {
            Ok(seen) => now.signed_duration_since(seen.with_timezone(&Utc)) < window,
            Err(_) => false,
        }
    }
}

/// An explicit status update must carry a non-empty status.
pub fn validate_status(status: &str) -> Result<(), DomainError> {
    if status.is_empty() {
        return Err(DomainError::EmptyStatus);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> TimeDelta {
        TimeDelta::seconds(DEFAULT_WINDOW_SECS)
    }

    #[test]
    fn test_fresh_heartbeat_is_active() {
        let now = Utc::now();
        let record = PresenceRecord::new("working", now - TimeDelta::seconds(299));
        assert!(record.is_active(now, window()));
    }

    #[test]
    fn test_stale_heartbeat_is_inactive() {
        let now = Utc::now();
        let record = PresenceRecord::new("working", now - TimeDelta::seconds(301));
        assert!(!record.is_active(now, window()));
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let now = Utc::now();
        let record = PresenceRecord::new("working", now - window());
        assert!(!record.is_active(now, window()));
    }

    #[test]
    fn test_offline_is_inactive_regardless_of_recency() {
        let now = Utc::now();
        let record = PresenceRecord::offline(now);
        assert!(!record.is_active(now, window()));
    }

    #[test]
    fn test_unparseable_last_seen_is_inactive() {
        let record = PresenceRecord {
            status: "working".to_owned(),
            last_seen: "not a timestamp".to_owned(),
        };
        assert!(!record.is_active(Utc::now(), window()));
    }

    #[test]
    fn test_heartbeat_preserves_previous_status() {
        let now = Utc::now();
        let prev = PresenceRecord::new("lunch", now - TimeDelta::minutes(1));
        let next = PresenceRecord::heartbeat(Some(&prev), None, now);
        assert_eq!(next.status, "lunch");
        assert_eq!(next.last_seen, now.to_rfc3339());
    }

    #[test]
    fn test_heartbeat_without_history_defaults_to_active() {
        let next = PresenceRecord::heartbeat(None, None, Utc::now());
        assert_eq!(next.status, STATUS_ACTIVE);
    }

    #[test]
    fn test_heartbeat_explicit_status_wins() {
        let now = Utc::now();
        let prev = PresenceRecord::new("lunch", now);
        let next = PresenceRecord::heartbeat(Some(&prev), Some("meeting"), now);
        assert_eq!(next.status, "meeting");
    }

    #[test]
    fn test_validate_status_rejects_empty() {
        assert_eq!(validate_status(""), Err(DomainError::EmptyStatus));
        assert!(validate_status("working").is_ok());
    }
}
