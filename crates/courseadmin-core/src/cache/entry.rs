use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Lifecycle of the fetch behind a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Pending,
    Resolved,
    Error(String),
}

/// A cached query result.
///
/// Entries live inside the [`CacheManager`](super::CacheManager); callers
/// only ever see cloned snapshots returned by `read`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: Option<serde_json::Value>,
    pub status: EntryStatus,
    pub fetched_at: Option<DateTime<Utc>>,
    pub stale: bool,
    /// Bumped on every invalidation. A fetch only counts as fresh when it
    /// started at the generation the entry still has.
    #[serde(default)]
    pub generation: u64,
    /// Generation of the most recently started fetch still in flight.
    #[serde(skip)]
    pub(crate) fetching: Option<u64>,
    /// Generation the stored value was fetched at.
    #[serde(skip)]
    pub(crate) value_generation: u64,
}

impl CacheEntry {
    pub(crate) fn resolved(value: serde_json::Value) -> Self {
        Self {
            value: Some(value),
            status: EntryStatus::Resolved,
            fetched_at: Some(Utc::now()),
            stale: false,
            generation: 0,
            fetching: None,
            value_generation: 0,
        }
    }

    pub(crate) fn pending() -> Self {
        Self {
            value: None,
            status: EntryStatus::Pending,
            fetched_at: None,
            stale: true,
            generation: 0,
            fetching: None,
            value_generation: 0,
        }
    }

    /// Fresh means resolved and not marked stale.
    pub fn is_fresh(&self) -> bool {
        !self.stale && self.status == EntryStatus::Resolved
    }

    pub fn is_stale(&self) -> bool {
        !self.is_fresh()
    }

    pub fn is_pending(&self) -> bool {
        self.status == EntryStatus::Pending
    }

    pub fn error(&self) -> Option<&str> {
        match self.status {
            EntryStatus::Error(ref message) => Some(message),
            _ => None,
        }
    }

    /// True when the value is older than `max_age`. Entries that never
    /// resolved count as expired.
    pub fn is_expired(&self, max_age: Duration) -> bool {
        match self.fetched_at {
            Some(at) => Utc::now() - at > max_age,
            None => true,
        }
    }

    /// Deserialize the cached JSON into a model type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self.value {
            Some(ref value) => {
                let decoded = serde_json::from_value(value.clone())
                    .context("Failed to decode cached value")?;
                Ok(Some(decoded))
            }
            None => Ok(None),
        }
    }

    pub fn age_minutes(&self) -> Option<i64> {
        self.fetched_at.map(|at| (Utc::now() - at).num_minutes())
    }

    pub fn age_display(&self) -> String {
        let minutes = match self.age_minutes() {
            Some(m) => m,
            None => return "never".to_string(),
        };
        if minutes < 1 {
            // Negative ages come from clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolved_entry_is_fresh() {
        let entry = CacheEntry::resolved(json!([1, 2, 3]));
        assert!(entry.is_fresh());
        assert!(!entry.is_pending());
        assert_eq!(entry.age_display(), "just now");
    }

    #[test]
    fn test_pending_entry_is_not_fresh() {
        let entry = CacheEntry::pending();
        assert!(entry.is_stale());
        assert!(entry.is_pending());
        assert!(entry.is_expired(Duration::minutes(5)));
        assert_eq!(entry.age_display(), "never");
    }

    #[test]
    fn test_age_display_rounding() {
        let mut entry = CacheEntry::resolved(json!(null));
        entry.fetched_at = Some(Utc::now() - Duration::minutes(95));
        assert_eq!(entry.age_display(), "2h ago");

        entry.fetched_at = Some(Utc::now() - Duration::minutes(65));
        assert_eq!(entry.age_display(), "1h ago");

        entry.fetched_at = Some(Utc::now() - Duration::hours(40));
        assert_eq!(entry.age_display(), "2d ago");
    }

    #[test]
    fn test_is_expired() {
        let mut entry = CacheEntry::resolved(json!(1));
        assert!(!entry.is_expired(Duration::minutes(5)));
        entry.fetched_at = Some(Utc::now() - Duration::minutes(6));
        assert!(entry.is_expired(Duration::minutes(5)));
    }

    #[test]
    fn test_decode() {
        let entry = CacheEntry::resolved(json!({"a": 1}));
        let decoded: Option<serde_json::Map<String, serde_json::Value>> = entry.decode().unwrap();
        assert_eq!(decoded.unwrap()["a"], json!(1));

        let bad: Result<Option<Vec<String>>> = entry.decode();
        assert!(bad.is_err());

        assert!(CacheEntry::pending().decode::<i64>().unwrap().is_none());
    }

    #[test]
    fn test_error_status() {
        let mut entry = CacheEntry::pending();
        entry.status = EntryStatus::Error("boom".to_string());
        assert_eq!(entry.error(), Some("boom"));
        assert!(entry.is_stale());
    }
}
