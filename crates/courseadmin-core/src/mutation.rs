//! Mutation lifecycle.
//!
//! A mutation is started with [`MutationLedger::begin`], its remote call
//! runs elsewhere, and the resulting [`MutationOutcome`] is handed back to
//! [`MutationLedger::settle`]. Settling a success applies the cache
//! invalidation for the mutation's kind; settling a failure leaves the
//! cache untouched. Either way the caller gets a [`Notification`] to show.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::cache::{CacheManager, MutationKind};

/// Default time-to-live for notifications.
const DEFAULT_NOTIFICATION_SECONDS: i64 = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MutationState {
    #[default]
    Idle,
    Pending {
        since: DateTime<Utc>,
    },
    Succeeded {
        at: DateTime<Utc>,
    },
    Failed {
        reason: String,
        at: DateTime<Utc>,
    },
}

impl MutationState {
    pub fn is_pending(&self) -> bool {
        matches!(self, MutationState::Pending { .. })
    }
}

/// A mutation in flight. Dropped once it is settled.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub id: u64,
    pub kind: MutationKind,
    pub label: String,
    pub input: Value,
    pub result: Option<Value>,
    pub started_at: DateTime<Utc>,
}

/// Why a mutation failed, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationFailure {
    NotFound(String),
    RemoteFailure(String),
}

impl MutationFailure {
    /// Classify an error returned by the API client.
    pub fn from_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<ApiError>() {
            Some(api) if api.is_not_found() => MutationFailure::NotFound(api.to_string()),
            Some(api) => MutationFailure::RemoteFailure(api.to_string()),
            None => MutationFailure::RemoteFailure(format!("{:#}", error)),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            MutationFailure::NotFound(m) | MutationFailure::RemoteFailure(m) => m,
        }
    }
}

impl From<anyhow::Error> for MutationFailure {
    fn from(error: anyhow::Error) -> Self {
        Self::from_error(&error)
    }
}

/// A record paired with what the remote call returned.
#[derive(Debug)]
pub struct MutationOutcome {
    pub record: MutationRecord,
    pub result: Result<Value, MutationFailure>,
}

impl MutationOutcome {
    pub fn new(record: MutationRecord, result: Result<Value, MutationFailure>) -> Self {
        Self { record, result }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Failure,
}

/// Transient message surfaced after a mutation settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Failure,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now() - self.created_at > ttl
    }

    pub fn default_ttl() -> Duration {
        Duration::seconds(DEFAULT_NOTIFICATION_SECONDS)
    }
}

/// Tracks in-flight mutations and the last state per kind.
#[derive(Debug, Default)]
pub struct MutationLedger {
    next_id: u64,
    in_flight: HashMap<u64, MutationKind>,
    states: HashMap<MutationKind, MutationState>,
}

impl MutationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, kind: MutationKind, label: impl Into<String>, input: Value) -> MutationRecord {
        self.next_id += 1;
        let started_at = Utc::now();
        self.in_flight.insert(self.next_id, kind.clone());
        self.states
            .insert(kind.clone(), MutationState::Pending { since: started_at });
        debug!(id = self.next_id, kind = %kind, "Mutation started");
        MutationRecord {
            id: self.next_id,
            kind,
            label: label.into(),
            input,
            result: None,
            started_at,
        }
    }

    /// Finish a mutation. Invalidation runs only for successful outcomes and
    /// always runs for them, whoever started the mutation.
    pub fn settle(&mut self, cache: &mut CacheManager, outcome: MutationOutcome) -> Notification {
        let MutationOutcome { mut record, result } = outcome;
        self.in_flight.remove(&record.id);

        // A later mutation of the same kind owns the displayed state
        let still_pending = self.in_flight.values().any(|k| *k == record.kind);

        match result {
            Ok(value) => {
                let invalidation = cache.apply_mutation(&record.kind, &record.input, &value);
                record.result = Some(value);
                info!(
                    id = record.id,
                    kind = %record.kind,
                    invalidated = invalidation.entries(),
                    "Mutation succeeded"
                );
                if !still_pending {
                    self.states
                        .insert(record.kind.clone(), MutationState::Succeeded { at: Utc::now() });
                }
                Notification::success(format!("{}: done", record.label))
            }
            Err(failure) => {
                warn!(id = record.id, kind = %record.kind, error = failure.message(), "Mutation failed");
                if !still_pending {
                    self.states.insert(
                        record.kind.clone(),
                        MutationState::Failed {
                            reason: failure.message().to_string(),
                            at: Utc::now(),
                        },
                    );
                }
                match failure {
                    MutationFailure::NotFound(_) => {
                        Notification::failure(format!("{}: not found", record.label))
                    }
                    MutationFailure::RemoteFailure(ref reason) => {
                        Notification::failure(format!("{} failed: {}", record.label, reason))
                    }
                }
            }
        }
    }

    pub fn state(&self, kind: &MutationKind) -> MutationState {
        self.states.get(kind).cloned().unwrap_or_default()
    }

    pub fn is_pending(&self, kind: &MutationKind) -> bool {
        self.in_flight.values().any(|k| k == kind)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Return a kind to `Idle` once its result has been shown.
    pub fn reset(&mut self, kind: &MutationKind) {
        if !self.is_pending(kind) {
            self.states.remove(kind);
        }
    }
}
