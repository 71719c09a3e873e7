//! Core library for courseadmin.
//!
//! Provides the pieces of the admin console that do not depend on a user
//! interface:
//!
//! - `cache`: the `CacheManager` and its invalidation rules
//! - `catalog`: cache keys, typed queries and the console's invalidation table
//! - `mutation`: mutation state machine, outcomes and notifications
//! - `api`: the REST client
//! - `models`: progress, content item and video library types
//! - `config`: configuration loading

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod models;
pub mod mutation;
pub mod utils;

pub use cache::{CacheEntry, CacheKey, CacheManager, MutationKind};
pub use config::Config;
pub use mutation::{MutationLedger, MutationOutcome, MutationState, Notification};
