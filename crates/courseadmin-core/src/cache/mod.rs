//! Client-side cache coherence.
//!
//! This module provides the `CacheManager`, an in-memory cache of query
//! results addressed by structured keys, together with the rule table that
//! decides which cached views a mutation invalidates.
//!
//! - `key`: `CacheKey` and prefix matching
//! - `entry`: `CacheEntry` and its fetch status
//! - `rules`: `MutationKind` to invalidation-prefix functions
//! - `manager`: the `CacheManager` itself

pub mod entry;
pub mod key;
pub mod manager;
pub mod rules;

pub use entry::{CacheEntry, EntryStatus};
pub use key::{CacheKey, KeySegment};
pub use manager::{CacheManager, CacheStats, FetchTicket, InvalidationOutcome};
pub use rules::{InvalidationRules, MutationKind, RuleFn};
