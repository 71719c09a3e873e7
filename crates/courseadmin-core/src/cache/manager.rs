use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{CacheEntry, CacheKey, EntryStatus, InvalidationRules, MutationKind};

/// Default age after which a resolved entry is reported stale.
const DEFAULT_STALE_MINUTES: i64 = 5;

/// Result of applying a mutation's invalidation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationOutcome {
    /// The rule ran; `entries` cached entries matched one of `prefixes`.
    Applied { prefixes: Vec<CacheKey>, entries: usize },
    /// No rule registered for the kind. Treated as a read-only operation.
    NoRule,
}

impl InvalidationOutcome {
    pub fn entries(&self) -> usize {
        match self {
            InvalidationOutcome::Applied { entries, .. } => *entries,
            InvalidationOutcome::NoRule => 0,
        }
    }
}

/// Handle for one in-flight fetch, returned by
/// [`CacheManager::begin_fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: CacheKey,
    generation: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

/// Counts for the status bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub stale: usize,
    pub pending: usize,
    pub errors: usize,
}

/// In-memory, key-addressed cache of query results plus the rule table
/// that decides which entries each mutation invalidates.
///
/// The manager is owned by a single caller and passed around explicitly.
/// All mutating operations take `&mut self`, so a mutation's invalidation
/// is never observed half-applied.
#[derive(Debug)]
pub struct CacheManager {
    entries: BTreeMap<CacheKey, CacheEntry>,
    rules: InvalidationRules,
    refetch_queue: BTreeSet<CacheKey>,
    stale_after: Duration,
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_STALE_MINUTES))
    }
}

impl CacheManager {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            rules: InvalidationRules::new(),
            refetch_queue: BTreeSet::new(),
            stale_after,
        }
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    // ===== Reads =====

    /// Snapshot of the entry at `key`.
    ///
    /// The snapshot reports stale when the entry was invalidated or has
    /// outlived `stale_after`. Nothing stored is modified and no fetch is
    /// triggered.
    pub fn read(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| {
            let mut snapshot = entry.clone();
            if entry.is_expired(self.stale_after) {
                snapshot.stale = true;
            }
            snapshot
        })
    }

    pub fn is_fresh(&self, key: &CacheKey) -> bool {
        self.read(key).map(|e| e.is_fresh()).unwrap_or(false)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys of every entry that would currently be read as stale.
    pub fn stale_keys(&self) -> Vec<CacheKey> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.stale || entry.is_expired(self.stale_after))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            entries: self.entries.len(),
            ..Default::default()
        };
        for entry in self.entries.values() {
            if entry.stale || entry.is_expired(self.stale_after) {
                stats.stale += 1;
            }
            match entry.status {
                EntryStatus::Pending => stats.pending += 1,
                EntryStatus::Error(_) => stats.errors += 1,
                EntryStatus::Resolved => {}
            }
        }
        stats
    }

    // ===== Writes =====

    /// Serialize and store `value` at `key`.
    pub fn write<T: Serialize>(&mut self, key: CacheKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("Failed to serialize value for {}", key))?;
        self.write_value(key, value);
        Ok(())
    }

    /// Store `value` at `key` as fresh and resolved, replacing any prior entry.
    ///
    /// This is an authoritative write. Results of fetches started with
    /// [`begin_fetch`](Self::begin_fetch) go through
    /// [`complete_fetch`](Self::complete_fetch) instead.
    pub fn write_value(&mut self, key: CacheKey, value: Value) {
        self.refetch_queue.remove(&key);
        let mut entry = CacheEntry::resolved(value);
        if let Some(previous) = self.entries.get(&key) {
            entry.generation = previous.generation;
            entry.value_generation = previous.generation;
        }
        self.entries.insert(key, entry);
    }

    /// Mark a fetch as started. A previous value is kept so it can still be
    /// shown while the request is in flight.
    ///
    /// The returned ticket records the entry's generation; hand it back to
    /// `complete_fetch` or `fail_fetch` when the request finishes.
    pub fn begin_fetch(&mut self, key: &CacheKey) -> FetchTicket {
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(CacheEntry::pending);
        entry.status = EntryStatus::Pending;
        entry.fetching = Some(entry.generation);
        self.refetch_queue.remove(key);
        FetchTicket {
            key: key.clone(),
            generation: entry.generation,
        }
    }

    /// Store the result of the fetch behind `ticket`. Returns true when the
    /// entry is now fresh.
    ///
    /// If the entry was invalidated after the fetch started, the value is
    /// kept for display but the entry stays stale. It is queued for refetch
    /// unless a newer fetch is already in flight. Results older than the
    /// stored value, and results for evicted entries, are dropped.
    pub fn complete_fetch(&mut self, ticket: &FetchTicket, value: Value) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            debug!(key = %ticket.key, "Dropping fetch result for evicted entry");
            return false;
        };

        if entry.generation == ticket.generation {
            entry.value = Some(value);
            entry.value_generation = ticket.generation;
            entry.fetched_at = Some(Utc::now());
            entry.status = EntryStatus::Resolved;
            entry.stale = false;
            entry.fetching = None;
            self.refetch_queue.remove(&ticket.key);
            return true;
        }

        debug!(
            key = %ticket.key,
            fetched = ticket.generation,
            current = entry.generation,
            "Fetch result is older than the last invalidation"
        );
        if entry.value_generation == entry.generation && !entry.stale {
            // A newer fetch already made the entry fresh
            return false;
        }
        if ticket.generation >= entry.value_generation {
            entry.value = Some(value);
            entry.value_generation = ticket.generation;
            entry.fetched_at = Some(Utc::now());
        }
        entry.stale = true;
        if entry.fetching != Some(entry.generation) {
            entry.status = EntryStatus::Resolved;
            entry.fetching = None;
            self.refetch_queue.insert(ticket.key.clone());
        }
        false
    }

    /// Record a failed fetch. The entry stays stale.
    ///
    /// A failure from a fetch that a newer one has superseded is ignored.
    pub fn fail_fetch(&mut self, ticket: &FetchTicket, message: impl Into<String>) {
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            return;
        };
        let superseded = entry.generation != ticket.generation;
        if superseded && entry.fetching == Some(entry.generation) {
            return;
        }
        entry.status = EntryStatus::Error(message.into());
        entry.stale = true;
        entry.fetching = None;
        if superseded {
            self.refetch_queue.insert(ticket.key.clone());
        }
    }

    // ===== Invalidation =====

    /// Mark every entry under `prefix` stale and queue it for refetch.
    /// Fetches already in flight for those entries can no longer make them
    /// fresh. Returns the number of matching entries; zero matches is a no-op.
    pub fn invalidate(&mut self, prefix: &CacheKey) -> usize {
        let mut matched = 0;
        for (key, entry) in self.entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.stale = true;
                entry.generation += 1;
                self.refetch_queue.insert(key.clone());
                matched += 1;
            }
        }
        debug!(prefix = %prefix, matched, "Invalidated cache prefix");
        matched
    }

    /// Remove every entry under `prefix`. Returns the number removed.
    pub fn evict(&mut self, prefix: &CacheKey) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        self.refetch_queue.retain(|key| !key.starts_with(prefix));
        let removed = before - self.entries.len();
        debug!(prefix = %prefix, removed, "Evicted cache prefix");
        removed
    }

    /// Drain the keys invalidated since the previous call.
    pub fn take_refetch_queue(&mut self) -> Vec<CacheKey> {
        std::mem::take(&mut self.refetch_queue).into_iter().collect()
    }

    // ===== Rules =====

    pub fn register_rule<F>(&mut self, kind: impl Into<MutationKind>, rule: F)
    where
        F: Fn(&Value, &Value) -> Vec<CacheKey> + Send + Sync + 'static,
    {
        let kind = kind.into();
        if self.rules.register(kind.clone(), rule) {
            debug!(kind = %kind, "Replaced invalidation rule");
        }
    }

    pub fn rules(&self) -> &InvalidationRules {
        &self.rules
    }

    /// Run the rule registered for `kind` and invalidate every prefix it
    /// yields. Must only be called once the remote operation has resolved.
    /// An unregistered kind is logged and left alone.
    pub fn apply_mutation(&mut self, kind: &MutationKind, input: &Value, result: &Value) -> InvalidationOutcome {
        let prefixes = match self.rules.prefixes_for(kind, input, result) {
            Some(prefixes) => prefixes,
            None => {
                debug!(kind = %kind, "No invalidation rule registered, nothing to do");
                return InvalidationOutcome::NoRule;
            }
        };

        let entries: usize = prefixes.iter().map(|prefix| self.invalidate(prefix)).sum();
        debug!(kind = %kind, prefixes = prefixes.len(), entries, "Applied mutation invalidation");
        InvalidationOutcome::Applied { prefixes, entries }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_key;
    use serde_json::json;

    fn lesson_rule(input: &Value, _result: &Value) -> Vec<CacheKey> {
        let enrollment = input["enrollmentId"].as_str().unwrap_or_default().to_string();
        let lesson = input["lessonId"].as_str().unwrap_or_default().to_string();
        vec![
            cache_key!["progress", "detail", enrollment.clone()],
            cache_key!["progress", "summary", enrollment.clone()],
            cache_key!["progress", "lesson", enrollment, lesson],
            cache_key!["progress", "user"],
        ]
    }

    fn stale_set(cache: &CacheManager) -> Vec<String> {
        cache.stale_keys().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_write_then_read_is_fresh() {
        let mut cache = CacheManager::default();
        let key = cache_key!["video", "detail", "V1"];
        cache.write(key.clone(), &json!({"title": "Intro"})).unwrap();

        let entry = cache.read(&key).unwrap();
        assert!(entry.is_fresh());
        assert_eq!(entry.status, EntryStatus::Resolved);
        assert_eq!(entry.value, Some(json!({"title": "Intro"})));
        assert!(cache.read(&cache_key!["video", "detail", "V2"]).is_none());
    }

    #[test]
    fn test_write_overwrites_stale_entry() {
        let mut cache = CacheManager::default();
        let key = cache_key!["video", "list"];
        cache.write_value(key.clone(), json!([1]));
        cache.invalidate(&key);
        assert!(!cache.is_fresh(&key));

        cache.write_value(key.clone(), json!([1, 2]));
        assert!(cache.is_fresh(&key));
        assert_eq!(cache.read(&key).unwrap().value, Some(json!([1, 2])));
        assert_eq!(cache.len(), 1);
        assert!(cache.take_refetch_queue().is_empty());
    }

    #[test]
    fn test_invalidate_marks_prefix_matches_only() {
        let mut cache = CacheManager::default();
        cache.write_value(cache_key!["content-item", "list", "S1"], json!([]));
        cache.write_value(cache_key!["content-item", "detail", "C1"], json!({}));
        cache.write_value(cache_key!["video", "list"], json!([]));

        assert_eq!(cache.invalidate(&cache_key!["content-item"]), 2);
        assert!(!cache.is_fresh(&cache_key!["content-item", "list", "S1"]));
        assert!(!cache.is_fresh(&cache_key!["content-item", "detail", "C1"]));
        assert!(cache.is_fresh(&cache_key!["video", "list"]));
    }

    #[test]
    fn test_invalidate_keeps_value_for_optimistic_display() {
        let mut cache = CacheManager::default();
        let key = cache_key!["progress", "summary", "E1"];
        cache.write_value(key.clone(), json!({"percent": 40}));
        cache.invalidate(&key);

        let entry = cache.read(&key).unwrap();
        assert!(entry.is_stale());
        assert_eq!(entry.value, Some(json!({"percent": 40})));
    }

    #[test]
    fn test_invalidate_without_matches_is_noop() {
        let mut cache = CacheManager::default();
        cache.write_value(cache_key!["video", "list"], json!([]));

        assert_eq!(cache.invalidate(&cache_key!["progress", "detail", "nope"]), 0);
        assert_eq!(cache.len(), 1);
        assert!(cache.is_fresh(&cache_key!["video", "list"]));
        assert!(cache.take_refetch_queue().is_empty());
    }

    #[test]
    fn test_read_does_not_change_staleness() {
        let mut cache = CacheManager::default();
        let key = cache_key!["video", "list"];
        cache.write_value(key.clone(), json!([]));

        for _ in 0..3 {
            assert!(cache.read(&key).unwrap().is_fresh());
        }
        assert!(cache.stale_keys().is_empty());
        assert!(cache.take_refetch_queue().is_empty());
    }

    #[test]
    fn test_read_reports_expired_entries_without_mutating_them() {
        let mut cache = CacheManager::new(Duration::minutes(5));
        let key = cache_key!["video", "list"];
        cache.write_value(key.clone(), json!([]));
        cache.entries.get_mut(&key).unwrap().fetched_at =
            Some(chrono::Utc::now() - Duration::minutes(10));

        assert!(cache.read(&key).unwrap().is_stale());
        assert!(!cache.entries[&key].stale);
    }

    #[test]
    fn test_mark_lesson_completed_scenario() {
        let mut cache = CacheManager::default();
        cache.register_rule("mark-lesson-completed", lesson_rule);
        cache.write_value(cache_key!["progress", "detail", "E1"], json!({}));
        cache.write_value(cache_key!["progress", "user"], json!([]));

        let outcome = cache.apply_mutation(
            &"mark-lesson-completed".into(),
            &json!({"enrollmentId": "E1", "lessonId": "L1"}),
            &json!({}),
        );

        assert_eq!(outcome.entries(), 2);
        assert!(!cache.is_fresh(&cache_key!["progress", "detail", "E1"]));
        assert!(!cache.is_fresh(&cache_key!["progress", "user"]));
    }

    #[test]
    fn test_apply_mutation_leaves_unrelated_entries() {
        let mut cache = CacheManager::default();
        cache.register_rule("mark-lesson-completed", lesson_rule);
        cache.write_value(cache_key!["progress", "detail", "E1"], json!({}));
        cache.write_value(cache_key!["progress", "detail", "E2"], json!({}));
        cache.write_value(cache_key!["progress", "user", 1i64, ""], json!([]));

        cache.apply_mutation(
            &"mark-lesson-completed".into(),
            &json!({"enrollmentId": "E1", "lessonId": "L1"}),
            &Value::Null,
        );

        assert_eq!(stale_set(&cache), vec!["progress/detail/E1", "progress/user/1/"]);
        assert!(cache.is_fresh(&cache_key!["progress", "detail", "E2"]));
    }

    #[test]
    fn test_apply_mutation_is_idempotent() {
        let mut cache = CacheManager::default();
        cache.register_rule("mark-lesson-completed", lesson_rule);
        cache.write_value(cache_key!["progress", "detail", "E1"], json!({}));
        cache.write_value(cache_key!["progress", "summary", "E1"], json!({}));
        cache.write_value(cache_key!["video", "list"], json!([]));
        let input = json!({"enrollmentId": "E1", "lessonId": "L1"});

        cache.apply_mutation(&"mark-lesson-completed".into(), &input, &Value::Null);
        let once = stale_set(&cache);
        cache.apply_mutation(&"mark-lesson-completed".into(), &input, &Value::Null);

        assert_eq!(stale_set(&cache), once);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_unknown_kind_is_noop() {
        let mut cache = CacheManager::default();
        cache.write_value(cache_key!["video", "list"], json!([]));

        let outcome = cache.apply_mutation(&"unknown-kind".into(), &json!({}), &json!({}));

        assert_eq!(outcome, InvalidationOutcome::NoRule);
        assert_eq!(cache.len(), 1);
        assert!(cache.is_fresh(&cache_key!["video", "list"]));
        assert!(cache.take_refetch_queue().is_empty());
    }

    #[test]
    fn test_interleaved_disjoint_mutations() {
        let mut cache = CacheManager::default();
        cache.register_rule("update-video", |input, _| {
            vec![cache_key!["video", "detail", input["id"].as_str().unwrap_or_default()]]
        });
        cache.register_rule("update-content-item", |input, _| {
            vec![cache_key!["content-item", "detail", input["id"].as_str().unwrap_or_default()]]
        });
        cache.write_value(cache_key!["video", "detail", "V1"], json!({}));
        cache.write_value(cache_key!["content-item", "detail", "C1"], json!({}));
        cache.write_value(cache_key!["content-item", "detail", "C2"], json!({}));

        // Both remote calls resolve before either result is applied
        cache.apply_mutation(&"update-video".into(), &json!({"id": "V1"}), &Value::Null);
        cache.apply_mutation(&"update-content-item".into(), &json!({"id": "C1"}), &Value::Null);

        assert!(!cache.is_fresh(&cache_key!["video", "detail", "V1"]));
        assert!(!cache.is_fresh(&cache_key!["content-item", "detail", "C1"]));
        assert!(cache.is_fresh(&cache_key!["content-item", "detail", "C2"]));
    }

    #[test]
    fn test_overlapping_prefixes_union() {
        let mut cache = CacheManager::default();
        cache.register_rule("a", |_, _| vec![cache_key!["video"]]);
        cache.register_rule("b", |_, _| vec![cache_key!["video", "detail", "V1"]]);
        cache.write_value(cache_key!["video", "detail", "V1"], json!({}));
        cache.write_value(cache_key!["video", "list"], json!([]));

        cache.apply_mutation(&"b".into(), &Value::Null, &Value::Null);
        cache.apply_mutation(&"a".into(), &Value::Null, &Value::Null);

        assert_eq!(stale_set(&cache), vec!["video/detail/V1", "video/list"]);
    }

    #[test]
    fn test_refetch_queue_drains_once() {
        let mut cache = CacheManager::default();
        cache.write_value(cache_key!["video", "list"], json!([]));
        cache.write_value(cache_key!["video", "detail", "V1"], json!({}));
        cache.invalidate(&cache_key!["video"]);
        cache.invalidate(&cache_key!["video", "list"]);

        let queue = cache.take_refetch_queue();
        assert_eq!(queue, vec![cache_key!["video", "detail", "V1"], cache_key!["video", "list"]]);
        assert!(cache.take_refetch_queue().is_empty());
    }

    #[test]
    fn test_fetch_lifecycle() {
        let mut cache = CacheManager::default();
        let key = cache_key!["video", "detail", "V1"];

        let ticket = cache.begin_fetch(&key);
        assert_eq!(ticket.key(), &key);
        let entry = cache.read(&key).unwrap();
        assert!(entry.is_pending());
        assert!(entry.value.is_none());

        cache.fail_fetch(&ticket, "timeout");
        assert_eq!(cache.read(&key).unwrap().error(), Some("timeout"));
        assert_eq!(cache.stats().errors, 1);

        let retry = cache.begin_fetch(&key);
        assert!(cache.complete_fetch(&retry, json!({"id": "V1"})));
        assert!(cache.is_fresh(&key));
    }

    #[test]
    fn test_fetch_started_before_mutation_stays_stale() {
        let mut cache = CacheManager::default();
        cache.register_rule("mark-lesson-completed", lesson_rule);
        let key = cache_key!["progress", "detail", "E1"];
        cache.write_value(key.clone(), json!({"lessons": 0}));

        let ticket = cache.begin_fetch(&key);
        cache.apply_mutation(
            &"mark-lesson-completed".into(),
            &json!({"enrollmentId": "E1", "lessonId": "L1"}),
            &json!({}),
        );
        assert!(!cache.complete_fetch(&ticket, json!({"lessons": 0})));

        let entry = cache.read(&key).unwrap();
        assert!(!entry.is_fresh());
        assert!(!entry.is_pending());
        assert_eq!(entry.value, Some(json!({"lessons": 0})));
        assert!(cache.take_refetch_queue().contains(&key));

        // The refetch started after the mutation is authoritative
        let refetch = cache.begin_fetch(&key);
        assert!(cache.complete_fetch(&refetch, json!({"lessons": 1})));
        assert!(cache.is_fresh(&key));
    }

    #[test]
    fn test_old_response_after_newer_fetch_started() {
        let mut cache = CacheManager::default();
        let key = cache_key!["video", "list"];
        cache.write_value(key.clone(), json!(["old"]));

        let first = cache.begin_fetch(&key);
        cache.invalidate(&cache_key!["video"]);
        let second = cache.begin_fetch(&key);

        // The newer fetch is still in flight, so nothing is queued again
        assert!(!cache.complete_fetch(&first, json!(["old"])));
        let entry = cache.read(&key).unwrap();
        assert!(entry.is_pending());
        assert!(entry.is_stale());
        assert!(cache.take_refetch_queue().is_empty());

        // Nor does a late failure of the old fetch mark an error
        cache.fail_fetch(&first, "timeout");
        assert!(cache.read(&key).unwrap().error().is_none());

        assert!(cache.complete_fetch(&second, json!(["new"])));
        assert!(cache.is_fresh(&key));
        assert_eq!(cache.read(&key).unwrap().value, Some(json!(["new"])));
    }

    #[test]
    fn test_responses_arriving_out_of_order() {
        let mut cache = CacheManager::default();
        let key = cache_key!["video", "list"];

        let first = cache.begin_fetch(&key);
        cache.invalidate(&key);
        let second = cache.begin_fetch(&key);

        assert!(cache.complete_fetch(&second, json!(["new"])));
        // The older reply lands last and is dropped
        assert!(!cache.complete_fetch(&first, json!(["old"])));
        assert!(cache.is_fresh(&key));
        assert_eq!(cache.read(&key).unwrap().value, Some(json!(["new"])));
        assert!(cache.take_refetch_queue().is_empty());

        // Still dropped once the newer value has itself gone stale
        cache.invalidate(&key);
        let _ = cache.take_refetch_queue();
        assert!(!cache.complete_fetch(&first, json!(["old"])));
        assert_eq!(cache.read(&key).unwrap().value, Some(json!(["new"])));
        assert!(cache.read(&key).unwrap().is_stale());
    }

    #[test]
    fn test_superseded_failure_is_queued_again() {
        let mut cache = CacheManager::default();
        let key = cache_key!["video", "list"];
        cache.write_value(key.clone(), json!([1]));

        let ticket = cache.begin_fetch(&key);
        cache.invalidate(&key);
        let _ = cache.take_refetch_queue();
        cache.fail_fetch(&ticket, "timeout");

        assert_eq!(cache.read(&key).unwrap().error(), Some("timeout"));
        assert_eq!(cache.take_refetch_queue(), vec![key]);
    }

    #[test]
    fn test_result_for_evicted_entry_is_dropped() {
        let mut cache = CacheManager::default();
        let key = cache_key!["video", "detail", "V1"];
        let ticket = cache.begin_fetch(&key);
        cache.evict(&key);

        assert!(!cache.complete_fetch(&ticket, json!({"id": "V1"})));
        assert!(!cache.contains(&key));
        cache.fail_fetch(&ticket, "gone");
        assert!(!cache.contains(&key));
    }

    #[test]
    fn test_write_value_supersedes_in_flight_fetch() {
        let mut cache = CacheManager::default();
        let key = cache_key!["video", "list"];
        let ticket = cache.begin_fetch(&key);
        cache.invalidate(&key);
        cache.write_value(key.clone(), json!([1]));

        assert!(cache.is_fresh(&key));
        assert!(!cache.complete_fetch(&ticket, json!([0])));
        assert!(cache.is_fresh(&key));
        assert_eq!(cache.read(&key).unwrap().value, Some(json!([1])));
    }

    #[test]
    fn test_begin_fetch_keeps_previous_value() {
        let mut cache = CacheManager::default();
        let key = cache_key!["video", "list"];
        cache.write_value(key.clone(), json!([1]));
        cache.invalidate(&key);
        cache.begin_fetch(&key);

        let entry = cache.read(&key).unwrap();
        assert!(entry.is_pending());
        assert!(entry.is_stale());
        assert_eq!(entry.value, Some(json!([1])));
        assert!(cache.take_refetch_queue().is_empty());
    }

    #[test]
    fn test_evict_removes_entries() {
        let mut cache = CacheManager::default();
        cache.write_value(cache_key!["video", "detail", "V1"], json!({}));
        cache.write_value(cache_key!["video", "list"], json!([]));
        cache.invalidate(&cache_key!["video"]);

        assert_eq!(cache.evict(&cache_key!["video", "detail", "V1"]), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.take_refetch_queue(), vec![cache_key!["video", "list"]]);
    }

    #[test]
    fn test_stats() {
        let mut cache = CacheManager::default();
        cache.write_value(cache_key!["a"], json!(1));
        cache.write_value(cache_key!["b"], json!(1));
        cache.begin_fetch(&cache_key!["c"]);
        cache.invalidate(&cache_key!["b"]);

        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 3,
                stale: 2,
                pending: 1,
                errors: 0
            }
        );
    }
}
