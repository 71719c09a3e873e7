//! Declarative invalidation rules.
//!
//! Each mutation kind maps to a pure function of the mutation's input and
//! result that yields the cache key prefixes the mutation affects.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use super::CacheKey;

/// Name of a mutation, e.g. `"delete-progress"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationKind(Cow<'static, str>);

impl MutationKind {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for MutationKind {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for MutationKind {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `(input, result) -> prefixes`
pub type RuleFn = Box<dyn Fn(&Value, &Value) -> Vec<CacheKey> + Send + Sync>;

/// Registry of invalidation rules keyed by mutation kind.
#[derive(Default)]
pub struct InvalidationRules {
    rules: HashMap<MutationKind, RuleFn>,
}

impl InvalidationRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. Returns true when an existing rule was replaced.
    pub fn register<F>(&mut self, kind: MutationKind, rule: F) -> bool
    where
        F: Fn(&Value, &Value) -> Vec<CacheKey> + Send + Sync + 'static,
    {
        self.rules.insert(kind, Box::new(rule)).is_some()
    }

    pub fn contains(&self, kind: &MutationKind) -> bool {
        self.rules.contains_key(kind)
    }

    /// Evaluate the rule for `kind`, or `None` when no rule is registered.
    pub fn prefixes_for(&self, kind: &MutationKind, input: &Value, result: &Value) -> Option<Vec<CacheKey>> {
        self.rules.get(kind).map(|rule| rule(input, result))
    }

    /// Registered kinds in sorted order, for auditing the invalidation graph.
    pub fn kinds(&self) -> Vec<&MutationKind> {
        let mut kinds: Vec<_> = self.rules.keys().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for InvalidationRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidationRules")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_key;
    use serde_json::json;

    #[test]
    fn test_register_and_evaluate() {
        let mut rules = InvalidationRules::new();
        let replaced = rules.register("delete-video".into(), |input, _| {
            let id = input["id"].as_str().unwrap_or_default().to_string();
            vec![cache_key!["video", "detail", id], cache_key!["video", "list"]]
        });
        assert!(!replaced);

        let prefixes = rules
            .prefixes_for(&"delete-video".into(), &json!({"id": "V1"}), &Value::Null)
            .unwrap();
        assert_eq!(prefixes, vec![cache_key!["video", "detail", "V1"], cache_key!["video", "list"]]);
    }

    #[test]
    fn test_unknown_kind_has_no_prefixes() {
        let rules = InvalidationRules::new();
        assert!(rules
            .prefixes_for(&"unknown-kind".into(), &json!({}), &json!({}))
            .is_none());
    }

    #[test]
    fn test_register_replaces() {
        let mut rules = InvalidationRules::new();
        rules.register("k".into(), |_, _| vec![cache_key!["a"]]);
        assert!(rules.register("k".into(), |_, _| vec![cache_key!["b"]]));
        assert_eq!(rules.len(), 1);
        assert_eq!(
            rules.prefixes_for(&"k".into(), &Value::Null, &Value::Null),
            Some(vec![cache_key!["b"]])
        );
    }

    #[test]
    fn test_kinds_sorted() {
        let mut rules = InvalidationRules::new();
        rules.register("b".into(), |_, _| Vec::new());
        rules.register(MutationKind::from("a".to_string()), |_, _| Vec::new());
        let kinds: Vec<&str> = rules.kinds().into_iter().map(MutationKind::as_str).collect();
        assert_eq!(kinds, vec!["a", "b"]);
    }
}
