//! Structured cache keys.
//!
//! A key is an ordered list of segments such as
//! `["progress", "detail", "E1"]`. Invalidation works on prefixes: the key
//! `["progress"]` covers every progress view, `["progress", "detail", "E1"]`
//! covers only the detail view of one enrollment.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One segment of a [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySegment {
    Num(i64),
    Str(String),
}

impl KeySegment {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeySegment::Str(s) => Some(s),
            KeySegment::Num(_) => None,
        }
    }

    pub fn as_num(&self) -> Option<i64> {
        match self {
            KeySegment::Num(n) => Some(*n),
            KeySegment::Str(_) => None,
        }
    }
}

impl From<&str> for KeySegment {
    fn from(s: &str) -> Self {
        KeySegment::Str(s.to_string())
    }
}

impl From<String> for KeySegment {
    fn from(s: String) -> Self {
        KeySegment::Str(s)
    }
}

impl From<&String> for KeySegment {
    fn from(s: &String) -> Self {
        KeySegment::Str(s.clone())
    }
}

impl From<i64> for KeySegment {
    fn from(n: i64) -> Self {
        KeySegment::Num(n)
    }
}

impl From<u32> for KeySegment {
    fn from(n: u32) -> Self {
        KeySegment::Num(i64::from(n))
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySegment::Num(n) => write!(f, "{}", n),
            KeySegment::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Ordered sequence of segments identifying a cached query result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(Vec<KeySegment>);

impl CacheKey {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_segments(segments: Vec<KeySegment>) -> Self {
        Self(segments)
    }

    /// Append a segment, builder style.
    pub fn with(mut self, segment: impl Into<KeySegment>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    pub fn segment(&self, index: usize) -> Option<&KeySegment> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `prefix` is a prefix of this key. Every key starts with
    /// itself and with the empty key.
    pub fn starts_with(&self, prefix: &CacheKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// True when either key is a prefix of the other.
    pub fn overlaps(&self, other: &CacheKey) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl<S: Into<KeySegment>> FromIterator<S> for CacheKey {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Build a [`CacheKey`] from a list of segment expressions.
///
/// ```
/// use courseadmin_core::cache_key;
/// let key = cache_key!["progress", "lesson", "E1", "L1"];
/// assert_eq!(key.to_string(), "progress/lesson/E1/L1");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($($segment:expr),* $(,)?) => {
        $crate::cache::CacheKey::from_segments(vec![$($crate::cache::KeySegment::from($segment)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_key;

    #[test]
    fn test_starts_with_prefix() {
        let key = cache_key!["progress", "detail", "E1"];
        assert!(key.starts_with(&cache_key!["progress"]));
        assert!(key.starts_with(&cache_key!["progress", "detail"]));
        assert!(key.starts_with(&key.clone()));
        assert!(key.starts_with(&CacheKey::new()));
        assert!(!key.starts_with(&cache_key!["progress", "summary"]));
        assert!(!cache_key!["progress"].starts_with(&key));
    }

    #[test]
    fn test_segment_types_are_distinct() {
        // "1" and 1 are different segments
        let key = cache_key!["video", "list", 1i64];
        assert!(!key.starts_with(&cache_key!["video", "list", "1"]));
        assert!(key.starts_with(&cache_key!["video", "list", 1i64]));
    }

    #[test]
    fn test_overlaps_is_symmetric() {
        let list = cache_key!["content-item", "list"];
        let detail = cache_key!["content-item", "list", "S1"];
        assert!(list.overlaps(&detail));
        assert!(detail.overlaps(&list));
        assert!(!detail.overlaps(&cache_key!["content-item", "detail"]));
    }

    #[test]
    fn test_display_and_serde() {
        let key = cache_key!["video", "list", 2i64, ""];
        assert_eq!(key.to_string(), "video/list/2/");

        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"["video","list",2,""]"#);
        let parsed: CacheKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_collect_from_strings() {
        let key: CacheKey = ["a", "b"].into_iter().collect();
        assert_eq!(key, cache_key!["a", "b"]);
        assert_eq!(key.segment(1).and_then(KeySegment::as_str), Some("b"));
    }
}
