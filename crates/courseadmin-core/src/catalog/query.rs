//! Typed form of the cached views.
//!
//! A [`Query`] knows its cache key, and any key produced by
//! [`super::keys`] can be turned back into the query that fills it. This
//! is how keys drained from the refetch queue become backend calls.

use crate::cache::{CacheKey, KeySegment};
use crate::models::ListParams;

use super::keys;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    ProgressUsers(ListParams),
    ProgressDetail { enrollment_id: String },
    ProgressSummary { enrollment_id: String },
    ProgressTopic { enrollment_id: String, topic_id: String },
    ProgressLesson { enrollment_id: String, lesson_id: String },
    ContentItems { section_id: String },
    ContentItem { item_id: String },
    Videos(ListParams),
    Video { video_id: String },
}

impl Query {
    pub fn key(&self) -> CacheKey {
        match self {
            Query::ProgressUsers(params) => keys::progress_users(params),
            Query::ProgressDetail { enrollment_id } => keys::progress_detail(enrollment_id),
            Query::ProgressSummary { enrollment_id } => keys::progress_summary(enrollment_id),
            Query::ProgressTopic { enrollment_id, topic_id } => {
                keys::progress_topic(enrollment_id, topic_id)
            }
            Query::ProgressLesson { enrollment_id, lesson_id } => {
                keys::progress_lesson(enrollment_id, lesson_id)
            }
            Query::ContentItems { section_id } => keys::content_items(section_id),
            Query::ContentItem { item_id } => keys::content_item(item_id),
            Query::Videos(params) => keys::videos(params),
            Query::Video { video_id } => keys::video(video_id),
        }
    }

    /// Parse a full cache key. Prefixes and foreign keys yield `None`.
    pub fn from_key(key: &CacheKey) -> Option<Self> {
        let segments = key.segments();
        let text = |i: usize| segments.get(i).and_then(KeySegment::as_str).map(str::to_string);

        let query = match (text(0)?.as_str(), text(1)?.as_str(), segments.len()) {
            (keys::PROGRESS, keys::USER, 5) => Query::ProgressUsers(list_params(&segments[2..])?),
            (keys::PROGRESS, keys::DETAIL, 3) => Query::ProgressDetail {
                enrollment_id: text(2)?,
            },
            (keys::PROGRESS, keys::SUMMARY, 3) => Query::ProgressSummary {
                enrollment_id: text(2)?,
            },
            (keys::PROGRESS, keys::TOPIC, 4) => Query::ProgressTopic {
                enrollment_id: text(2)?,
                topic_id: text(3)?,
            },
            (keys::PROGRESS, keys::LESSON, 4) => Query::ProgressLesson {
                enrollment_id: text(2)?,
                lesson_id: text(3)?,
            },
            (keys::CONTENT_ITEM, keys::LIST, 3) => Query::ContentItems { section_id: text(2)? },
            (keys::CONTENT_ITEM, keys::DETAIL, 3) => Query::ContentItem { item_id: text(2)? },
            (keys::VIDEO, keys::LIST, 5) => Query::Videos(list_params(&segments[2..])?),
            (keys::VIDEO, keys::DETAIL, 3) => Query::Video { video_id: text(2)? },
            _ => return None,
        };
        Some(query)
    }
}

/// `[page, limit, search]`
fn list_params(segments: &[KeySegment]) -> Option<ListParams> {
    let page = u32::try_from(segments.first()?.as_num()?).ok()?;
    let limit = u32::try_from(segments.get(1)?.as_num()?).ok()?;
    let search = segments.get(2)?.as_str()?.to_string();
    Some(ListParams { page, limit, search })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_key;

    #[test]
    fn test_from_key_recovers_query() {
        let queries = [
            Query::ProgressUsers(ListParams::page(2).with_search("ada")),
            Query::ProgressLesson {
                enrollment_id: "E1".to_string(),
                lesson_id: "L1".to_string(),
            },
            Query::ContentItems {
                section_id: "S1".to_string(),
            },
            Query::Videos(ListParams::default()),
        ];
        for query in queries {
            assert_eq!(Query::from_key(&query.key()), Some(query));
        }
    }

    #[test]
    fn test_prefixes_are_not_queries() {
        assert_eq!(Query::from_key(&keys::progress_users_root()), None);
        assert_eq!(Query::from_key(&keys::progress_topics("E1")), None);
        assert_eq!(Query::from_key(&keys::video_root()), None);
        assert_eq!(Query::from_key(&CacheKey::new()), None);
    }

    #[test]
    fn test_foreign_keys_are_rejected() {
        assert_eq!(Query::from_key(&cache_key!["course", "detail", "X"]), None);
        assert_eq!(Query::from_key(&cache_key!["video", "list", "1", 20i64, ""]), None);
        assert_eq!(Query::from_key(&cache_key!["video", "list", -1i64, 20i64, ""]), None);
    }
}
