//! Cache keys for every view the console caches.

use crate::cache::CacheKey;
use crate::models::ListParams;

pub const PROGRESS: &str = "progress";
pub const CONTENT_ITEM: &str = "content-item";
pub const VIDEO: &str = "video";

pub const USER: &str = "user";
pub const DETAIL: &str = "detail";
pub const SUMMARY: &str = "summary";
pub const TOPIC: &str = "topic";
pub const LESSON: &str = "lesson";
pub const LIST: &str = "list";

pub fn progress_root() -> CacheKey {
    CacheKey::new().with(PROGRESS)
}

/// Prefix of every page of the user progress list.
pub fn progress_users_root() -> CacheKey {
    progress_root().with(USER)
}

pub fn progress_users(params: &ListParams) -> CacheKey {
    progress_users_root()
        .with(params.page)
        .with(params.limit)
        .with(params.search.as_str())
}

pub fn progress_detail(enrollment_id: &str) -> CacheKey {
    progress_root().with(DETAIL).with(enrollment_id)
}

pub fn progress_summary(enrollment_id: &str) -> CacheKey {
    progress_root().with(SUMMARY).with(enrollment_id)
}

/// Prefix of every topic view of one enrollment.
pub fn progress_topics(enrollment_id: &str) -> CacheKey {
    progress_root().with(TOPIC).with(enrollment_id)
}

pub fn progress_topic(enrollment_id: &str, topic_id: &str) -> CacheKey {
    progress_topics(enrollment_id).with(topic_id)
}

/// Prefix of every lesson view of one enrollment.
pub fn progress_lessons(enrollment_id: &str) -> CacheKey {
    progress_root().with(LESSON).with(enrollment_id)
}

pub fn progress_lesson(enrollment_id: &str, lesson_id: &str) -> CacheKey {
    progress_lessons(enrollment_id).with(lesson_id)
}

pub fn content_root() -> CacheKey {
    CacheKey::new().with(CONTENT_ITEM)
}

pub fn content_items(section_id: &str) -> CacheKey {
    content_root().with(LIST).with(section_id)
}

pub fn content_item(item_id: &str) -> CacheKey {
    content_root().with(DETAIL).with(item_id)
}

pub fn video_root() -> CacheKey {
    CacheKey::new().with(VIDEO)
}

/// Prefix of every page of the video library.
pub fn videos_root() -> CacheKey {
    video_root().with(LIST)
}

pub fn videos(params: &ListParams) -> CacheKey {
    videos_root()
        .with(params.page)
        .with(params.limit)
        .with(params.search.as_str())
}

pub fn video(video_id: &str) -> CacheKey {
    video_root().with(DETAIL).with(video_id)
}
