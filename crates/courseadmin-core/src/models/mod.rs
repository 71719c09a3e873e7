//! Data models for the admin console.
//!
//! - `UserProgress`, `EnrollmentProgress`, `ProgressSummary`: learner progress
//! - `ContentItem`, `ContentItemInput`: free-course content items
//! - `VideoAsset`, `VideoInput`: the video asset library
//! - `ListParams`, `Page`: paging shared by list endpoints

pub mod content;
pub mod page;
pub mod progress;
pub mod video;

pub use content::{ContentItem, ContentItemInput, ContentKind};
pub use page::{ListParams, Page, DEFAULT_PAGE_SIZE};
pub use progress::{EnrollmentProgress, LessonProgress, ProgressSummary, TopicProgress, UserProgress};
pub use video::{VideoAsset, VideoInput, VideoStatus};
