//! Free-course content items.

use serde::{Deserialize, Serialize};

/// Kind of learning material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Document,
    Quiz,
    Link,
    #[default]
    #[serde(other)]
    Other,
}

impl ContentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Video => "Video",
            ContentKind::Document => "Document",
            ContentKind::Quiz => "Quiz",
            ContentKind::Link => "Link",
            ContentKind::Other => "Other",
        }
    }
}

/// A single piece of learning material within a course section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub section_id: String,
    pub title: String,
    #[serde(default)]
    pub kind: ContentKind,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub published: bool,
    pub video_id: Option<String>,
    pub url: Option<String>,
    pub duration_seconds: Option<u32>,
}

/// Body for creating or patching a content item. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ContentItemInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ContentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ContentItemInput {
    pub fn publish(published: bool) -> Self {
        Self {
            published: Some(published),
            ..Default::default()
        }
    }

    /// A new unpublished item with just a title
    pub fn draft(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            published: Some(false),
            ..Default::default()
        }
    }
}
