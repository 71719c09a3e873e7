//! Video asset library.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::format::{format_bytes, format_duration};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Uploading,
    Processing,
    Ready,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl VideoStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VideoStatus::Uploading => "uploading",
            VideoStatus::Processing => "processing",
            VideoStatus::Ready => "ready",
            VideoStatus::Failed => "failed",
            VideoStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct VideoAsset {
    pub id: String,
    pub title: String,
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
    #[serde(rename = "sizeBytes")]
    pub size_bytes: Option<u64>,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub status: VideoStatus,
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

impl VideoAsset {
    pub fn size_display(&self) -> String {
        self.size_bytes.map(format_bytes).unwrap_or_else(|| "-".to_string())
    }

    pub fn duration_display(&self) -> String {
        self.duration_seconds
            .map(format_duration)
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Metadata for registering an uploaded file or editing an existing video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct VideoInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
}

impl VideoInput {
    /// Register the uploaded object at `storage_key`. The file name is the
    /// key's last path segment and the title its stem.
    pub fn register(storage_key: &str) -> Self {
        let path = Path::new(storage_key);
        let file_name = path.file_name().and_then(|n| n.to_str()).map(str::to_string);
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(storage_key)
            .to_string();
        Self {
            title: Some(title),
            file_name,
            storage_key: Some(storage_key.to_string()),
        }
    }

    pub fn rename(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_asset() {
        let json = r#"{"id": "V1", "title": "Intro", "fileName": "intro.mp4",
            "sizeBytes": 1572864, "durationSeconds": 125, "status": "ready"}"#;
        let video: VideoAsset = serde_json::from_str(json).unwrap();
        assert_eq!(video.status, VideoStatus::Ready);
        assert_eq!(video.size_display(), "1.5 MB");
        assert_eq!(video.duration_display(), "2:05");
    }

    #[test]
    fn test_register_input_from_storage_key() {
        let input = VideoInput::register("uploads/2026/intro.mp4");
        assert_eq!(input.title.as_deref(), Some("intro"));
        assert_eq!(input.file_name.as_deref(), Some("intro.mp4"));
        assert_eq!(input.storage_key.as_deref(), Some("uploads/2026/intro.mp4"));

        let body = serde_json::to_value(VideoInput::rename("Welcome")).unwrap();
        assert_eq!(body, serde_json::json!({"title": "Welcome"}));
    }

    #[test]
    fn test_missing_fields_display_dash() {
        let json = r#"{"id": "V2", "title": "Draft", "status": "transcoding"}"#;
        let video: VideoAsset = serde_json::from_str(json).unwrap();
        assert_eq!(video.status, VideoStatus::Unknown);
        assert_eq!(video.size_display(), "-");
        assert_eq!(video.duration_display(), "-");
    }
}
