//! API client for the course platform's admin REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests for learner progress, course content items and the video
//! library.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::Query;
use crate::models::{
    ContentItem, ContentItemInput, EnrollmentProgress, ListParams, LessonProgress, Page,
    ProgressSummary, TopicProgress, UserProgress, VideoAsset, VideoInput,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the admin backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send a request, backing off exponentially while rate limited, and
    /// parse the JSON body. Empty bodies (204, or DELETE replies) parse as
    /// `null`.
    async fn send<T, Q, B>(&self, method: Method, path: &str, query: Option<&Q>, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .headers(self.auth_headers()?);
            if let Some(query) = query {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .map_err(ApiError::NetworkError)
                .with_context(|| format!("Failed to send {} request to {}", method, url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response
                        .text()
                        .await
                        .with_context(|| format!("Failed to read response body from {}", url))?;
                    let text = if text.trim().is_empty() { "null" } else { text.as_str() };
                    debug!(method = %method, url = %url, bytes = text.len(), "Response received");
                    return serde_json::from_str(text)
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send::<T, (), ()>(Method::GET, path, None, None).await
    }

    async fn get_with<T: DeserializeOwned, Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<T> {
        self.send::<T, Q, ()>(Method::GET, path, Some(query), None).await
    }

    async fn with_body<T: DeserializeOwned, B: Serialize + ?Sized>(&self, method: Method, path: &str, body: &B) -> Result<T> {
        self.send::<T, (), B>(method, path, None, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        self.send::<Value, (), ()>(Method::DELETE, path, None, None).await
    }

    // ===== Progress =====

    /// Fetch a page of the learner progress overview
    pub async fn fetch_user_progress(&self, params: &ListParams) -> Result<Page<UserProgress>> {
        self.get_with("progress/users", params).await
    }

    pub async fn fetch_enrollment_progress(&self, enrollment_id: &str) -> Result<EnrollmentProgress> {
        self.get(&format!("progress/enrollments/{}", enrollment_id)).await
    }

    pub async fn fetch_progress_summary(&self, enrollment_id: &str) -> Result<ProgressSummary> {
        self.get(&format!("progress/enrollments/{}/summary", enrollment_id)).await
    }

    pub async fn fetch_topic_progress(&self, enrollment_id: &str, topic_id: &str) -> Result<TopicProgress> {
        self.get(&format!("progress/enrollments/{}/topics/{}", enrollment_id, topic_id))
            .await
    }

    pub async fn fetch_lesson_progress(&self, enrollment_id: &str, lesson_id: &str) -> Result<LessonProgress> {
        self.get(&format!("progress/enrollments/{}/lessons/{}", enrollment_id, lesson_id))
            .await
    }

    pub async fn mark_lesson_completed(&self, enrollment_id: &str, lesson_id: &str) -> Result<Value> {
        let path = format!("progress/enrollments/{}/lessons/{}/complete", enrollment_id, lesson_id);
        self.with_body(Method::POST, &path, &serde_json::json!({})).await
    }

    pub async fn mark_lesson_incomplete(&self, enrollment_id: &str, lesson_id: &str) -> Result<Value> {
        self.delete(&format!("progress/enrollments/{}/lessons/{}/complete", enrollment_id, lesson_id))
            .await
    }

    /// Delete every progress record of an enrollment
    pub async fn delete_progress(&self, enrollment_id: &str) -> Result<Value> {
        self.delete(&format!("progress/enrollments/{}", enrollment_id)).await
    }

    // ===== Content items =====

    pub async fn fetch_content_items(&self, section_id: &str) -> Result<Vec<ContentItem>> {
        self.get(&format!("sections/{}/content-items", section_id)).await
    }

    pub async fn fetch_content_item(&self, item_id: &str) -> Result<ContentItem> {
        self.get(&format!("content-items/{}", item_id)).await
    }

    pub async fn create_content_item(&self, section_id: &str, input: &ContentItemInput) -> Result<ContentItem> {
        self.with_body(Method::POST, &format!("sections/{}/content-items", section_id), input)
            .await
    }

    pub async fn update_content_item(&self, item_id: &str, input: &ContentItemInput) -> Result<ContentItem> {
        self.with_body(Method::PATCH, &format!("content-items/{}", item_id), input)
            .await
    }

    pub async fn delete_content_item(&self, item_id: &str) -> Result<Value> {
        self.delete(&format!("content-items/{}", item_id)).await
    }

    /// Replace the order of a section's items
    pub async fn reorder_content_items(&self, section_id: &str, item_ids: &[String]) -> Result<Value> {
        let body = serde_json::json!({ "itemIds": item_ids });
        self.with_body(Method::PUT, &format!("sections/{}/content-items/order", section_id), &body)
            .await
    }

    // ===== Video library =====

    pub async fn fetch_videos(&self, params: &ListParams) -> Result<Page<VideoAsset>> {
        self.get_with("videos", params).await
    }

    pub async fn fetch_video(&self, video_id: &str) -> Result<VideoAsset> {
        self.get(&format!("videos/{}", video_id)).await
    }

    /// Register an already-uploaded file in the library
    pub async fn create_video(&self, input: &VideoInput) -> Result<VideoAsset> {
        self.with_body(Method::POST, "videos", input).await
    }

    pub async fn update_video(&self, video_id: &str, input: &VideoInput) -> Result<VideoAsset> {
        self.with_body(Method::PATCH, &format!("videos/{}", video_id), input)
            .await
    }

    pub async fn delete_video(&self, video_id: &str) -> Result<Value> {
        self.delete(&format!("videos/{}", video_id)).await
    }

    // ===== Typed queries =====

    /// Run the backend call behind a cached view and return it as JSON,
    /// ready for `CacheManager::complete_fetch`.
    pub async fn run_query(&self, query: &Query) -> Result<Value> {
        let value = match query {
            Query::ProgressUsers(params) => to_value(self.fetch_user_progress(params).await?)?,
            Query::ProgressDetail { enrollment_id } => {
                to_value(self.fetch_enrollment_progress(enrollment_id).await?)?
            }
            Query::ProgressSummary { enrollment_id } => {
                to_value(self.fetch_progress_summary(enrollment_id).await?)?
            }
            Query::ProgressTopic { enrollment_id, topic_id } => {
                to_value(self.fetch_topic_progress(enrollment_id, topic_id).await?)?
            }
            Query::ProgressLesson { enrollment_id, lesson_id } => {
                to_value(self.fetch_lesson_progress(enrollment_id, lesson_id).await?)?
            }
            Query::ContentItems { section_id } => to_value(self.fetch_content_items(section_id).await?)?,
            Query::ContentItem { item_id } => to_value(self.fetch_content_item(item_id).await?)?,
            Query::Videos(params) => to_value(self.fetch_videos(params).await?)?,
            Query::Video { video_id } => to_value(self.fetch_video(video_id).await?)?,
        };
        Ok(value)
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).context("Failed to encode response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let api = ApiClient::new("https://admin.example.com/api/").unwrap();
        assert_eq!(api.base_url(), "https://admin.example.com/api");
        assert_eq!(api.url("videos/V1"), "https://admin.example.com/api/videos/V1");
        assert_eq!(api.url("/videos"), "https://admin.example.com/api/videos");
    }

    #[test]
    fn test_auth_headers() {
        let api = ApiClient::new("https://admin.example.com").unwrap();
        assert!(api.auth_headers().unwrap().get(header::AUTHORIZATION).is_none());

        let api = api.with_token("abc".to_string());
        let headers = api.auth_headers().unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[test]
    fn test_invalid_token_is_an_error() {
        let mut api = ApiClient::new("https://admin.example.com").unwrap();
        api.set_token("bad\ntoken".to_string());
        assert!(api.auth_headers().is_err());
    }

    #[tokio::test]
    async fn test_connection_failure_is_a_network_error() {
        // Nothing listens on the discard port
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let err = api.fetch_video("V1").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::NetworkError(_))));
        assert!(format!("{:#}", err).starts_with("Failed to send GET request to http://127.0.0.1:9/videos/V1"));
    }
}
