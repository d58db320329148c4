//! REST client for the YouTube Data API v3.
//!
//! Covers the handful of endpoints the proxy forwards to: `videos.list`,
//! `videos.update`, `commentThreads.list`, `commentThreads.insert` and
//! `comments.delete`. Responses are handed back as raw JSON.

use async_trait::async_trait;
use serde_json::{Value, json};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Page size for `commentThreads.list`; the proxy never returns more
pub const MAX_COMMENT_RESULTS: usize = 100;

/// Errors from the YouTube REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum YouTubeApiError {
    /// The HTTP request itself failed (network, DNS, TLS, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// YouTube returned a non-2xx status code.
    #[error("YouTube API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// A write targeted a video the API does not know about.
    #[error("video '{0}' not found")]
    VideoNotFound(String),
}

impl YouTubeApiError {
    /// Raw upstream details suitable for an error body
    pub fn details(&self) -> Value {
        match self {
            YouTubeApiError::Status { body, .. } => {
                serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone()))
            }
            other => Value::String(other.to_string()),
        }
    }
}

/// Operations the proxy needs from the platform.
///
/// Reads take an optional bearer token and fall back to the API key; writes
/// always need one.
#[async_trait]
pub trait YouTubeApi: Send + Sync {
    /// First item of `videos.list?part=snippet,statistics`, or `None` when the
    /// result set is empty
    async fn get_video(
        &self,
        video_id: &str,
        access_token: Option<&str>,
    ) -> Result<Option<Value>, YouTubeApiError>;

    /// Replace the title in the video's snippet; returns the updated snippet
    async fn update_video_title(
        &self,
        video_id: &str,
        title: &str,
        access_token: &str,
    ) -> Result<Value, YouTubeApiError>;

    /// One page of top-level comment threads, capped at [`MAX_COMMENT_RESULTS`]
    async fn list_comment_threads(
        &self,
        video_id: &str,
        access_token: Option<&str>,
    ) -> Result<Value, YouTubeApiError>;

    async fn insert_comment_thread(
        &self,
        video_id: &str,
        text: &str,
        access_token: &str,
    ) -> Result<Value, YouTubeApiError>;

    async fn delete_comment(
        &self,
        comment_id: &str,
        access_token: &str,
    ) -> Result<(), YouTubeApiError>;
}

/// HTTP client for the YouTube Data API
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(reqwest::Client::new(), DEFAULT_BASE_URL.to_string(), api_key)
    }

    /// Point the client at another host (a mock server in tests)
    pub fn with_base_url(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    /// Attach a bearer token when present, the API key otherwise
    fn authorize(
        &self,
        request: reqwest::RequestBuilder,
        access_token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match access_token {
            Some(token) => request.bearer_auth(token),
            None => request.query(&[("key", self.api_key.as_str())]),
        }
    }

    async fn fetch_snippet(&self, video_id: &str, access_token: &str) -> Result<Value, YouTubeApiError> {
        let request = self
            .client
            .get(self.url("videos"))
            .query(&[("part", "snippet"), ("id", video_id)]);
        let list: Value = parse_response(request.bearer_auth(access_token).send().await?).await?;

        first_item(list)
            .and_then(|mut video| video.get_mut("snippet").map(Value::take))
            .ok_or_else(|| YouTubeApiError::VideoNotFound(video_id.to_string()))
    }
}

#[async_trait]
impl YouTubeApi for YouTubeClient {
    async fn get_video(
        &self,
        video_id: &str,
        access_token: Option<&str>,
    ) -> Result<Option<Value>, YouTubeApiError> {
        let request = self
            .client
            .get(self.url("videos"))
            .query(&[("part", "snippet,statistics"), ("id", video_id)]);
        let response = self.authorize(request, access_token).send().await?;
        let list: Value = parse_response(response).await?;
        Ok(first_item(list))
    }

    async fn update_video_title(
        &self,
        video_id: &str,
        title: &str,
        access_token: &str,
    ) -> Result<Value, YouTubeApiError> {
        let current = self.fetch_snippet(video_id, access_token).await?;
        let body = json!({
            "id": video_id,
            "snippet": writable_snippet(&current, title),
        });

        let response = self
            .client
            .put(self.url("videos"))
            .query(&[("part", "snippet")])
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;
        let mut updated: Value = parse_response(response).await?;
        tracing::debug!(video_id, "video title updated");
        Ok(updated.get_mut("snippet").map(Value::take).unwrap_or(updated))
    }

    async fn list_comment_threads(
        &self,
        video_id: &str,
        access_token: Option<&str>,
    ) -> Result<Value, YouTubeApiError> {
        let max_results = MAX_COMMENT_RESULTS.to_string();
        let request = self.client.get(self.url("commentThreads")).query(&[
            ("part", "snippet"),
            ("videoId", video_id),
            ("maxResults", max_results.as_str()),
        ]);
        let response = self.authorize(request, access_token).send().await?;
        let mut list: Value = parse_response(response).await?;
        cap_items(&mut list, MAX_COMMENT_RESULTS);
        Ok(list)
    }

    async fn insert_comment_thread(
        &self,
        video_id: &str,
        text: &str,
        access_token: &str,
    ) -> Result<Value, YouTubeApiError> {
        let body = json!({
            "snippet": {
                "videoId": video_id,
                "topLevelComment": {
                    "snippet": { "textOriginal": text }
                }
            }
        });

        let response = self
            .client
            .post(self.url("commentThreads"))
            .query(&[("part", "snippet")])
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;
        parse_response(response).await
    }

    async fn delete_comment(
        &self,
        comment_id: &str,
        access_token: &str,
    ) -> Result<(), YouTubeApiError> {
        let response = self
            .client
            .delete(self.url("comments"))
            .query(&[("id", comment_id)])
            .bearer_auth(access_token)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

/// Keep only the snippet fields `videos.update` accepts, with the new title
fn writable_snippet(current: &Value, title: &str) -> Value {
    let mut snippet = serde_json::Map::new();
    snippet.insert("title".into(), Value::String(title.to_string()));
    for key in ["categoryId", "description", "tags", "defaultLanguage"] {
        if let Some(value) = current.get(key) {
            snippet.insert(key.into(), value.clone());
        }
    }
    Value::Object(snippet)
}

fn first_item(mut list: Value) -> Option<Value> {
    match list.get_mut("items").and_then(Value::as_array_mut) {
        Some(items) if !items.is_empty() => Some(items.swap_remove(0)),
        _ => None,
    }
}

fn cap_items(list: &mut Value, max: usize) {
    if let Some(items) = list.get_mut("items").and_then(Value::as_array_mut) {
        items.truncate(max);
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, YouTubeApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(YouTubeApiError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, YouTubeApiError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}
