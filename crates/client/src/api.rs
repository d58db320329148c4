//! HTTP client for the proxy's REST surface.

use async_trait::async_trait;
use domain::{CommentThread, Video};
use serde::Deserialize;
use serde_json::{Value, json};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The proxy answered with a non-2xx status and its `error` message.
    #[error("proxy error ({status}): {message}")]
    Status { status: u16, message: String },
}

/// Calls the view makes against the proxy
#[async_trait]
pub trait ProxyApi: Send + Sync {
    async fn auth_url(&self) -> Result<String, ClientError>;

    async fn exchange_code(&self, code: &str) -> Result<(), ClientError>;

    async fn get_video(&self, video_id: &str) -> Result<Video, ClientError>;

    async fn list_comments(&self, video_id: &str) -> Result<Vec<CommentThread>, ClientError>;

    async fn update_title(&self, video_id: &str, title: &str) -> Result<(), ClientError>;

    async fn add_comment(&self, video_id: &str, text: &str) -> Result<(), ClientError>;

    async fn delete_comment(&self, comment_id: &str, video_id: &str) -> Result<(), ClientError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthUrlResponse {
    auth_url: String,
}

#[derive(Debug, Deserialize)]
struct CommentThreadList {
    #[serde(default)]
    items: Vec<CommentThread>,
}

/// [`ProxyApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpProxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for HttpProxyClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

#[async_trait]
impl ProxyApi for HttpProxyClient {
    async fn auth_url(&self) -> Result<String, ClientError> {
        let response = self.client.get(self.url("/auth/url")).send().await?;
        let body: AuthUrlResponse = parse_response(response).await?;
        Ok(body.auth_url)
    }

    async fn exchange_code(&self, code: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url("/auth/token"))
            .json(&json!({ "code": code }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn get_video(&self, video_id: &str) -> Result<Video, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/video/{video_id}")))
            .send()
            .await?;
        parse_response(response).await
    }

    async fn list_comments(&self, video_id: &str) -> Result<Vec<CommentThread>, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/video/{video_id}/comments")))
            .send()
            .await?;
        let list: CommentThreadList = parse_response(response).await?;
        Ok(list.items)
    }

    async fn update_title(&self, video_id: &str, title: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .put(self.url(&format!("/video/{video_id}/title")))
            .json(&json!({ "title": title }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn add_comment(&self, video_id: &str, text: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url(&format!("/video/{video_id}/comment")))
            .json(&json!({ "text": text }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete_comment(&self, comment_id: &str, video_id: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/comment/{comment_id}")))
            .json(&json!({ "videoId": video_id }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        return Err(ClientError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}
