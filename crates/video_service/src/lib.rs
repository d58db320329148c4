use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use oauth_service::{AuthError, ErrorResponse, OAuthBroker};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use youtube_client::{YouTubeApi, YouTubeApiError};

/// Shared state for the proxy routes
#[derive(Clone)]
pub struct ProxyState {
    pub youtube: Arc<dyn YouTubeApi>,
    pub broker: Arc<OAuthBroker>,
}

/// Errors a proxy route can answer with
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(&'static str),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Body missing, not JSON, or the wrong shape.
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    /// Any failure reported by the YouTube API.
    #[error("{message}: {source}")]
    Upstream {
        message: &'static str,
        #[source]
        source: YouTubeApiError,
    },
}

impl ProxyError {
    fn upstream(message: &'static str) -> impl FnOnce(YouTubeApiError) -> Self {
        move |source| match source {
            YouTubeApiError::VideoNotFound(_) => ProxyError::NotFound("Video not found"),
            source => ProxyError::Upstream { message, source },
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ProxyError::Auth(err) => return err.into_response(),
            ProxyError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: message.to_string(),
                    details: None,
                },
            ),
            ProxyError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: message.to_string(),
                    details: None,
                },
            ),
            ProxyError::InvalidBody(rejection) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Invalid request body".to_string(),
                    details: Some(Value::String(rejection.body_text())),
                },
            ),
            ProxyError::Upstream { message, source } => {
                tracing::error!(error = %source, "{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: message.to_string(),
                        details: Some(source.details()),
                    },
                )
            }
        };
        if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), error = %body.error, "request rejected");
        }
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTitleRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    #[serde(default)]
    pub text: String,
}

/// The owning video is only needed by the client's own ownership check
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentRequest {
    #[serde(default)]
    pub video_id: Option<String>,
}

async fn get_video(
    State(state): State<ProxyState>,
    Path(video_id): Path<String>,
) -> Result<Json<Value>, ProxyError> {
    let token = state.broker.optional_access_token().await;
    let video = state
        .youtube
        .get_video(&video_id, token.as_deref())
        .await
        .map_err(ProxyError::upstream("Failed to fetch video details"))?;

    video
        .map(Json)
        .ok_or(ProxyError::NotFound("Video not found"))
}

async fn update_title(
    State(state): State<ProxyState>,
    Path(video_id): Path<String>,
    payload: Result<Json<UpdateTitleRequest>, JsonRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Json(request) = payload?;
    if request.title.trim().is_empty() {
        return Err(ProxyError::BadRequest("Title is required"));
    }
    let token = state.broker.access_token().await?;
    let snippet = state
        .youtube
        .update_video_title(&video_id, &request.title, &token)
        .await
        .map_err(ProxyError::upstream("Failed to update video title"))?;

    tracing::info!(%video_id, "video title updated");
    Ok(Json(snippet))
}

async fn list_comments(
    State(state): State<ProxyState>,
    Path(video_id): Path<String>,
) -> Result<Json<Value>, ProxyError> {
    let token = state.broker.optional_access_token().await;
    let comments = state
        .youtube
        .list_comment_threads(&video_id, token.as_deref())
        .await
        .map_err(ProxyError::upstream("Failed to fetch comments"))?;
    Ok(Json(comments))
}

async fn add_comment(
    State(state): State<ProxyState>,
    Path(video_id): Path<String>,
    payload: Result<Json<AddCommentRequest>, JsonRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Json(request) = payload?;
    if request.text.trim().is_empty() {
        return Err(ProxyError::BadRequest("Comment text is required"));
    }
    let token = state.broker.access_token().await?;
    let thread = state
        .youtube
        .insert_comment_thread(&video_id, &request.text, &token)
        .await
        .map_err(ProxyError::upstream("Failed to add comment"))?;

    tracing::info!(%video_id, "comment added");
    Ok(Json(thread))
}

async fn delete_comment(
    State(state): State<ProxyState>,
    Path(comment_id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ProxyError> {
    // The body is optional and only informative.
    let video_id = serde_json::from_slice::<DeleteCommentRequest>(&body)
        .ok()
        .and_then(|r| r.video_id);
    let token = state.broker.access_token().await?;
    state
        .youtube
        .delete_comment(&comment_id, &token)
        .await
        .map_err(ProxyError::upstream("Failed to delete comment"))?;

    tracing::info!(%comment_id, video_id = video_id.as_deref().unwrap_or("-"), "comment deleted");
    Ok(Json(json!({ "success": true })))
}

/// Create the router for the video and comment proxy endpoints
pub fn create_router(state: ProxyState) -> Router {
    Router::new()
        .route("/api/video/{video_id}", get(get_video))
        .route("/api/video/{video_id}/title", put(update_title))
        .route("/api/video/{video_id}/comments", get(list_comments))
        .route("/api/video/{video_id}/comment", post(add_comment))
        .route("/api/comment/{comment_id}", delete(delete_comment))
        .with_state(state)
}
