use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

mod broker;

pub use broker::{
    DEFAULT_AUTH_URL, DEFAULT_TOKEN_URL, OAuthBroker, OAuthConfig, TokenResponse, YOUTUBE_SCOPE,
};

/// Errors from the OAuth broker
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization code is required")]
    MissingCode,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Access token expired and no refresh token is available")]
    Expired,

    /// The token endpoint could not be reached or returned garbage.
    #[error("Authentication failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The token endpoint answered with a non-2xx status.
    #[error("Authentication failed ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid authorization endpoint: {0}")]
    InvalidAuthUrl(#[from] url::ParseError),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCode => StatusCode::BAD_REQUEST,
            AuthError::NotAuthenticated | AuthError::Expired => StatusCode::UNAUTHORIZED,
            AuthError::Request(_) | AuthError::Rejected { .. } | AuthError::InvalidAuthUrl(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short message for the `error` field of a response body
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingCode => "Authorization code is required",
            AuthError::NotAuthenticated => "Not authenticated",
            AuthError::Expired => "Access token expired, please authenticate again",
            AuthError::Request(_) | AuthError::Rejected { .. } => "Authentication failed",
            AuthError::InvalidAuthUrl(_) => "Failed to generate auth URL",
        }
    }

    /// Upstream details, when there are any worth passing on
    pub fn details(&self) -> Option<Value> {
        match self {
            AuthError::Rejected { body, .. } => Some(
                serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone())),
            ),
            AuthError::Request(err) => Some(Value::String(err.to_string())),
            AuthError::InvalidAuthUrl(err) => Some(Value::String(err.to_string())),
            _ => None,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "OAuth error");
        } else {
            tracing::warn!(error = %self, "OAuth request rejected");
        }
        let body = ErrorResponse {
            error: self.message().to_string(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

/// Error body shared by every route: `{error, details}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

/// Body of `POST /api/auth/token`
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    #[serde(default)]
    pub code: Option<String>,
}

async fn auth_url_handler(State(broker): State<Arc<OAuthBroker>>) -> Result<impl IntoResponse, AuthError> {
    let auth_url = broker.auth_url()?;
    Ok(Json(AuthUrlResponse { auth_url }))
}

/// Exchange requested by the client after it was redirected back with a code
async fn token_handler(
    State(broker): State<Arc<OAuthBroker>>,
    payload: Result<Json<CodeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    // An unreadable body carries no code either.
    let code = match payload {
        Ok(Json(request)) => request.code.unwrap_or_default(),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "unreadable token request body");
            String::new()
        }
    };
    broker.exchange_code(&code).await?;
    Ok(Json(json!({ "success": true })))
}

/// Redirect target registered with the OAuth client
async fn callback_handler(
    State(broker): State<Arc<OAuthBroker>>,
    Query(request): Query<CodeRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let code = request.code.unwrap_or_default();
    broker.exchange_code(&code).await?;
    Ok(Html(SUCCESS_PAGE))
}

async fn status_handler(State(broker): State<Arc<OAuthBroker>>) -> impl IntoResponse {
    Json(json!({ "authenticated": broker.is_authenticated().await }))
}

const SUCCESS_PAGE: &str = "<!DOCTYPE html>\
<html><head><title>Authentication successful</title></head>\
<body><h1>Authentication successful!</h1>\
<p>You can close this window and return to the application.</p></body></html>";

/// Create the router for the OAuth endpoints
pub fn create_router(broker: Arc<OAuthBroker>) -> Router {
    Router::new()
        .route("/api/auth/url", get(auth_url_handler))
        .route("/api/auth/token", post(token_handler))
        .route("/api/auth/status", get(status_handler))
        .route("/auth/callback", get(callback_handler))
        .with_state(broker)
}
