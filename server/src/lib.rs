use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::{Json, Router, routing::get};
use oauth_service::OAuthBroker;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use video_service::ProxyState;
use youtube_client::YouTubeApi;

pub mod config;

use config::ServerConfig;

/// Upper bound for any single call to Google, so a stalled token refresh
/// cannot hold the credential lock indefinitely
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client shared by the YouTube client and the OAuth broker
pub fn upstream_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Assemble the OAuth and proxy routers behind tracing and CORS layers
pub fn build_app(
    youtube: Arc<dyn YouTubeApi>,
    broker: Arc<OAuthBroker>,
    cors_origins: &[String],
) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .merge(oauth_service::create_router(broker.clone()))
        .merge(video_service::create_router(ProxyState { youtube, broker }))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(build_cors_layer(cors_origins))
}

/// Build the CORS layer; origins that do not parse are skipped with a warning
pub fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(%origin, error = %err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(3600))
}

/// Wire the production clients from configuration; both share one
/// connection pool
pub fn app_from_config(config: &ServerConfig) -> Result<Router, reqwest::Error> {
    let http = upstream_client(UPSTREAM_TIMEOUT)?;
    let youtube = youtube_client::YouTubeClient::with_base_url(
        http.clone(),
        config.youtube_api_base_url.clone(),
        config.youtube_api_key.clone(),
    );
    let broker = OAuthBroker::with_client(http, config.oauth.clone());
    Ok(build_app(
        Arc::new(youtube),
        Arc::new(broker),
        &config.cors_origins,
    ))
}
