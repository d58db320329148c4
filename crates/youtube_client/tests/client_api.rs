//! Exercises `YouTubeClient` against an in-process mock of the Data API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use youtube_client::{MAX_COMMENT_RESULTS, YouTubeApi, YouTubeApiError, YouTubeClient};

#[derive(Clone, Default)]
struct Recorded {
    calls: Arc<Mutex<Vec<(String, HashMap<String, String>, Option<String>, Option<Value>)>>>,
}

impl Recorded {
    fn push(&self, name: &str, params: HashMap<String, String>, headers: &HeaderMap, body: Option<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), params, auth, body));
    }

    fn last(&self) -> (String, HashMap<String, String>, Option<String>, Option<Value>) {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

async fn videos_list(
    State(rec): State<Recorded>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    rec.push("videos.list", params.clone(), &headers, None);
    let id = params.get("id").cloned().unwrap_or_default();
    let items = if id == "missing" {
        vec![]
    } else {
        vec![json!({
            "kind": "youtube#video",
            "id": id,
            "snippet": {
                "channelId": "channel-1",
                "title": "Mock Video",
                "description": "desc",
                "categoryId": "22",
                "thumbnails": {}
            },
            "statistics": { "viewCount": "10", "likeCount": "1" }
        })]
    };
    Json(json!({ "kind": "youtube#videoListResponse", "items": items }))
}

async fn videos_update(
    State(rec): State<Recorded>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    rec.push("videos.update", params, &headers, Some(body.clone()));
    Json(json!({ "kind": "youtube#video", "id": body["id"], "snippet": body["snippet"] }))
}

async fn comment_threads_list(
    State(rec): State<Recorded>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    rec.push("commentThreads.list", params, &headers, None);
    // Misbehaving upstream: more items than asked for.
    let items: Vec<Value> = (0..120).map(|i| json!({ "id": format!("thread-{i}") })).collect();
    Json(json!({ "kind": "youtube#commentThreadListResponse", "items": items }))
}

async fn comment_threads_insert(
    State(rec): State<Recorded>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    rec.push("commentThreads.insert", params, &headers, Some(body.clone()));
    Json(json!({ "kind": "youtube#commentThread", "id": "thread-new", "snippet": body["snippet"] }))
}

async fn comments_delete(
    State(rec): State<Recorded>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let forbidden = params.get("id").map(String::as_str) == Some("not-mine");
    rec.push("comments.delete", params, &headers, None);
    if forbidden {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": { "code": 403, "message": "forbidden" } })),
        )
            .into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn spawn_mock() -> (YouTubeClient, Recorded) {
    let rec = Recorded::default();
    let app = Router::new()
        .route("/youtube/v3/videos", get(videos_list).put(videos_update))
        .route(
            "/youtube/v3/commentThreads",
            get(comment_threads_list).post(comment_threads_insert),
        )
        .route("/youtube/v3/comments", axum::routing::delete(comments_delete))
        .with_state(rec.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = YouTubeClient::with_base_url(
        reqwest::Client::new(),
        format!("http://{addr}/youtube/v3/"),
        "test-key".to_string(),
    );
    (client, rec)
}

#[tokio::test]
async fn get_video_uses_api_key_without_token() {
    let (client, rec) = spawn_mock().await;

    let video = client.get_video("video-1", None).await.unwrap().unwrap();
    assert_eq!(video["id"], "video-1");
    assert_eq!(video["statistics"]["viewCount"], "10");

    let (name, params, auth, _) = rec.last();
    assert_eq!(name, "videos.list");
    assert_eq!(params["key"], "test-key");
    assert_eq!(params["part"], "snippet,statistics");
    assert!(auth.is_none());
}

#[tokio::test]
async fn get_video_prefers_bearer_token() {
    let (client, rec) = spawn_mock().await;

    client.get_video("video-1", Some("ya29.token")).await.unwrap();

    let (_, params, auth, _) = rec.last();
    assert!(!params.contains_key("key"));
    assert_eq!(auth.as_deref(), Some("Bearer ya29.token"));
}

#[tokio::test]
async fn get_video_with_empty_result_is_none() {
    let (client, _) = spawn_mock().await;
    assert!(client.get_video("missing", None).await.unwrap().is_none());
}

#[tokio::test]
async fn update_title_writes_back_snippet() {
    let (client, rec) = spawn_mock().await;

    let snippet = client
        .update_video_title("video-1", "New Title", "ya29.token")
        .await
        .unwrap();
    assert_eq!(snippet["title"], "New Title");

    let (name, params, auth, body) = rec.last();
    assert_eq!(name, "videos.update");
    assert_eq!(params["part"], "snippet");
    assert_eq!(auth.as_deref(), Some("Bearer ya29.token"));
    let body = body.unwrap();
    assert_eq!(body["id"], "video-1");
    assert_eq!(body["snippet"]["categoryId"], "22");
    assert!(body["snippet"].get("thumbnails").is_none());
}

#[tokio::test]
async fn update_title_of_unknown_video_fails() {
    let (client, _) = spawn_mock().await;

    let err = client
        .update_video_title("missing", "New Title", "ya29.token")
        .await
        .unwrap_err();
    assert!(matches!(err, YouTubeApiError::VideoNotFound(id) if id == "missing"));
}

#[tokio::test]
async fn comment_list_is_capped() {
    let (client, rec) = spawn_mock().await;

    let list = client.list_comment_threads("video-1", None).await.unwrap();
    assert_eq!(list["items"].as_array().unwrap().len(), MAX_COMMENT_RESULTS);

    let (_, params, _, _) = rec.last();
    assert_eq!(params["maxResults"], "100");
    assert_eq!(params["videoId"], "video-1");
}

#[tokio::test]
async fn insert_comment_sends_top_level_snippet() {
    let (client, rec) = spawn_mock().await;

    let thread = client
        .insert_comment_thread("video-1", "Nice video", "ya29.token")
        .await
        .unwrap();
    assert_eq!(thread["id"], "thread-new");

    let (_, _, _, body) = rec.last();
    let body = body.unwrap();
    assert_eq!(body["snippet"]["videoId"], "video-1");
    assert_eq!(
        body["snippet"]["topLevelComment"]["snippet"]["textOriginal"],
        "Nice video"
    );
}

#[tokio::test]
async fn delete_comment_surfaces_upstream_status() {
    let (client, _) = spawn_mock().await;

    client.delete_comment("comment-1", "ya29.token").await.unwrap();

    let err = client
        .delete_comment("not-mine", "ya29.token")
        .await
        .unwrap_err();
    match err {
        YouTubeApiError::Status { status, .. } => assert_eq!(status, 403),
        other => panic!("unexpected error: {other}"),
    }
}
