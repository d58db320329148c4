//! View-model for the mini-yt front end.
//!
//! [`App`] holds everything a form view renders (authentication flag, the
//! looked-up video, its comments, input fields, loading and error state) and
//! drives the proxy through a [`ProxyApi`]. Validation that the UI does before
//! touching the network lives here too.

use domain::{CommentThread, Video};
use std::sync::Arc;
use url::Url;

mod api;

pub use api::{ClientError, DEFAULT_API_BASE_URL, HttpProxyClient, ProxyApi};

pub const MSG_ENTER_VIDEO_ID: &str = "Please enter a video ID";
pub const MSG_AUTHENTICATE_FIRST: &str = "Please authenticate first";
pub const MSG_EMPTY_COMMENT: &str = "Comment cannot be empty";

pub struct App {
    api: Arc<dyn ProxyApi>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub error: String,
    pub video_id: String,
    pub video: Option<Video>,
    pub comments: Vec<CommentThread>,
    pub new_title: String,
    pub new_comment: String,
}

impl App {
    pub fn new(api: Arc<dyn ProxyApi>) -> Self {
        Self {
            api,
            is_authenticated: false,
            loading: false,
            error: String::new(),
            video_id: String::new(),
            video: None,
            comments: Vec::new(),
            new_title: String::new(),
            new_comment: String::new(),
        }
    }

    /// Handle the page load after the consent screen redirected back.
    ///
    /// When `location` carries a `code` it is exchanged; on success the
    /// returned URL is `location` without its query, for the view to show
    /// instead.
    pub async fn handle_redirect(&mut self, location: &str) -> Option<String> {
        let mut url = Url::parse(location).ok()?;
        let code = url
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned())?;

        match self.api.exchange_code(&code).await {
            Ok(()) => {
                self.is_authenticated = true;
                url.set_query(None);
                tracing::info!("authenticated");
                Some(url.into())
            }
            Err(err) => {
                tracing::warn!(error = %err, "code exchange failed");
                self.error = "Authentication failed".to_string();
                None
            }
        }
    }

    /// URL of the consent screen to navigate to
    pub async fn authenticate(&mut self) -> Option<String> {
        match self.api.auth_url().await {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(error = %err, "auth url request failed");
                self.error = "Failed to generate auth URL".to_string();
                None
            }
        }
    }

    /// Look up `video_id` and then load its comments
    pub async fn fetch_video_details(&mut self) {
        if self.video_id.is_empty() {
            self.error = MSG_ENTER_VIDEO_ID.to_string();
            return;
        }

        self.begin();
        match self.api.get_video(&self.video_id).await {
            Ok(video) => {
                self.new_title = video.snippet.title.clone();
                self.video = Some(video);
                self.fetch_comments().await;
            }
            Err(err) => self.fail("Failed to fetch video details", err),
        }
        self.loading = false;
    }

    /// Comment failures are logged, not shown
    pub async fn fetch_comments(&mut self) {
        if self.video_id.is_empty() {
            return;
        }
        match self.api.list_comments(&self.video_id).await {
            Ok(comments) => self.comments = comments,
            Err(err) => tracing::warn!(error = %err, "failed to fetch comments"),
        }
    }

    pub async fn update_title(&mut self) {
        if !self.is_authenticated {
            self.error = MSG_AUTHENTICATE_FIRST.to_string();
            return;
        }

        self.begin();
        match self.api.update_title(&self.video_id, &self.new_title).await {
            Ok(()) => self.fetch_video_details().await,
            Err(err) => self.fail("Failed to update title", err),
        }
        self.loading = false;
    }

    pub async fn add_comment(&mut self) {
        if !self.is_authenticated {
            self.error = MSG_AUTHENTICATE_FIRST.to_string();
            return;
        }
        if self.new_comment.trim().is_empty() {
            self.error = MSG_EMPTY_COMMENT.to_string();
            return;
        }

        self.begin();
        match self.api.add_comment(&self.video_id, &self.new_comment).await {
            Ok(()) => {
                self.new_comment.clear();
                self.fetch_comments().await;
            }
            Err(err) => self.fail("Failed to add comment", err),
        }
        self.loading = false;
    }

    pub async fn delete_comment(&mut self, comment_id: &str) {
        if !self.is_authenticated {
            self.error = MSG_AUTHENTICATE_FIRST.to_string();
            return;
        }

        self.begin();
        match self.api.delete_comment(comment_id, &self.video_id).await {
            Ok(()) => self.fetch_comments().await,
            Err(err) => self.fail("Failed to delete comment", err),
        }
        self.loading = false;
    }

    /// Delete is only offered on comments written by the video's own channel
    pub fn can_delete(&self, comment: &CommentThread) -> bool {
        self.video
            .as_ref()
            .is_some_and(|video| comment.is_authored_by_owner_of(video))
    }

    pub fn deletable_comments(&self) -> impl Iterator<Item = &CommentThread> {
        self.comments.iter().filter(|c| self.can_delete(c))
    }

    fn begin(&mut self) {
        self.loading = true;
        self.error.clear();
    }

    fn fail(&mut self, message: &str, err: ClientError) {
        tracing::warn!(error = %err, "{message}");
        self.error = message.to_string();
    }
}
