use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Access tokens this close to expiry are treated as already expired.
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Represents a video resource as returned by `videos.list`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub snippet: VideoSnippet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<VideoStatistics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Counters are transported as decimal strings by the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<String>,
}

impl VideoStatistics {
    pub fn views(&self) -> Option<u64> {
        self.view_count.as_deref().and_then(|v| v.parse().ok())
    }

    pub fn likes(&self) -> Option<u64> {
        self.like_count.as_deref().and_then(|v| v.parse().ok())
    }
}

/// A top-level comment plus (unused here) replies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub id: String,
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadSnippet {
    #[serde(default)]
    pub video_id: String,
    pub top_level_comment: Comment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    #[serde(default)]
    pub author_display_name: String,
    #[serde(default)]
    pub author_profile_image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_channel_id: Option<AuthorChannelId>,
    #[serde(default)]
    pub text_display: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorChannelId {
    pub value: String,
}

impl CommentThread {
    /// Id of the top-level comment, which is what `comments.delete` expects
    pub fn comment_id(&self) -> &str {
        &self.snippet.top_level_comment.id
    }

    pub fn author_channel_id(&self) -> Option<&str> {
        self.snippet
            .top_level_comment
            .snippet
            .author_channel_id
            .as_ref()
            .map(|c| c.value.as_str())
    }

    pub fn author_name(&self) -> &str {
        &self.snippet.top_level_comment.snippet.author_display_name
    }

    pub fn text(&self) -> &str {
        &self.snippet.top_level_comment.snippet.text_display
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.snippet.top_level_comment.snippet.published_at
    }

    /// True when the comment was written by the channel that owns `video`
    pub fn is_authored_by_owner_of(&self, video: &Video) -> bool {
        matches!(self.author_channel_id(), Some(id) if id == video.snippet.channel_id)
    }
}

/// OAuth token pair held in process memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthCredential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
}

impl OAuthCredential {
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
        scope: Option<String>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
            scope,
        }
    }

    /// Check if the access token is expired (or about to be)
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => now + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry,
            None => false,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Placeholder account record; nothing routes to it yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
