//! Unified data model for saved content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Source platform for a saved item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Reddit saved posts and comments.
    Reddit,
    /// X (Twitter) bookmarks.
    X,
}

impl Platform {
    /// Lowercase platform name, as used in serialized output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reddit => "reddit",
            Self::X => "x",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author of a saved post.
///
/// Deleted accounts are represented by sentinel values, never by absence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    /// Platform-native author ID.
    pub id: String,
    /// Handle or username.
    pub username: String,
    /// Display name (falls back to the username).
    pub display_name: String,
    /// Avatar image URL, if the platform exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Platform the author belongs to.
    pub platform: Platform,
}

/// Sentinel username for deleted accounts.
pub const DELETED_USERNAME: &str = "[deleted]";
/// Sentinel author ID for deleted accounts.
pub const DELETED_AUTHOR_ID: &str = "deleted";

impl Author {
    /// Create a new author.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        display_name: impl Into<String>,
        avatar_url: Option<String>,
        platform: Platform,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            display_name: display_name.into(),
            avatar_url,
            platform,
        }
    }

    /// Sentinel author for content whose account no longer exists.
    #[must_use]
    pub fn deleted(platform: Platform) -> Self {
        Self::new(
            DELETED_AUTHOR_ID,
            DELETED_USERNAME,
            DELETED_USERNAME,
            None,
            platform,
        )
    }
}

/// Type of media attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Image attachment.
    Image,
    /// Video attachment.
    Video,
    /// GIF attachment.
    Gif,
}

/// Media attached to a post, in source order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    /// Media type (image, video, gif).
    pub media_type: MediaType,
    /// URL to the media asset.
    pub url: String,
    /// Thumbnail URL if the platform provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Unified model for a saved post across all platforms.
///
/// Constructed once by a platform normalizer and immutable afterwards.
/// `id` + `platform` uniquely identify a post within one collection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPost {
    /// Platform-native item ID.
    pub id: String,
    /// Source platform.
    pub platform: Platform,
    /// Post author (sentinel values when deleted).
    pub author: Author,
    /// Composed text content; never null, empty string allowed.
    pub content: String,
    /// Canonical URL of the post.
    pub url: String,
    /// When the content was created, in UTC.
    pub created_at: DateTime<Utc>,
    /// When it was saved/bookmarked, if the platform exposes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    /// Attached media, in source order.
    #[serde(default)]
    pub media: Vec<Media>,
    /// Platform-specific fields (subreddit/score, retweet/like counts, ...).
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SavedPost {
    /// Create a post with empty media and metadata.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        platform: Platform,
        author: Author,
        content: impl Into<String>,
        url: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            platform,
            author,
            content: content.into(),
            url: url.into(),
            created_at,
            saved_at: None,
            media: Vec::new(),
            metadata: Map::new(),
        }
    }
}
