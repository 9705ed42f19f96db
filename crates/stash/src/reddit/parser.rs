//! Normalizes Reddit listing items into the unified post model.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::types::{Author, Media, MediaType, Platform, SavedPost};

/// A saved listing item, tagged by the listing `kind` discriminant.
#[derive(Debug, Clone, Copy)]
pub enum RedditItem<'a> {
    /// `t3` - a submission (post).
    Submission(&'a Value),
    /// `t1` - a comment.
    Comment(&'a Value),
}

impl<'a> RedditItem<'a> {
    /// Classify a listing child by its `kind` field.
    ///
    /// Unknown kinds (messages, subreddits, ...) return `None` and are
    /// dropped by the feed.
    #[must_use]
    pub fn classify(kind: &str, data: &'a Value) -> Option<Self> {
        match kind {
            "t3" => Some(Self::Submission(data)),
            "t1" => Some(Self::Comment(data)),
            _ => None,
        }
    }
}

/// Which saved-item kinds a collection keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemFilter {
    /// Both posts and comments.
    #[default]
    All,
    /// Submissions only.
    Posts,
    /// Comments only.
    Comments,
}

impl ItemFilter {
    /// Whether this filter keeps the given item.
    #[must_use]
    pub fn keeps(self, item: &RedditItem<'_>) -> bool {
        match (self, item) {
            (Self::All, _)
            | (Self::Posts, RedditItem::Submission(_))
            | (Self::Comments, RedditItem::Comment(_)) => true,
            _ => false,
        }
    }
}

/// Normalize one listing item into a [`SavedPost`].
///
/// Returns `None` (never an error) when the item id is missing; such items
/// are silently dropped.
#[must_use]
pub fn normalize_item(item: &RedditItem<'_>) -> Option<SavedPost> {
    match item {
        RedditItem::Submission(data) => normalize_submission(data),
        RedditItem::Comment(data) => normalize_comment(data),
    }
}

fn normalize_submission(data: &Value) -> Option<SavedPost> {
    let id = required_str(data, "id")?;

    let title = str_field(data, "title");
    let selftext = str_field(data, "selftext");
    let url = str_field(data, "url");
    let is_self = bool_field(data, "is_self");

    // Self posts carry their body; link posts carry the raw target URL.
    let content = if is_self {
        if selftext.is_empty() {
            title.clone()
        } else {
            format!("{title}\n\n{selftext}")
        }
    } else {
        format!("{title}\n\n{url}")
    };

    let mut media = scan_preview_media(data);
    if media.is_empty() {
        if let Some(direct) = media_from_extension(&url) {
            media.push(direct);
        }
    }

    let permalink = str_field(data, "permalink");
    let mut post = SavedPost::new(
        id,
        Platform::Reddit,
        parse_author(data),
        content,
        format!("https://reddit.com{permalink}"),
        parse_epoch(data.get("created_utc")),
    );
    post.media = media;
    post.metadata = submission_metadata(data);
    Some(post)
}

fn normalize_comment(data: &Value) -> Option<SavedPost> {
    let id = required_str(data, "id")?;

    let link_title = data
        .get("link_title")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown post");
    let body = str_field(data, "body");
    let content = format!("[Comment on: {link_title}]\n\n{body}");

    let permalink = str_field(data, "permalink");
    let mut post = SavedPost::new(
        id,
        Platform::Reddit,
        parse_author(data),
        content,
        format!("https://reddit.com{permalink}"),
        parse_epoch(data.get("created_utc")),
    );
    post.metadata = comment_metadata(data);
    Some(post)
}

fn parse_author(data: &Value) -> Author {
    let username = data
        .get("author")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    let id = data
        .get("author_fullname")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());

    match (id, username) {
        (None, None) => Author::deleted(Platform::Reddit),
        (id, username) => {
            let username = username.unwrap_or(crate::types::DELETED_USERNAME);
            Author::new(
                id.unwrap_or(crate::types::DELETED_AUTHOR_ID),
                username,
                username,
                None,
                Platform::Reddit,
            )
        }
    }
}

/// Scan `preview.images` for structured media, unescaping HTML entities and
/// using the largest listed resolution as the thumbnail.
fn scan_preview_media(data: &Value) -> Vec<Media> {
    let Some(images) = data.pointer("/preview/images").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut media = Vec::new();
    for image in images {
        let Some(source_url) = image
            .pointer("/source/url")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        else {
            continue;
        };
        let thumbnail = image
            .pointer("/resolutions")
            .and_then(Value::as_array)
            .and_then(|resolutions| resolutions.last())
            .and_then(|r| r.get("url"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(unescape_entities);
        media.push(Media {
            media_type: MediaType::Image,
            url: unescape_entities(source_url),
            thumbnail_url: thumbnail,
        });
    }
    media
}

/// Fallback for posts whose primary URL is itself an image.
fn media_from_extension(url: &str) -> Option<Media> {
    if url.is_empty() {
        return None;
    }
    let media_type = if url.ends_with(".gif") {
        MediaType::Gif
    } else if [".jpg", ".jpeg", ".png"]
        .iter()
        .any(|ext| url.ends_with(ext))
    {
        MediaType::Image
    } else {
        return None;
    };
    Some(Media {
        media_type,
        url: url.to_string(),
        thumbnail_url: None,
    })
}

fn submission_metadata(data: &Value) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert("subreddit".into(), str_field(data, "subreddit").into());
    meta.insert(
        "subreddit_id".into(),
        str_field(data, "subreddit_id").into(),
    );
    meta.insert("score".into(), int_field(data, "score").into());
    meta.insert(
        "num_comments".into(),
        int_field(data, "num_comments").into(),
    );
    meta.insert("is_self".into(), bool_field(data, "is_self").into());
    meta.insert(
        "link_flair_text".into(),
        data.get("link_flair_text").cloned().unwrap_or(Value::Null),
    );
    meta.insert("over_18".into(), bool_field(data, "over_18").into());
    meta
}

fn comment_metadata(data: &Value) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert("subreddit".into(), str_field(data, "subreddit").into());
    meta.insert(
        "subreddit_id".into(),
        str_field(data, "subreddit_id").into(),
    );
    meta.insert("score".into(), int_field(data, "score").into());
    meta.insert("num_comments".into(), 0.into());
    meta.insert("is_self".into(), true.into());
    meta.insert("link_flair_text".into(), Value::Null);
    meta.insert("over_18".into(), bool_field(data, "over_18").into());
    meta
}

fn required_str<'a>(data: &'a Value, field: &str) -> Option<&'a str> {
    data.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn str_field(data: &Value, field: &str) -> String {
    data.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn int_field(data: &Value, field: &str) -> i64 {
    data.get(field).and_then(Value::as_i64).unwrap_or(0)
}

fn bool_field(data: &Value, field: &str) -> bool {
    data.get(field).and_then(Value::as_bool).unwrap_or(false)
}

/// Epoch seconds to UTC; unparsable timestamps fall back to now rather than
/// failing the item.
fn parse_epoch(value: Option<&Value>) -> DateTime<Utc> {
    value
        .and_then(Value::as_f64)
        .and_then(|secs| Utc.timestamp_opt(secs as i64, 0).single())
        .unwrap_or_else(Utc::now)
}

fn unescape_entities(url: &str) -> String {
    url.replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(kind: &str, data: &Value) -> Option<SavedPost> {
        RedditItem::classify(kind, data).and_then(|item| normalize_item(&item))
    }

    #[test]
    fn self_post_composes_title_and_body() {
        let data = json!({
            "id": "abc",
            "title": "A question",
            "selftext": "Some detail",
            "is_self": true,
            "author": "alice",
            "author_fullname": "t2_1",
            "permalink": "/r/rust/comments/abc/a_question/",
            "subreddit": "rust",
            "score": 42,
            "num_comments": 7,
            "created_utc": 1700000000.0,
        });

        let post = normalize("t3", &data).unwrap();
        assert_eq!(post.content, "A question\n\nSome detail");
        assert_eq!(post.url, "https://reddit.com/r/rust/comments/abc/a_question/");
        assert_eq!(post.author.username, "alice");
        assert_eq!(post.metadata["score"], 42);
        assert_eq!(post.metadata["subreddit"], "rust");
        assert_eq!(post.created_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn self_post_with_empty_body_is_title_only() {
        let data = json!({"id": "abc", "title": "Just a title", "is_self": true});
        let post = normalize("t3", &data).unwrap();
        assert_eq!(post.content, "Just a title");
    }

    #[test]
    fn link_post_composes_title_and_url() {
        let data = json!({
            "id": "abc",
            "title": "Cool site",
            "is_self": false,
            "url": "https://example.com/page",
        });
        let post = normalize("t3", &data).unwrap();
        assert_eq!(post.content, "Cool site\n\nhttps://example.com/page");
    }

    #[test]
    fn comment_reproduces_bracket_prefix() {
        let data = json!({
            "id": "c1",
            "link_title": "Original post title",
            "body": "I agree",
            "author": "bob",
            "permalink": "/r/rust/comments/abc/x/c1/",
        });
        let post = normalize("t1", &data).unwrap();
        assert_eq!(post.content, "[Comment on: Original post title]\n\nI agree");
        assert!(post.media.is_empty());
        assert_eq!(post.metadata["is_self"], true);
        assert_eq!(post.metadata["num_comments"], 0);
    }

    #[test]
    fn comment_without_parent_title_uses_placeholder() {
        let data = json!({"id": "c1", "body": "hello"});
        let post = normalize("t1", &data).unwrap();
        assert!(post.content.starts_with("[Comment on: Unknown post]"));
    }

    #[test]
    fn missing_author_produces_sentinels() {
        let data = json!({"id": "abc", "title": "t", "is_self": true});
        let post = normalize("t3", &data).unwrap();
        assert_eq!(post.author.username, "[deleted]");
        assert_eq!(post.author.id, "deleted");
    }

    #[test]
    fn missing_id_drops_the_item() {
        assert!(normalize("t3", &json!({"title": "no id"})).is_none());
        assert!(normalize("t1", &json!({"body": "no id"})).is_none());
    }

    #[test]
    fn unknown_kind_is_dropped() {
        assert!(RedditItem::classify("t5", &json!({"id": "sub"})).is_none());
    }

    #[test]
    fn preview_media_is_unescaped_with_thumbnail() {
        let data = json!({
            "id": "abc",
            "title": "pic",
            "is_self": false,
            "url": "https://example.com/article",
            "preview": {"images": [{
                "source": {"url": "https://preview.redd.it/a.jpg?q=1&amp;s=2"},
                "resolutions": [
                    {"url": "https://preview.redd.it/small.jpg"},
                    {"url": "https://preview.redd.it/large.jpg?x=1&amp;y=2"},
                ],
            }]},
        });
        let post = normalize("t3", &data).unwrap();
        assert_eq!(post.media.len(), 1);
        assert_eq!(post.media[0].url, "https://preview.redd.it/a.jpg?q=1&s=2");
        assert_eq!(
            post.media[0].thumbnail_url.as_deref(),
            Some("https://preview.redd.it/large.jpg?x=1&y=2")
        );
    }

    #[test]
    fn direct_image_url_synthesizes_media() {
        let data = json!({
            "id": "abc",
            "title": "pic",
            "is_self": false,
            "url": "https://i.redd.it/photo.gif",
        });
        let post = normalize("t3", &data).unwrap();
        assert_eq!(post.media.len(), 1);
        assert_eq!(post.media[0].media_type, MediaType::Gif);
        assert_eq!(post.media[0].url, "https://i.redd.it/photo.gif");
    }

    #[test]
    fn structured_media_wins_over_extension_fallback() {
        let data = json!({
            "id": "abc",
            "title": "pic",
            "is_self": false,
            "url": "https://i.redd.it/photo.jpg",
            "preview": {"images": [{"source": {"url": "https://preview.redd.it/a.jpg"}}]},
        });
        let post = normalize("t3", &data).unwrap();
        assert_eq!(post.media.len(), 1);
        assert_eq!(post.media[0].url, "https://preview.redd.it/a.jpg");
    }

    #[test]
    fn absent_counters_default_to_zero() {
        let data = json!({"id": "abc", "title": "t", "is_self": true});
        let post = normalize("t3", &data).unwrap();
        assert_eq!(post.metadata["score"], 0);
        assert_eq!(post.metadata["num_comments"], 0);
        assert_eq!(post.metadata["over_18"], false);
    }

    #[test]
    fn bad_timestamp_falls_back_to_now() {
        let data = json!({"id": "abc", "title": "t", "created_utc": "not-a-number"});
        let before = Utc::now();
        let post = normalize("t3", &data).unwrap();
        assert!(post.created_at >= before);
    }

    #[test]
    fn filter_keeps_matching_kinds() {
        let submission = json!({"id": "s"});
        let comment = json!({"id": "c"});
        let sub_item = RedditItem::classify("t3", &submission).unwrap();
        let com_item = RedditItem::classify("t1", &comment).unwrap();

        assert!(ItemFilter::All.keeps(&sub_item));
        assert!(ItemFilter::All.keeps(&com_item));
        assert!(ItemFilter::Posts.keeps(&sub_item));
        assert!(!ItemFilter::Posts.keeps(&com_item));
        assert!(ItemFilter::Comments.keeps(&com_item));
        assert!(!ItemFilter::Comments.keeps(&sub_item));
    }
}
