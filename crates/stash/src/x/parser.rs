//! Normalizes X GraphQL bookmark responses into the unified post model.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::types::{Author, Media, MediaType, Platform, SavedPost};

/// Timestamp format used in tweet `created_at` fields,
/// e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Extract all tweets from a bookmarks timeline response.
///
/// Malformed entries are skipped individually; a response with no
/// recognizable timeline yields an empty list, never an error.
#[must_use]
pub fn parse_bookmark_timeline(data: &Value) -> Vec<SavedPost> {
    let posts: Vec<SavedPost> = timeline_entries(data).filter_map(normalize_entry).collect();
    tracing::debug!(count = posts.len(), "Parsed bookmark timeline");
    posts
}

/// Extract the bottom pagination cursor, if the page carries one.
#[must_use]
pub fn extract_bottom_cursor(data: &Value) -> Option<String> {
    timeline_entries(data).find_map(|entry| {
        let entry_id = entry.get("entryId").and_then(Value::as_str)?;
        if !entry_id.starts_with("cursor-bottom-") {
            return None;
        }
        entry
            .pointer("/content/value")
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}

fn timeline_entries(data: &Value) -> impl Iterator<Item = &Value> {
    data.pointer("/data/bookmark_timeline_v2/timeline/instructions")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|instruction| instruction.get("entries").and_then(Value::as_array))
        .flatten()
}

fn normalize_entry(entry: &Value) -> Option<SavedPost> {
    let mut result = entry.pointer("/content/itemContent/tweet_results/result")?;
    // Retweets and quoted tweets wrap the payload in a "tweet" field.
    if let Some(inner) = result.get("tweet") {
        result = inner;
    }

    let tweet_id = result.get("rest_id").and_then(Value::as_str)?;
    let legacy = result.get("legacy").unwrap_or(&Value::Null);

    let author = parse_tweet_author(result);
    let full_text = legacy
        .get("full_text")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut post = SavedPost::new(
        tweet_id,
        Platform::X,
        author,
        full_text,
        format!(
            "https://x.com/{}/status/{tweet_id}",
            tweet_username_for_url(result)
        ),
        parse_created_at(legacy.get("created_at")),
    );
    post.media = scan_tweet_media(legacy);
    post.metadata = tweet_metadata(legacy);
    Some(post)
}

fn parse_tweet_author(result: &Value) -> Author {
    let user = result
        .pointer("/core/user_results/result")
        .unwrap_or(&Value::Null);
    let username = user.pointer("/core/screen_name").and_then(Value::as_str);

    let Some(username) = username.filter(|s| !s.is_empty()) else {
        return Author::deleted(Platform::X);
    };

    let display_name = user
        .pointer("/core/name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(username);
    let avatar_url = user
        .pointer("/avatar/image_url")
        .and_then(Value::as_str)
        .map(str::to_string);
    let id = user
        .get("rest_id")
        .and_then(Value::as_str)
        .unwrap_or(username);

    Author::new(id, username, display_name, avatar_url, Platform::X)
}

fn tweet_username_for_url(result: &Value) -> String {
    result
        .pointer("/core/user_results/result/core/screen_name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("i")
        .to_string()
}

/// Parse the legacy timestamp format; fall back to now rather than dropping
/// the tweet.
fn parse_created_at(value: Option<&Value>) -> DateTime<Utc> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_str(s, CREATED_AT_FORMAT).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

/// Scan media attachments, preferring `extended_entities` over `entities`.
fn scan_tweet_media(legacy: &Value) -> Vec<Media> {
    let entities = legacy
        .get("extended_entities")
        .or_else(|| legacy.get("entities"))
        .unwrap_or(&Value::Null);
    let Some(items) = entities.get("media").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let url = item
                .get("media_url_https")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())?;
            match item.get("type").and_then(Value::as_str).unwrap_or("photo") {
                "photo" => Some(Media {
                    media_type: MediaType::Image,
                    url: url.to_string(),
                    thumbnail_url: None,
                }),
                // Videos and animated GIFs expose the same static preview URL.
                "video" | "animated_gif" => Some(Media {
                    media_type: MediaType::Video,
                    url: url.to_string(),
                    thumbnail_url: Some(url.to_string()),
                }),
                _ => None,
            }
        })
        .collect()
}

fn tweet_metadata(legacy: &Value) -> Map<String, Value> {
    let count = |field: &str| legacy.get(field).and_then(Value::as_i64).unwrap_or(0);

    let mut meta = Map::new();
    meta.insert("retweet_count".into(), count("retweet_count").into());
    meta.insert("like_count".into(), count("favorite_count").into());
    meta.insert("reply_count".into(), count("reply_count").into());
    meta.insert("quote_count".into(), count("quote_count").into());
    meta.insert(
        "is_retweet".into(),
        legacy.get("retweeted").and_then(Value::as_bool).unwrap_or(false).into(),
    );
    meta.insert(
        "conversation_id".into(),
        legacy
            .get("conversation_id_str")
            .cloned()
            .unwrap_or(Value::Null),
    );
    meta
}
