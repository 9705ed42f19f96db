//! Paginated feed over a user's saved-items listing.

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::CapturedSession;
use crate::collect::FeedSource;
use crate::error::Result;
use crate::reddit::parser::{normalize_item, ItemFilter, RedditItem};
use crate::types::{Platform, SavedPost};

/// Items requested per page. Reddit caps listing pages at 100.
const PAGE_SIZE: u32 = 100;

/// Feed over `/user/{username}/saved.json`, following the `after` cursor.
pub struct RedditFeed {
    client: reqwest::Client,
    base_url: String,
    username: String,
    filter: ItemFilter,
}

impl RedditFeed {
    /// Build a feed that sends the captured session headers on every request.
    pub fn new(session: &CapturedSession, username: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(session.header_map())
            .build()?;
        Ok(Self {
            client,
            base_url: crate::reddit::BASE_URL.to_string(),
            username: username.into(),
            filter: ItemFilter::All,
        })
    }

    /// Restrict collection to posts or comments.
    #[must_use]
    pub fn with_filter(mut self, filter: ItemFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Override the base URL (tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn saved_url(&self) -> String {
        format!("{}/user/{}/saved.json", self.base_url, self.username)
    }
}

#[async_trait]
impl FeedSource for RedditFeed {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Value> {
        let mut request = self.client.get(self.saved_url()).query(&[
            ("limit", PAGE_SIZE.to_string().as_str()),
            ("raw_json", "1"),
        ]);
        if let Some(after) = cursor {
            request = request.query(&[("after", after)]);
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }

    fn parse_page(&self, page: &Value) -> Vec<SavedPost> {
        let Some(children) = page.pointer("/data/children").and_then(Value::as_array) else {
            tracing::debug!("Listing page has no children");
            return Vec::new();
        };

        children
            .iter()
            .filter_map(|child| {
                let kind = child.get("kind").and_then(Value::as_str)?;
                let data = child.get("data")?;
                let item = RedditItem::classify(kind, data)?;
                if !self.filter.keeps(&item) {
                    return None;
                }
                normalize_item(&item)
            })
            .collect()
    }

    fn next_cursor(&self, page: &Value) -> Option<String> {
        page.pointer("/data/after")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feed() -> RedditFeed {
        RedditFeed::new(&CapturedSession::fallback("test-agent"), "alice").unwrap()
    }

    #[test]
    fn saved_url_includes_username() {
        assert_eq!(
            feed().saved_url(),
            "https://www.reddit.com/user/alice/saved.json"
        );
    }

    #[test]
    fn cursor_comes_from_listing_after() {
        let page = json!({"data": {"after": "t3_next", "children": []}});
        assert_eq!(feed().next_cursor(&page), Some("t3_next".to_string()));

        let done = json!({"data": {"after": null, "children": []}});
        assert_eq!(feed().next_cursor(&done), None);
    }

    #[test]
    fn parse_page_mixes_posts_and_comments() {
        let page = json!({"data": {"children": [
            {"kind": "t3", "data": {"id": "p1", "title": "post", "is_self": true}},
            {"kind": "t1", "data": {"id": "c1", "body": "comment", "link_title": "post"}},
            {"kind": "t5", "data": {"id": "sub1"}},
        ]}});

        let posts = feed().parse_page(&page);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "p1");
        assert_eq!(posts[1].id, "c1");
    }

    #[test]
    fn filter_drops_non_matching_kinds() {
        let page = json!({"data": {"children": [
            {"kind": "t3", "data": {"id": "p1", "title": "post", "is_self": true}},
            {"kind": "t1", "data": {"id": "c1", "body": "comment"}},
        ]}});

        let posts = feed().with_filter(ItemFilter::Comments).parse_page(&page);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "c1");
    }

    #[test]
    fn malformed_children_are_skipped() {
        let page = json!({"data": {"children": [
            {"kind": "t3"},
            {"data": {"id": "orphan"}},
            {"kind": "t3", "data": {"id": "ok", "title": "t", "is_self": true}},
        ]}});

        let posts = feed().parse_page(&page);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "ok");
    }
}
