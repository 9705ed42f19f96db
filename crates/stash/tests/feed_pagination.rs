//! Feed pagination contract tests.
//!
//! Verify the request shape each platform feed sends (captured headers,
//! pagination params) and the collector's behavior over real HTTP, using a
//! mock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stash::reddit::RedditFeed;
use stash::x::XFeed;
use stash::{CapturedSession, CollectOptions, Collector};

fn session() -> CapturedSession {
    CapturedSession::fallback("stash-test-agent")
        .with_cookie_header(Some("session=abc123".to_string()))
}

fn collector() -> Collector {
    Collector::new(CollectOptions {
        page_delay: Duration::ZERO,
        ..CollectOptions::default()
    })
}

#[tokio::test]
async fn reddit_feed_follows_cursor_and_dedups() {
    let mock_server = MockServer::start().await;

    let page1 = json!({"data": {"after": "t3_p1", "children": [
        {"kind": "t3", "data": {"id": "p1", "title": "First", "is_self": true}},
        {"kind": "t1", "data": {"id": "c1", "body": "nice", "link_title": "First"}},
    ]}});
    let page2 = json!({"data": {"after": null, "children": [
        {"kind": "t3", "data": {"id": "p1", "title": "First", "is_self": true}},
        {"kind": "t3", "data": {"id": "p2", "title": "Second", "is_self": true}},
    ]}});

    Mock::given(method("GET"))
        .and(path("/user/alice/saved.json"))
        .and(query_param("limit", "100"))
        .and(query_param("raw_json", "1"))
        .and(query_param("after", "t3_p1"))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page2))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/alice/saved.json"))
        .and(query_param_is_missing("after"))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page1))
        .expect(1)
        .mount(&mock_server)
        .await;

    let feed = RedditFeed::new(&session(), "alice")
        .unwrap()
        .with_base_url(mock_server.uri());

    let posts = collector().collect(&feed).await;

    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "c1", "p2"]);
}

#[tokio::test]
async fn reddit_feed_returns_partial_results_on_server_error() {
    let mock_server = MockServer::start().await;

    let page1 = json!({"data": {"after": "t3_p1", "children": [
        {"kind": "t3", "data": {"id": "p1", "title": "Only page", "is_self": true}},
    ]}});

    Mock::given(method("GET"))
        .and(path("/user/alice/saved.json"))
        .and(query_param("after", "t3_p1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/alice/saved.json"))
        .and(query_param_is_missing("after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page1))
        .expect(1)
        .mount(&mock_server)
        .await;

    let feed = RedditFeed::new(&session(), "alice")
        .unwrap()
        .with_base_url(mock_server.uri());

    let posts = collector().collect(&feed).await;

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, "p1");
}

#[tokio::test]
async fn reddit_feed_stops_on_empty_listing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/alice/saved.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"after": null, "children": []}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let feed = RedditFeed::new(&session(), "alice")
        .unwrap()
        .with_base_url(mock_server.uri());

    let posts = collector().collect(&feed).await;
    assert!(posts.is_empty());
}

#[tokio::test]
async fn x_feed_parses_a_graphql_page() {
    let mock_server = MockServer::start().await;

    let body = json!({"data": {"bookmark_timeline_v2": {"timeline": {"instructions": [
        {"entries": [
            {"entryId": "tweet-1", "content": {"itemContent": {"tweet_results": {"result": {
                "rest_id": "1",
                "core": {"user_results": {"result": {
                    "rest_id": "u1",
                    "core": {"screen_name": "alice", "name": "Alice"},
                }}},
                "legacy": {
                    "full_text": "bookmarked tweet",
                    "created_at": "Wed Oct 10 20:19:24 +0000 2018",
                    "favorite_count": 5,
                },
            }}}}},
        ]}
    ]}}}});

    Mock::given(method("GET"))
        .and(path("/graphql/TEST/Bookmarks"))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let feed = XFeed::new(&session())
        .unwrap()
        .with_endpoint(format!("{}/graphql/TEST/Bookmarks", mock_server.uri()));

    let posts = collector().collect(&feed).await;

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, "1");
    assert_eq!(posts[0].author.username, "alice");
    assert_eq!(posts[0].content, "bookmarked tweet");
    assert_eq!(posts[0].metadata["like_count"], 5);
}
