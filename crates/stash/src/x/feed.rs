//! Paginated feed over the bookmarks GraphQL timeline.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::auth::CapturedSession;
use crate::collect::FeedSource;
use crate::error::Result;
use crate::types::{Platform, SavedPost};
use crate::x::parser;

/// GraphQL endpoint for the bookmarks timeline. The hash segment drifts as X
/// redeploys; requests keep resolving as long as the captured headers match
/// what the web client sends.
const GRAPHQL_ENDPOINT: &str = "https://x.com/i/api/graphql/E6jlrZG4703s0mcA9DfNKQ/Bookmarks";

/// Items requested per page, mirroring the web client.
const PAGE_SIZE: u32 = 800;

/// Feature flags the web client sends alongside every bookmarks query.
/// The endpoint rejects requests that omit them.
fn graphql_features() -> Value {
    json!({
        "rweb_video_screen_enabled": false,
        "profile_label_improvements_pcf_label_in_post_enabled": true,
        "responsive_web_profile_redirect_enabled": false,
        "rweb_tipjar_consumption_enabled": true,
        "verified_phone_label_enabled": false,
        "creator_subscriptions_tweet_preview_api_enabled": true,
        "responsive_web_graphql_timeline_navigation_enabled": true,
        "responsive_web_graphql_skip_user_profile_image_extensions_enabled": false,
        "premium_content_api_read_enabled": false,
        "communities_web_enable_tweet_community_results_fetch": true,
        "c9s_tweet_anatomy_moderator_badge_enabled": true,
        "responsive_web_grok_analyze_button_fetch_trends_enabled": false,
        "responsive_web_grok_analyze_post_followups_enabled": true,
        "responsive_web_jetfuel_frame": true,
        "responsive_web_grok_share_attachment_enabled": true,
        "articles_preview_enabled": true,
        "responsive_web_edit_tweet_api_enabled": true,
        "graphql_is_translatable_rweb_tweet_is_translatable_enabled": true,
        "view_counts_everywhere_api_enabled": true,
        "longform_notetweets_consumption_enabled": true,
        "responsive_web_twitter_article_tweet_consumption_enabled": true,
        "tweet_awards_web_tipping_enabled": false,
        "responsive_web_grok_show_grok_translated_post": true,
        "responsive_web_grok_analysis_button_from_backend": true,
        "creator_subscriptions_quote_tweet_preview_enabled": false,
        "freedom_of_speech_not_reach_fetch_enabled": true,
        "standardized_nudges_misinfo": true,
        "tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled": true,
        "longform_notetweets_rich_text_read_enabled": true,
        "longform_notetweets_inline_media_enabled": true,
        "responsive_web_grok_image_annotation_enabled": true,
        "responsive_web_grok_imagine_annotation_enabled": true,
        "responsive_web_grok_community_note_auto_translation_is_enabled": false,
        "responsive_web_enhance_cards_enabled": false,
    })
}

/// Feed over the bookmarks GraphQL timeline, following bottom cursors.
pub struct XFeed {
    client: reqwest::Client,
    endpoint: String,
}

impl XFeed {
    /// Build a feed that sends the captured session headers on every request.
    pub fn new(session: &CapturedSession) -> Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(session.header_map())
            .build()?;
        Ok(Self {
            client,
            endpoint: GRAPHQL_ENDPOINT.to_string(),
        })
    }

    /// Override the endpoint (tests).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn page_url(&self, cursor: Option<&str>) -> String {
        let mut variables = json!({
            "count": PAGE_SIZE,
            "includePromotedContent": true,
        });
        if let Some(cursor) = cursor {
            variables["cursor"] = Value::String(cursor.to_string());
        }

        format!(
            "{}?variables={}&features={}",
            self.endpoint,
            urlencoding::encode(&variables.to_string()),
            urlencoding::encode(&graphql_features().to_string()),
        )
    }
}

#[async_trait]
impl FeedSource for XFeed {
    fn platform(&self) -> Platform {
        Platform::X
    }

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Value> {
        let response = self
            .client
            .get(self.page_url(cursor))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<Value>().await?)
    }

    fn parse_page(&self, page: &Value) -> Vec<SavedPost> {
        parser::parse_bookmark_timeline(page)
    }

    fn next_cursor(&self, page: &Value) -> Option<String> {
        parser::extract_bottom_cursor(page)
    }
}
