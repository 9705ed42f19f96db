//! Pipeline - orchestrates the bootstrap-collect-cache-search flow.

use std::time::Duration;

use crate::auth::{BootstrapTarget, CredentialStore, SessionBootstrapper};
use crate::collect::{CollectOptions, Collector, PostCache};
use crate::error::{Result, StashError};
use crate::reddit::{ItemFilter, RedditFeed};
use crate::search::{self, SearchOptions};
use crate::types::{Platform, SavedPost};
use crate::x::XFeed;

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Run the browser headless.
    pub headless: bool,
    /// Hard timeout for navigation and header capture.
    pub capture_timeout: Duration,
    /// Bounds for each collection run.
    pub collect: CollectOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            headless: true,
            capture_timeout: Duration::from_secs(30),
            collect: CollectOptions::default(),
        }
    }
}

/// A configured Reddit account.
#[derive(Debug, Clone)]
pub struct RedditAccount {
    /// Username whose saved listing is collected.
    pub username: String,
    /// Session credentials.
    pub credentials: CredentialStore,
}

/// Saved-content pipeline over the configured platform accounts.
///
/// Owns its session handles and post cache explicitly - there is no
/// process-wide singleton. The cache lives as long as this value; refresh is
/// the caller's explicit choice via `force_refresh`.
pub struct Pipeline {
    config: PipelineConfig,
    reddit: Option<RedditAccount>,
    x: Option<CredentialStore>,
    cache: PostCache,
}

impl Pipeline {
    /// Create a pipeline with no accounts configured.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            reddit: None,
            x: None,
            cache: PostCache::new(),
        }
    }

    /// Configure a Reddit account.
    #[must_use]
    pub fn with_reddit(mut self, username: impl Into<String>, credentials: CredentialStore) -> Self {
        self.reddit = Some(RedditAccount {
            username: username.into(),
            credentials,
        });
        self
    }

    /// Configure X credentials.
    #[must_use]
    pub fn with_x(mut self, credentials: CredentialStore) -> Self {
        self.x = Some(credentials);
        self
    }

    /// Collect saved items for a platform.
    ///
    /// Unfiltered collections are cached for the process lifetime and served
    /// from the cache unless `force_refresh` is set. Filtered Reddit
    /// collections always fetch fresh and leave the cache untouched.
    pub async fn collect(
        &self,
        platform: Platform,
        filter: ItemFilter,
        force_refresh: bool,
    ) -> Result<Vec<SavedPost>> {
        let cacheable = filter == ItemFilter::All;

        if cacheable && !force_refresh {
            if let Some(cached) = self.cache.get(platform).await {
                tracing::info!(%platform, count = cached.len(), "Serving posts from cache");
                return Ok(cached);
            }
        }

        let posts = match platform {
            Platform::Reddit => self.collect_reddit(filter).await?,
            Platform::X => self.collect_x().await?,
        };

        if cacheable {
            self.cache.store(platform, posts.clone()).await;
        }
        Ok(posts)
    }

    /// Collect (honoring the cache) and fuzzy-search a platform's posts.
    pub async fn search(
        &self,
        platform: Platform,
        queries: &[String],
        options: &SearchOptions,
        force_refresh: bool,
    ) -> Result<Vec<SavedPost>> {
        let posts = self
            .collect(platform, ItemFilter::All, force_refresh)
            .await?;
        Ok(search::filter_posts(&posts, queries, options))
    }

    /// Check whether the configured credentials still authenticate.
    ///
    /// Runs a bootstrap and reports `false` on a login redirect; other
    /// failures (browser, missing credentials) propagate.
    pub async fn validate(&self, platform: Platform) -> Result<bool> {
        let (credentials, target) = self.platform_target(platform)?;
        let mut bootstrapper =
            SessionBootstrapper::new(credentials, self.config.headless)
                .with_timeout(self.config.capture_timeout);

        let outcome = bootstrapper.bootstrap(&target).await;
        bootstrapper.close().await;

        match outcome {
            Ok(_) => Ok(true),
            Err(StashError::Unauthenticated { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn collect_reddit(&self, filter: ItemFilter) -> Result<Vec<SavedPost>> {
        let account = self.reddit.as_ref().ok_or_else(|| {
            StashError::Credentials("no Reddit account configured".to_string())
        })?;

        let session = self
            .bootstrap_session(account.credentials.clone(), reddit_target(&account.username))
            .await?;
        let feed = RedditFeed::new(&session, &account.username)?.with_filter(filter);

        Ok(Collector::new(self.config.collect.clone())
            .collect(&feed)
            .await)
    }

    async fn collect_x(&self) -> Result<Vec<SavedPost>> {
        let credentials = self
            .x
            .clone()
            .ok_or_else(|| StashError::Credentials("no X credentials configured".to_string()))?;

        let session = self.bootstrap_session(credentials, x_target()).await?;
        let feed = XFeed::new(&session)?;

        Ok(Collector::new(self.config.collect.clone())
            .collect(&feed)
            .await)
    }

    async fn bootstrap_session(
        &self,
        credentials: CredentialStore,
        target: BootstrapTarget,
    ) -> Result<crate::auth::CapturedSession> {
        let mut bootstrapper = SessionBootstrapper::new(credentials, self.config.headless)
            .with_timeout(self.config.capture_timeout);
        let outcome = bootstrapper.bootstrap(&target).await;
        bootstrapper.close().await;
        outcome
    }

    fn platform_target(&self, platform: Platform) -> Result<(CredentialStore, BootstrapTarget)> {
        match platform {
            Platform::Reddit => {
                let account = self.reddit.as_ref().ok_or_else(|| {
                    StashError::Credentials("no Reddit account configured".to_string())
                })?;
                Ok((
                    account.credentials.clone(),
                    reddit_target(&account.username),
                ))
            }
            Platform::X => {
                let credentials = self.x.clone().ok_or_else(|| {
                    StashError::Credentials("no X credentials configured".to_string())
                })?;
                Ok((credentials, x_target()))
            }
        }
    }
}

/// Bootstrap target for a user's saved listing.
///
/// Navigating straight to the listing URL makes the document request itself
/// the captured request, so capture succeeds even when the page triggers no
/// further API calls.
fn reddit_target(username: &str) -> BootstrapTarget {
    BootstrapTarget {
        platform: Platform::Reddit,
        url: format!("{}/user/{username}/saved.json", crate::reddit::BASE_URL),
        request_markers: vec!["saved.json".to_string()],
        cookie_domain: crate::reddit::TARGET_DOMAIN.to_string(),
    }
}

/// Bootstrap target for the bookmarks page, which fires the GraphQL call on
/// load.
fn x_target() -> BootstrapTarget {
    BootstrapTarget {
        platform: Platform::X,
        url: crate::x::BOOKMARKS_URL.to_string(),
        request_markers: vec!["graphql".to_string(), "Bookmarks".to_string()],
        cookie_domain: crate::x::TARGET_DOMAIN.to_string(),
    }
}
