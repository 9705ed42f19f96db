//! Sequential, deduplicating paginated collector.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::StashError;
use crate::types::{Platform, SavedPost};

/// One page-oriented feed of raw platform payloads.
///
/// The bit-exact request shape (query params, pagination token field name,
/// feature-flag payloads) is owned by each implementation; the collector only
/// sees raw JSON pages and normalized posts.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Platform this feed belongs to.
    fn platform(&self) -> Platform;

    /// Fetch one page of the feed. `cursor` is `None` for the first page.
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Value, StashError>;

    /// Normalize a raw page into posts. Malformed items are skipped, never
    /// surfaced as errors.
    fn parse_page(&self, page: &Value) -> Vec<SavedPost>;

    /// Extract the continuation cursor, if the page carries one.
    fn next_cursor(&self, page: &Value) -> Option<String>;
}

/// Tunable safety bounds for one collection run.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Maximum number of posts to return (`None` = unbounded).
    pub limit: Option<usize>,
    /// Hard cap on pages fetched, regardless of cursors.
    pub max_pages: usize,
    /// Delay between page fetches.
    pub page_delay: Duration,
    /// Overall deadline; on expiry, results collected so far are returned.
    pub deadline: Option<Instant>,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            limit: None,
            max_pages: 50,
            page_delay: Duration::from_millis(250),
            deadline: None,
        }
    }
}

/// Collects a paginated feed into a deduplicated list of posts.
///
/// Page fetches are strictly sequential - each page's cursor depends on the
/// previous page's response - and `seen_ids`/`results` are owned locals of a
/// single `collect` call, so no synchronization is needed.
pub struct Collector {
    options: CollectOptions,
}

impl Collector {
    /// Create a collector with the given bounds.
    #[must_use]
    pub fn new(options: CollectOptions) -> Self {
        Self { options }
    }

    /// Drain the feed until a termination condition is hit.
    ///
    /// Termination: `max_pages` exhausted, `limit` reached, a page with zero
    /// *new* items, a missing continuation cursor, a transport failure, or
    /// deadline expiry. All of these yield a valid (possibly partial, possibly
    /// empty) result; none of them is an error to the caller.
    pub async fn collect<S: FeedSource + ?Sized>(&self, source: &S) -> Vec<SavedPost> {
        let platform = source.platform();
        let mut results: Vec<SavedPost> = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut cursor: Option<String> = None;
        let mut page_count = 0usize;

        while page_count < self.options.max_pages && !self.reached_limit(results.len()) {
            if self.deadline_expired() {
                tracing::warn!(%platform, total = results.len(), "Deadline expired, returning partial results");
                break;
            }
            page_count += 1;

            let page = match self.fetch_page(source, cursor.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    // Fetch failures are terminal for the run, not retried:
                    // the API surface is undocumented and rate-limited.
                    tracing::warn!(
                        %platform,
                        page = page_count,
                        error = %e,
                        total = results.len(),
                        "Fetch failed, returning partial results"
                    );
                    break;
                }
            };

            let mut added = 0usize;
            for post in source.parse_page(&page) {
                if seen_ids.contains(&post.id) {
                    continue;
                }
                seen_ids.insert(post.id.clone());
                results.push(post);
                added += 1;
            }
            tracing::info!(%platform, page = page_count, added, total = results.len(), "Collected page");

            if added == 0 {
                // The platform is repeating content - the reliable end-of-data
                // heuristic for feeds without explicit "no more" signaling.
                tracing::info!(%platform, page = page_count, "No new items on this page, stopping");
                break;
            }
            if self.reached_limit(results.len()) {
                tracing::info!(%platform, limit = ?self.options.limit, "Reached limit");
                break;
            }

            cursor = match source.next_cursor(&page) {
                Some(next) => Some(next),
                None => {
                    tracing::info!(%platform, "No continuation cursor, stopping");
                    break;
                }
            };

            self.pause_between_pages().await;
        }

        if let Some(limit) = self.options.limit {
            results.truncate(limit);
        }
        results
    }

    fn reached_limit(&self, collected: usize) -> bool {
        self.options.limit.is_some_and(|limit| collected >= limit)
    }

    fn deadline_expired(&self) -> bool {
        self.options
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    async fn fetch_page<S: FeedSource + ?Sized>(
        &self,
        source: &S,
        cursor: Option<&str>,
    ) -> Result<Value, StashError> {
        match self.options.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, source.fetch_page(cursor))
                .await
                .unwrap_or(Err(StashError::DeadlineExpired)),
            None => source.fetch_page(cursor).await,
        }
    }

    async fn pause_between_pages(&self) {
        if self.options.page_delay.is_zero() {
            return;
        }
        let sleep = tokio::time::sleep(self.options.page_delay);
        match self.options.deadline {
            Some(deadline) => {
                let _ = tokio::time::timeout_at(deadline, sleep).await;
            }
            None => sleep.await,
        }
    }
}
