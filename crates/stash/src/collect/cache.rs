//! Process-lifetime cache of collected posts.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::types::{Platform, SavedPost};

/// In-memory, per-platform cache of collected posts.
///
/// Lives for the process lifetime only. Refresh is an explicit caller
/// operation (`store` overwrites, `clear` drops) - there is no time-based
/// invalidation and nothing is ever written to disk.
#[derive(Default)]
pub struct PostCache {
    posts: RwLock<HashMap<Platform, Vec<SavedPost>>>,
}

impl PostCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached posts for a platform, if a collection has been stored.
    pub async fn get(&self, platform: Platform) -> Option<Vec<SavedPost>> {
        self.posts.read().await.get(&platform).cloned()
    }

    /// Store (or overwrite) the collection for a platform.
    pub async fn store(&self, platform: Platform, posts: Vec<SavedPost>) {
        tracing::debug!(%platform, count = posts.len(), "Caching collected posts");
        self.posts.write().await.insert(platform, posts);
    }

    /// Drop the cached collection for a platform.
    pub async fn clear(&self, platform: Platform) {
        self.posts.write().await.remove(&platform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Author;
    use chrono::Utc;

    fn post(id: &str) -> SavedPost {
        SavedPost::new(
            id,
            Platform::X,
            Author::deleted(Platform::X),
            "",
            format!("https://x.com/i/status/{id}"),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn miss_returns_none() {
        let cache = PostCache::new();
        assert!(cache.get(Platform::Reddit).await.is_none());
    }

    #[tokio::test]
    async fn store_and_retrieve() {
        let cache = PostCache::new();
        cache.store(Platform::X, vec![post("1"), post("2")]).await;

        let cached = cache.get(Platform::X).await.unwrap();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].id, "1");
    }

    #[tokio::test]
    async fn platforms_cached_independently() {
        let cache = PostCache::new();
        cache.store(Platform::X, vec![post("x1")]).await;

        assert!(cache.get(Platform::Reddit).await.is_none());
        assert_eq!(cache.get(Platform::X).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn store_overwrites_previous_collection() {
        let cache = PostCache::new();
        cache.store(Platform::X, vec![post("old")]).await;
        cache.store(Platform::X, vec![post("new")]).await;

        let cached = cache.get(Platform::X).await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, "new");
    }

    #[tokio::test]
    async fn clear_drops_the_collection() {
        let cache = PostCache::new();
        cache.store(Platform::X, vec![post("1")]).await;
        cache.clear(Platform::X).await;

        assert!(cache.get(Platform::X).await.is_none());
    }
}
