//! Stash - saved-content collection pipeline.
//!
//! This crate provides:
//! - Browser-bootstrapped session capture (cookies in, authenticated request
//!   headers out) using chromiumoxide
//! - Cursor-driven, deduplicating collection over paginated platform feeds
//! - Normalization of Reddit saved posts/comments and X bookmarks into one
//!   unified post model
//! - Fuzzy multi-term search over the in-memory result set
//!
//! All state is process-lifetime only; nothing is persisted.

pub mod auth;
pub mod collect;
pub mod error;
pub mod pipeline;
pub mod reddit;
pub mod search;
pub mod types;
pub mod x;

// Re-export main types
pub use auth::{BootstrapTarget, CapturedSession, Cookie, CredentialStore, SessionBootstrapper};
pub use collect::{CollectOptions, Collector, FeedSource, PostCache};
pub use error::{Result, StashError};
pub use pipeline::{Pipeline, PipelineConfig, RedditAccount};
pub use search::{filter_posts, matches, SearchOptions};
pub use types::{Author, Media, MediaType, Platform, SavedPost};
