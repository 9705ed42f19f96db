//! Reddit saved-items platform support.

mod feed;
mod parser;

pub use feed::RedditFeed;
pub use parser::{normalize_item, ItemFilter, RedditItem};

/// Domains Reddit session cookies may come from.
pub const COOKIE_DOMAINS: &[&str] = &[".reddit.com", "reddit.com"];

/// Domain cookies are normalized to.
pub const TARGET_DOMAIN: &str = ".reddit.com";

/// Base URL of the public listing API.
pub const BASE_URL: &str = "https://www.reddit.com";
