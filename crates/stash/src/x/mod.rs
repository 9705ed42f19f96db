//! X (Twitter) bookmarks platform support.

mod feed;
mod parser;

pub use feed::XFeed;
pub use parser::{extract_bottom_cursor, parse_bookmark_timeline};

/// Domains X session cookies may come from.
pub const COOKIE_DOMAINS: &[&str] = &[".x.com", "x.com", ".twitter.com", "twitter.com"];

/// Domain cookies are normalized to.
pub const TARGET_DOMAIN: &str = ".x.com";

/// Page whose load fires the bookmarks GraphQL call.
pub const BOOKMARKS_URL: &str = "https://x.com/i/bookmarks";
