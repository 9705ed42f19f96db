//! Cursor-driven collection over paginated platform feeds.

mod cache;
mod collector;

pub use cache::PostCache;
pub use collector::{CollectOptions, Collector, FeedSource};
