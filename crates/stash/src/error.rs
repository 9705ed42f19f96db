//! Error types for the stash pipeline.

use thiserror::Error;

use crate::types::Platform;

/// Errors surfaced to callers of the stash library.
///
/// Only `Unauthenticated` (and the pre-flight credential/browser variants)
/// represent actionable failures. Transport errors mid-collection never
/// reach callers; the collector logs them and returns partial results.
#[derive(Debug, Error)]
pub enum StashError {
    /// The platform redirected to a login page - credentials are invalid or expired.
    #[error("{platform} session is not authenticated (redirected to {redirect_url})")]
    Unauthenticated {
        /// Platform whose session was rejected.
        platform: Platform,
        /// URL the browser landed on after navigation.
        redirect_url: String,
    },

    /// Browser automation failed before any capture could happen.
    #[error("browser error: {0}")]
    Browser(String),

    /// Missing or malformed credential input.
    #[error("credential error: {0}")]
    Credentials(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The caller-supplied collection deadline expired.
    #[error("collection deadline expired")]
    DeadlineExpired,
}

impl StashError {
    /// Whether re-authentication would resolve this error.
    #[must_use]
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated { .. })
    }
}

/// Convenience alias for stash results.
pub type Result<T> = std::result::Result<T, StashError>;
