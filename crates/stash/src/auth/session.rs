//! Captured session headers for direct API calls.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Default User-Agent for synthesized fallback headers.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Headers that must not be replayed on a different connection.
const STRIPPED_HEADERS: &[&str] = &["host", "content-length", "connection", "accept-encoding"];

/// Header set captured from a live browser request, sufficient to issue
/// authenticated direct HTTP calls.
///
/// Ephemeral and bearer-equivalent: lives for one collection run, is never
/// persisted, and redacts values in debug output.
#[derive(Clone)]
pub struct CapturedSession {
    headers: Vec<(String, String)>,
}

impl CapturedSession {
    /// Build a session from captured request headers.
    ///
    /// Header names are lowercased; hop-by-hop and CDP pseudo-headers
    /// (`:authority` etc.) are stripped.
    #[must_use]
    pub fn new(headers: impl IntoIterator<Item = (String, String)>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_lowercase(), value))
            .filter(|(name, _)| !name.starts_with(':') && !STRIPPED_HEADERS.contains(&name.as_str()))
            .collect();
        Self { headers }
    }

    /// Minimal synthesized header set used when no request was captured.
    #[must_use]
    pub fn fallback(user_agent: &str) -> Self {
        Self::new([
            ("user-agent".to_string(), user_agent.to_string()),
            ("accept".to_string(), "application/json".to_string()),
            ("accept-language".to_string(), "en-US,en;q=0.5".to_string()),
        ])
    }

    /// Session backed by a bearer token instead of captured headers.
    #[must_use]
    pub fn from_bearer(token: &str) -> Self {
        Self::new([
            ("user-agent".to_string(), DEFAULT_USER_AGENT.to_string()),
            ("authorization".to_string(), format!("Bearer {token}")),
            ("accept".to_string(), "application/json".to_string()),
        ])
    }

    /// Set or replace the `cookie` header.
    ///
    /// CDP request events do not reliably include cookies, so the header is
    /// synthesized from the credential store after capture.
    #[must_use]
    pub fn with_cookie_header(mut self, cookie: Option<String>) -> Self {
        if let Some(cookie) = cookie {
            self.headers.retain(|(name, _)| name != "cookie");
            self.headers.push(("cookie".to_string(), cookie));
        }
        self
    }

    /// Captured header pairs.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Build a [`HeaderMap`] for a reqwest client, skipping unrepresentable
    /// names or values.
    #[must_use]
    pub fn header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
                tracing::debug!(header = %name, "Skipping unrepresentable header name");
                continue;
            };
            let Ok(value) = HeaderValue::from_str(value) else {
                tracing::debug!(header = %name, "Skipping unrepresentable header value");
                continue;
            };
            map.insert(name, value);
        }
        map
    }
}

impl std::fmt::Debug for CapturedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.headers.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("CapturedSession")
            .field("headers", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_hop_by_hop_and_pseudo_headers() {
        let session = CapturedSession::new([
            ("Host".to_string(), "x.com".to_string()),
            (":authority".to_string(), "x.com".to_string()),
            ("Content-Length".to_string(), "0".to_string()),
            ("Accept-Encoding".to_string(), "br".to_string()),
        ]);
        assert!(session.headers().is_empty());
    }

    #[test]
    fn lowercases_and_keeps_auth_headers() {
        let session = CapturedSession::new([
            ("Authorization".to_string(), "Bearer t".to_string()),
            ("X-Csrf-Token".to_string(), "c".to_string()),
            ("Host".to_string(), "x.com".to_string()),
        ]);
        let names: Vec<_> = session.headers().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["authorization", "x-csrf-token"]);
    }

    #[test]
    fn fallback_has_user_agent_and_accept() {
        let session = CapturedSession::fallback(DEFAULT_USER_AGENT);
        let map = session.header_map();
        assert_eq!(map.get("user-agent").unwrap(), DEFAULT_USER_AGENT);
        assert_eq!(map.get("accept").unwrap(), "application/json");
    }

    #[test]
    fn cookie_header_replaces_captured_cookie() {
        let session = CapturedSession::new([("cookie".to_string(), "stale=1".to_string())])
            .with_cookie_header(Some("fresh=2".to_string()));
        let cookies: Vec<_> = session
            .headers()
            .iter()
            .filter(|(n, _)| n == "cookie")
            .collect();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].1, "fresh=2");
    }

    #[test]
    fn debug_output_hides_values() {
        let session = CapturedSession::new([(
            "authorization".to_string(),
            "Bearer secret-token".to_string(),
        )]);
        let debug = format!("{session:?}");
        assert!(debug.contains("authorization"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn bearer_session_sets_authorization() {
        let map = CapturedSession::from_bearer("tok").header_map();
        assert_eq!(map.get("authorization").unwrap(), "Bearer tok");
    }
}
