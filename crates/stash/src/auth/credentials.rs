//! Credential loading and normalization.
//!
//! Accepts browser-exported cookies in three shapes - a JSON array of cookie
//! objects, a simple `{"name": "value"}` JSON object, or Netscape
//! `cookies.txt` - plus an opaque bearer token for the formal API path.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StashError};

/// A single authentication cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Domain the cookie is scoped to.
    #[serde(default)]
    pub domain: String,
    /// Cookie path.
    #[serde(default = "default_path")]
    pub path: String,
    /// Secure flag.
    #[serde(default)]
    pub secure: bool,
    /// HttpOnly flag.
    #[serde(default, alias = "httpOnly")]
    pub http_only: bool,
}

fn default_path() -> String {
    "/".to_string()
}

/// Normalized authentication material ready to attach to outbound requests.
///
/// Pure data holder; performs no network calls of its own.
#[derive(Debug, Clone)]
pub enum CredentialStore {
    /// Browser-exported session cookies.
    Cookies(Vec<Cookie>),
    /// Opaque bearer token (formal API client path).
    Bearer(String),
}

impl CredentialStore {
    /// Wrap a bearer token.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// Load cookies from a file in JSON or Netscape format.
    ///
    /// `accepted_domains` filters Netscape entries; `target_domain` is the
    /// domain cookies are normalized to (e.g. `.x.com`).
    pub fn from_cookie_file(
        path: &Path,
        accepted_domains: &[&str],
        target_domain: &str,
    ) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StashError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_cookie_text(&content, accepted_domains, target_domain)
    }

    /// Parse cookies from raw text in JSON or Netscape format.
    pub fn from_cookie_text(
        content: &str,
        accepted_domains: &[&str],
        target_domain: &str,
    ) -> Result<Self> {
        let cookies = match parse_json_cookies(content, target_domain) {
            Some(cookies) => cookies,
            None => parse_netscape_cookies(content, accepted_domains, target_domain),
        };

        if cookies.is_empty() {
            return Err(StashError::Credentials(
                "no cookies found; export cookies from your browser as JSON or Netscape format"
                    .to_string(),
            ));
        }

        tracing::info!(count = cookies.len(), "Loaded cookies");
        Ok(Self::Cookies(cookies))
    }

    /// Parse cookies from a JSON string (array or key/value object).
    pub fn from_cookie_json(json: &str, target_domain: &str) -> Result<Self> {
        let cookies = parse_json_cookies(json, target_domain).ok_or_else(|| {
            StashError::Credentials("cookie JSON is not an array or object".to_string())
        })?;
        if cookies.is_empty() {
            return Err(StashError::Credentials("cookie JSON is empty".to_string()));
        }
        Ok(Self::Cookies(cookies))
    }

    /// The cookie set, if this store holds cookies.
    #[must_use]
    pub fn cookies(&self) -> &[Cookie] {
        match self {
            Self::Cookies(cookies) => cookies,
            Self::Bearer(_) => &[],
        }
    }

    /// `Cookie` header value for direct HTTP requests, if cookies are held.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        match self {
            Self::Cookies(cookies) if !cookies.is_empty() => Some(
                cookies
                    .iter()
                    .map(|c| format!("{}={}", c.name, c.value))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        }
    }
}

/// Try to parse JSON cookie input. Returns `None` when the content is not
/// JSON at all (the caller then falls back to Netscape parsing).
fn parse_json_cookies(content: &str, target_domain: &str) -> Option<Vec<Cookie>> {
    let value: serde_json::Value = serde_json::from_str(content).ok()?;
    match value {
        serde_json::Value::Array(_) => serde_json::from_value(value).ok(),
        serde_json::Value::Object(map) => Some(
            map.into_iter()
                .filter_map(|(name, v)| {
                    let value = v.as_str()?.to_string();
                    Some(Cookie {
                        name,
                        value,
                        domain: target_domain.to_string(),
                        path: "/".to_string(),
                        secure: false,
                        http_only: false,
                    })
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Parse Netscape `cookies.txt` lines, keeping only accepted domains.
fn parse_netscape_cookies(
    content: &str,
    accepted_domains: &[&str],
    target_domain: &str,
) -> Vec<Cookie> {
    let mut cookies = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 7 {
            continue;
        }

        let domain = parts[0];
        let accepted = accepted_domains
            .iter()
            .any(|d| domain == *d || domain.ends_with(d));
        if !accepted {
            continue;
        }

        // Normalize to the target domain, preserving host-only scoping.
        let cookie_domain = if domain.starts_with('.') {
            target_domain.to_string()
        } else {
            target_domain.trim_start_matches('.').to_string()
        };

        cookies.push(Cookie {
            name: parts[5].to_string(),
            value: parts[6].to_string(),
            domain: cookie_domain,
            path: parts[2].to_string(),
            secure: parts[3].eq_ignore_ascii_case("true"),
            http_only: false,
        });
    }

    cookies
}
