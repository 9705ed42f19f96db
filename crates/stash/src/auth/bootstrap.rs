//! Browser-driven session capture using chromiumoxide.
//!
//! Loads an authenticated platform page in a headless browser, watches the
//! outgoing network traffic, and freezes the header set of the first request
//! that matches the target API call. Those headers are then replayed through
//! a plain HTTP client, without the browser.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, EventRequestWillBeSent};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::auth::session::DEFAULT_USER_AGENT;
use crate::auth::{CapturedSession, CredentialStore};
use crate::error::{Result, StashError};
use crate::types::Platform;

/// Markers in a post-navigation URL that indicate a login redirect.
const LOGIN_MARKERS: &[&str] = &["login", "register", "flow"];

/// Interval between checks for a captured request.
const CAPTURE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default hard timeout for navigation and header capture.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// What to load and which outgoing request to capture.
#[derive(Debug, Clone)]
pub struct BootstrapTarget {
    /// Platform the target belongs to.
    pub platform: Platform,
    /// Page whose load triggers the API call of interest.
    pub url: String,
    /// Substrings that must all appear in a request URL for it to be captured.
    pub request_markers: Vec<String>,
    /// Domain the session cookies are scoped to (e.g. `.x.com`).
    pub cookie_domain: String,
}

/// Drives a headless browser to capture authenticated request headers.
///
/// The browser handle has an explicit open/close lifecycle and may be reused
/// across bootstrap calls within one process. Pages opened for a capture are
/// closed on every exit path.
pub struct SessionBootstrapper {
    credentials: CredentialStore,
    headless: bool,
    timeout: Duration,
    browser: Option<(Browser, JoinHandle<()>)>,
}

impl SessionBootstrapper {
    /// Create a bootstrapper over the given credentials.
    #[must_use]
    pub fn new(credentials: CredentialStore, headless: bool) -> Self {
        Self {
            credentials,
            headless,
            timeout: DEFAULT_TIMEOUT,
            browser: None,
        }
    }

    /// Override the navigation/capture timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Capture a session for the given target.
    ///
    /// Bearer-token credentials skip the browser entirely. Cookie credentials
    /// drive a page load; if no matching request is observed within the
    /// timeout, a minimal synthesized header set is returned instead (soft
    /// fallback). A login redirect is a definitive
    /// [`StashError::Unauthenticated`].
    pub async fn bootstrap(&mut self, target: &BootstrapTarget) -> Result<CapturedSession> {
        if let CredentialStore::Bearer(token) = &self.credentials {
            tracing::debug!(platform = %target.platform, "Using bearer token, skipping browser");
            return Ok(CapturedSession::from_bearer(token));
        }

        let page = self.open_page(target).await?;

        // Capture on a separate path so the page is closed on every exit.
        let outcome = self.capture_on_page(&page, target).await;
        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "Failed to close capture page");
        }

        let session = outcome?;
        Ok(session.with_cookie_header(self.credentials.cookie_header()))
    }

    /// Close the browser and its handler task. Idempotent.
    pub async fn close(&mut self) {
        if let Some((mut browser, handle)) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::debug!(error = %e, "Failed to close browser");
            }
            let _ = handle.await;
        }
    }

    /// Launch the browser if needed and return a page with cookies applied.
    async fn open_page(&mut self, target: &BootstrapTarget) -> Result<Page> {
        if self.browser.is_none() {
            self.browser = Some(self.launch().await?);
        }
        let (browser, _) = self
            .browser
            .as_ref()
            .ok_or_else(|| StashError::Browser("browser unavailable after launch".to_string()))?;

        // Establish domain context before setting cookies.
        let origin = format!("https://{}", target.cookie_domain.trim_start_matches('.'));
        tracing::debug!(%origin, "Opening page to set session cookies");
        let page = browser
            .new_page(origin.as_str())
            .await
            .map_err(|e| StashError::Browser(format!("failed to open page: {e}")))?;

        for cookie in self.credentials.cookies() {
            let domain = if cookie.domain.is_empty() {
                target.cookie_domain.as_str()
            } else {
                cookie.domain.as_str()
            };
            let param = CookieParam::builder()
                .name(&cookie.name)
                .value(&cookie.value)
                .domain(domain)
                .path(&cookie.path)
                .secure(cookie.secure)
                .http_only(cookie.http_only)
                .build()
                .map_err(|e| StashError::Browser(format!("failed to build cookie: {e}")))?;
            page.set_cookie(param)
                .await
                .map_err(|e| StashError::Browser(format!("failed to set cookie: {e}")))?;
        }

        Ok(page)
    }

    async fn launch(&self) -> Result<(Browser, JoinHandle<()>)> {
        tracing::info!(headless = self.headless, "Launching browser");

        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox") // Required for containerized environments
            .arg("--disable-dev-shm-usage"); // Avoid /dev/shm size issues in containers
        if !self.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| StashError::Browser(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| StashError::Browser(format!("failed to launch browser: {e}")))?;

        // Spawn handler task
        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok((browser, handle))
    }

    /// Navigate, watch traffic, and build the captured session.
    async fn capture_on_page(
        &self,
        page: &Page,
        target: &BootstrapTarget,
    ) -> Result<CapturedSession> {
        let captured: Arc<Mutex<Option<HashMap<String, String>>>> = Arc::new(Mutex::new(None));

        let mut events = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(|e| StashError::Browser(format!("failed to install request observer: {e}")))?;

        let slot = Arc::clone(&captured);
        let markers = target.request_markers.clone();
        let observer = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if !matches_markers(&event.request.url, &markers) {
                    continue;
                }
                let mut slot = slot.lock().expect("capture slot poisoned");
                // First match wins; later matching requests are ignored.
                if slot.is_none() {
                    *slot = Some(cdp_headers(&event.request.headers));
                    tracing::info!(url = %event.request.url, "Captured request headers");
                }
            }
        });

        tracing::info!(url = %target.url, "Navigating to capture page");
        let navigation = tokio::time::timeout(self.timeout, page.goto(target.url.as_str())).await;
        match navigation {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                observer.abort();
                return Err(StashError::Browser(format!("navigation failed: {e}")));
            }
            Err(_) => {
                observer.abort();
                return Err(StashError::Browser(format!(
                    "navigation to {} timed out",
                    target.url
                )));
            }
        }

        // A login redirect means the cookies are invalid; collection must not
        // proceed pretending to be authenticated.
        let landed = page
            .url()
            .await
            .map_err(|e| StashError::Browser(format!("failed to read page URL: {e}")))?
            .unwrap_or_default();
        if is_login_redirect(&landed) {
            observer.abort();
            tracing::error!(url = %landed, "Redirected to login - cookies are invalid or expired");
            return Err(StashError::Unauthenticated {
                platform: target.platform,
                redirect_url: landed,
            });
        }

        // Bounded wait for the page to fire the API call of interest.
        let mut waited = Duration::ZERO;
        while waited < self.timeout {
            if captured.lock().expect("capture slot poisoned").is_some() {
                break;
            }
            tokio::time::sleep(CAPTURE_POLL_INTERVAL).await;
            waited += CAPTURE_POLL_INTERVAL;
        }
        observer.abort();

        let headers = captured.lock().expect("capture slot poisoned").take();
        match headers {
            Some(headers) => Ok(CapturedSession::new(headers)),
            None => {
                // Soft fallback: some captured calls are merely helpful.
                tracing::warn!(
                    url = %target.url,
                    "No matching request captured within timeout, using fallback headers"
                );
                Ok(CapturedSession::fallback(DEFAULT_USER_AGENT))
            }
        }
    }
}

/// Whether all markers appear in the request URL.
fn matches_markers(url: &str, markers: &[String]) -> bool {
    !markers.is_empty() && markers.iter().all(|m| url.contains(m.as_str()))
}

/// Whether a post-navigation URL is a login/registration page.
fn is_login_redirect(url: &str) -> bool {
    let url = url.to_lowercase();
    LOGIN_MARKERS.iter().any(|m| url.contains(m))
}

/// Flatten CDP request headers into a string map.
fn cdp_headers(headers: &chromiumoxide::cdp::browser_protocol::network::Headers) -> HashMap<String, String> {
    let mut out = HashMap::new();
    if let Ok(value) = serde_json::to_value(headers) {
        if let Some(object) = value.as_object() {
            for (name, value) in object {
                if let Some(value) = value.as_str() {
                    out.insert(name.clone(), value.to_string());
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_must_all_match() {
        let markers = vec!["graphql".to_string(), "Bookmarks".to_string()];
        assert!(matches_markers(
            "https://x.com/i/api/graphql/abc/Bookmarks?variables=%7B%7D",
            &markers
        ));
        assert!(!matches_markers("https://x.com/i/api/graphql/abc/Home", &markers));
        assert!(!matches_markers("https://x.com/i/Bookmarks.css", &markers));
    }

    #[test]
    fn empty_marker_list_never_matches() {
        assert!(!matches_markers("https://x.com/anything", &[]));
    }

    #[test]
    fn login_redirects_are_detected() {
        assert!(is_login_redirect("https://www.reddit.com/login/?dest=..."));
        assert!(is_login_redirect("https://x.com/i/flow/login"));
        assert!(is_login_redirect("https://www.reddit.com/register"));
        assert!(!is_login_redirect("https://x.com/i/bookmarks"));
        assert!(!is_login_redirect(
            "https://www.reddit.com/user/alice/saved.json"
        ));
    }

    #[test]
    fn bootstrap_target_is_cloneable() {
        let target = BootstrapTarget {
            platform: Platform::X,
            url: "https://x.com/i/bookmarks".to_string(),
            request_markers: vec!["Bookmarks".to_string()],
            cookie_domain: ".x.com".to_string(),
        };
        let clone = target.clone();
        assert_eq!(clone.url, target.url);
    }
}
