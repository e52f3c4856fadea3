use crate::login::{extract_cookies_from_response, LoginManager};
use crate::session::NugsSession;
use crate::{ArchiveError, Result};
use http_client::{HttpClient, Request};
use http_types::{Method, Url};
use std::sync::Arc;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// Base URL of the streaming app.
pub const DEFAULT_BASE_URL: &str = "https://play.nugs.net";

/// Authenticated HTTP client for nugs.net pages.
///
/// All fetching goes through here; the extraction modules never touch the
/// network. Cookies are threaded manually on every request, the way the
/// session was captured at login.
pub struct NugsClient {
    client: Arc<dyn HttpClient + Send + Sync>,
    session: NugsSession,
}

impl NugsClient {
    /// Create a client from a previously persisted session.
    pub fn from_session(client: Box<dyn HttpClient + Send + Sync>, session: NugsSession) -> Self {
        Self {
            client: Arc::from(client),
            session,
        }
    }

    /// Log in with credentials and return a ready client.
    pub async fn login_with_credentials(
        client: Box<dyn HttpClient + Send + Sync>,
        email: &str,
        password: &str,
    ) -> Result<Self> {
        let client: Arc<dyn HttpClient + Send + Sync> = Arc::from(client);
        let login = LoginManager::new(client.clone(), DEFAULT_BASE_URL.to_string());
        let session = login.login(email, password).await?;
        Ok(Self { client, session })
    }

    pub fn session(&self) -> &NugsSession {
        &self.session
    }

    /// Fetch a page and return its HTML source.
    ///
    /// Non-2xx statuses are errors: a page we cannot read is a page we
    /// cannot extract from.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        let mut response = self.get(url).await?;
        let status: u16 = response.status().into();
        if !(200..300).contains(&status) {
            return Err(ArchiveError::Http(format!("GET {url} returned {status}")));
        }
        response
            .body_string()
            .await
            .map_err(|e| ArchiveError::Http(e.to_string()))
    }

    /// Fetch raw bytes, used for best-effort cover image downloads.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self.get(url).await?;
        let status: u16 = response.status().into();
        if !(200..300).contains(&status) {
            return Err(ArchiveError::Http(format!("GET {url} returned {status}")));
        }
        response
            .body_bytes()
            .await
            .map_err(|e| ArchiveError::Http(e.to_string()))
    }

    /// Cheap liveness probe for a restored session: can we still reach an
    /// authenticated page without being bounced to the login screen?
    pub async fn validate_session(&self) -> bool {
        match self.get(&self.session.base_url).await {
            Ok(response) => {
                let status: u16 = response.status().into();
                let ok = (200..400).contains(&status);
                if !ok {
                    log::debug!("session validation got status {status}");
                }
                ok
            }
            Err(e) => {
                log::debug!("session validation failed: {e}");
                false
            }
        }
    }

    async fn get(&self, url: &str) -> Result<http_types::Response> {
        let parsed = url
            .parse::<Url>()
            .map_err(|e| ArchiveError::Http(format!("invalid URL {url}: {e}")))?;
        let mut request = Request::new(Method::Get, parsed);
        let _ = request.insert_header("User-Agent", USER_AGENT);
        let _ = request.insert_header("Accept", "text/html,application/xhtml+xml,*/*;q=0.8");
        if !self.session.cookies.is_empty() {
            let _ = request.insert_header("Cookie", self.session.cookies.join("; "));
        }

        let response = self
            .client
            .send(request)
            .await
            .map_err(|e| ArchiveError::Http(e.to_string()))?;

        // Keep any refreshed cookies visible in debug logs; the session
        // itself stays immutable for the run.
        let mut refreshed = Vec::new();
        extract_cookies_from_response(&response, &mut refreshed);
        if !refreshed.is_empty() {
            log::debug!("server refreshed {} cookie(s) on {url}", refreshed.len());
        }
        Ok(response)
    }
}
