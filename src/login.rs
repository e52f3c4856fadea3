use crate::session::NugsSession;
use crate::{ArchiveError, Result};
use http_client::{HttpClient, Request};
use http_types::{Method, Url};
use scraper::{Html, Selector};
use std::sync::Arc;

/// Identity-server endpoint the platform authenticates against.
pub const LOGIN_URL: &str = "https://id.nugs.net/account/login";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// Login functionality separated from the main client.
pub struct LoginManager {
    client: Arc<dyn HttpClient + Send + Sync>,
    base_url: String,
}

impl LoginManager {
    pub fn new(client: Arc<dyn HttpClient + Send + Sync>, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Authenticate with nugs.net using account email and password.
    ///
    /// This method:
    /// 1. Fetches the login page to extract the antiforgery token
    /// 2. Submits the credential form with any cookies already issued
    /// 3. Validates that a session cookie came back
    ///
    /// Returns a [`NugsSession`] on success, [`ArchiveError::Auth`] on
    /// failure. Authentication failure is fatal to a run: nothing can be
    /// scraped without a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<NugsSession> {
        let mut response = self.get(LOGIN_URL).await?;

        let mut cookies = Vec::new();
        extract_cookies_from_response(&response, &mut cookies);

        let html = response
            .body_string()
            .await
            .map_err(|e| ArchiveError::Http(e.to_string()))?;
        let token = extract_verification_token(&html)?;

        let form_string = [
            ("Input.Email", email),
            ("Input.Password", password),
            ("__RequestVerificationToken", token.as_str()),
        ]
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

        let url = LOGIN_URL
            .parse::<Url>()
            .map_err(|e| ArchiveError::Http(e.to_string()))?;
        let mut request = Request::new(Method::Post, url);
        let _ = request.insert_header("User-Agent", USER_AGENT);
        let _ = request.insert_header("Referer", LOGIN_URL);
        let _ = request.insert_header("Origin", "https://id.nugs.net");
        let _ = request.insert_header("Content-Type", "application/x-www-form-urlencoded");
        if !cookies.is_empty() {
            let _ = request.insert_header("Cookie", cookies.join("; "));
        }
        request.set_body(form_string);

        let mut response = self
            .client
            .send(request)
            .await
            .map_err(|e| ArchiveError::Http(e.to_string()))?;
        extract_cookies_from_response(&response, &mut cookies);

        log::debug!("login response status: {}", response.status());

        let has_session_cookie = cookies
            .iter()
            .any(|cookie| cookie.starts_with(".AspNetCore."));

        if has_session_cookie && (response.status() == 302 || response.status() == 200) {
            log::debug!("login successful, session established");
            return Ok(NugsSession::new(
                email.to_string(),
                cookies,
                Some(token),
                self.base_url.clone(),
            ));
        }

        let body = response
            .body_string()
            .await
            .map_err(|e| ArchiveError::Http(e.to_string()))?;
        Err(ArchiveError::Auth(parse_login_error(&body)))
    }

    async fn get(&self, url: &str) -> Result<http_types::Response> {
        let url = url
            .parse::<Url>()
            .map_err(|e| ArchiveError::Http(e.to_string()))?;
        let mut request = Request::new(Method::Get, url);
        let _ = request.insert_header("User-Agent", USER_AGENT);
        self.client
            .send(request)
            .await
            .map_err(|e| ArchiveError::Http(e.to_string()))
    }
}

/// Extract the ASP.NET antiforgery token from the login form.
fn extract_verification_token(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"input[name="__RequestVerificationToken"]"#).unwrap();
    document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string)
        .ok_or_else(|| ArchiveError::Auth("verification token not found on login page".into()))
}

/// Scrape error text out of a failed login response.
fn parse_login_error(html: &str) -> String {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse(".validation-summary-errors, .alert-danger, .field-validation-error")
            .unwrap();

    let mut messages = Vec::new();
    for error in document.select(&selector) {
        let text = error.text().collect::<String>().trim().to_string();
        if !text.is_empty() {
            messages.push(text);
        }
    }

    if messages.is_empty() {
        "login failed - please check your credentials".to_string()
    } else {
        format!("login failed: {}", messages.join("; "))
    }
}

/// Merge `set-cookie` headers into the running cookie jar, newest value per
/// name winning.
pub fn extract_cookies_from_response(response: &http_types::Response, cookies: &mut Vec<String>) {
    if let Some(cookie_headers) = response.header("set-cookie") {
        for header in cookie_headers {
            if let Some(cookie_value) = header.as_str().split(';').next() {
                let name = cookie_value.split('=').next().unwrap_or("");
                cookies.retain(|existing| !existing.starts_with(&format!("{name}=")));
                cookies.push(cookie_value.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_token_is_extracted_from_form() {
        let html = r#"<form action="/account/login">
            <input name="Input.Email" />
            <input name="__RequestVerificationToken" type="hidden" value="CfDJ8token" />
        </form>"#;
        assert_eq!(extract_verification_token(html).unwrap(), "CfDJ8token");
    }

    #[test]
    fn missing_token_is_an_auth_error() {
        let err = extract_verification_token("<html><body></body></html>").unwrap_err();
        assert!(matches!(err, ArchiveError::Auth(_)));
    }

    #[test]
    fn login_errors_are_scraped_from_validation_summary() {
        let html = r#"<div class="validation-summary-errors"><ul>
            <li>Invalid login attempt.</li></ul></div>"#;
        assert_eq!(
            parse_login_error(html),
            "login failed: Invalid login attempt."
        );
        assert_eq!(
            parse_login_error("<html></html>"),
            "login failed - please check your credentials"
        );
    }
}
