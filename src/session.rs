use crate::{ArchiveError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Serializable session state that can be persisted and restored.
///
/// This carries everything needed to resume an authenticated nugs.net
/// session without logging in again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NugsSession {
    /// The authenticated account email.
    pub email: String,
    /// Session cookies required for authenticated requests.
    pub cookies: Vec<String>,
    /// Antiforgery token scraped from the login form.
    pub verification_token: Option<String>,
    /// Base URL of the streaming app.
    pub base_url: String,
}

impl NugsSession {
    pub fn new(
        email: String,
        cookies: Vec<String>,
        verification_token: Option<String>,
        base_url: String,
    ) -> Self {
        Self {
            email,
            cookies,
            verification_token,
            base_url,
        }
    }

    /// Basic validity check; doesn't guarantee the session is still active
    /// on the server.
    pub fn is_valid(&self) -> bool {
        !self.email.is_empty()
            && self
                .cookies
                .iter()
                .any(|cookie| cookie.starts_with(".AspNetCore.") || cookie.contains("session"))
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Session persistence in XDG data directories.
///
/// Sessions are stored per-account as
/// `~/.local/share/nugs-archive/users/{email}/session.json`.
pub struct SessionPersistence;

impl SessionPersistence {
    pub fn session_path(email: &str) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| ArchiveError::Config("cannot determine XDG data directory".into()))?;
        Ok(data_dir
            .join("nugs-archive")
            .join("users")
            .join(email)
            .join("session.json"))
    }

    pub fn save(session: &NugsSession) -> Result<()> {
        let path = Self::session_path(&session.email)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = session
            .to_json()
            .map_err(|e| ArchiveError::Config(format!("failed to serialize session: {e}")))?;
        fs::write(&path, json)?;
        log::debug!("session saved to {}", path.display());
        Ok(())
    }

    pub fn load(email: &str) -> Result<NugsSession> {
        let path = Self::session_path(email)?;
        if !path.exists() {
            return Err(ArchiveError::Auth(format!(
                "no saved session for {email}"
            )));
        }
        let json = fs::read_to_string(&path)?;
        let session = NugsSession::from_json(&json)
            .map_err(|e| ArchiveError::Auth(format!("failed to parse session JSON: {e}")))?;
        log::debug!("session loaded from {}", path.display());
        Ok(session)
    }

    pub fn exists(email: &str) -> bool {
        Self::session_path(email).map(|p| p.exists()).unwrap_or(false)
    }

    pub fn remove(email: &str) -> Result<()> {
        let path = Self::session_path(email)?;
        if path.exists() {
            fs::remove_file(&path)?;
            log::debug!("session removed from {}", path.display());
        }
        Ok(())
    }
}
