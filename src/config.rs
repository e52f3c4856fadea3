//! TOML configuration loading.
//!
//! Configuration failures are the only fatal errors in the system: without
//! credentials and directories nothing can run, so `Config::load` returns
//! [`ArchiveError::Config`] and the binary exits before any scraping starts.

use crate::{ArchiveError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Account credentials for nugs.net.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Configured directory locations, typically network shares. Each falls back
/// to a local directory next to the working directory when the configured
/// path does not exist (a disconnected share should not kill the run).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paths {
    /// Per-event metadata folders (`{name}.html`, `{name}.jpg`, `info.txt`).
    #[serde(default)]
    pub data_directory: Option<PathBuf>,
    /// Final resting place for renamed video files.
    #[serde(default)]
    pub video_directory: Option<PathBuf>,
}

/// Settings for the external download tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Downloader {
    /// Path to the downloader executable.
    pub binary: PathBuf,
    /// Path to the downloader's own JSON config file. Credentials and the
    /// passthrough settings below are written into it before each run.
    #[serde(default)]
    pub config_json: Option<PathBuf>,
    #[serde(default)]
    pub format: Option<u32>,
    #[serde(default)]
    pub video_format: Option<u32>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub use_ffmpeg_env_var: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub credentials: Credentials,
    #[serde(default)]
    pub paths: Paths,
    pub downloader: Downloader,
}

/// Resolved directories after fallback handling, always usable.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub data_directory: PathBuf,
    pub video_directory: PathBuf,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            ArchiveError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        toml::from_str(&raw).map_err(|e| {
            ArchiveError::Config(format!("cannot parse config {}: {e}", path.display()))
        })
    }

    /// Resolve directories: keep a configured path if it already exists,
    /// otherwise create and use a local directory of the same role.
    pub fn resolve_paths(&self) -> Result<ResolvedPaths> {
        let cwd = std::env::current_dir()?;
        Ok(ResolvedPaths {
            data_directory: resolve_one(
                self.paths.data_directory.as_deref(),
                cwd.join("data_directory"),
            )?,
            video_directory: resolve_one(
                self.paths.video_directory.as_deref(),
                cwd.join("video_directory"),
            )?,
        })
    }

    /// Push credentials and passthrough settings into the downloader's own
    /// `config.json`, preserving any keys we don't manage.
    pub fn update_downloader_config(&self) -> Result<()> {
        let Some(path) = &self.downloader.config_json else {
            log::debug!("no downloader config_json configured, skipping update");
            return Ok(());
        };
        if !path.exists() {
            log::warn!("downloader config not found: {}", path.display());
            return Ok(());
        }

        let raw = fs::read_to_string(path)?;
        let mut json: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            ArchiveError::Config(format!("invalid downloader config {}: {e}", path.display()))
        })?;
        let map = json.as_object_mut().ok_or_else(|| {
            ArchiveError::Config(format!("downloader config {} is not an object", path.display()))
        })?;

        map.insert("email".into(), self.credentials.email.clone().into());
        map.insert("password".into(), self.credentials.password.clone().into());
        if let Some(format) = self.downloader.format {
            map.insert("format".into(), format.into());
        }
        if let Some(video_format) = self.downloader.video_format {
            map.insert("videoFormat".into(), video_format.into());
        }
        if let Some(token) = &self.downloader.token {
            map.insert("token".into(), token.clone().into());
        }
        if let Some(use_ffmpeg) = self.downloader.use_ffmpeg_env_var {
            map.insert("useFfmpegEnvVar".into(), use_ffmpeg.into());
        }

        let pretty = serde_json::to_string_pretty(&json)
            .map_err(|e| ArchiveError::Config(format!("cannot serialize downloader config: {e}")))?;
        fs::write(path, pretty)?;
        log::debug!("downloader config updated at {}", path.display());
        Ok(())
    }
}

fn resolve_one(configured: Option<&Path>, local: PathBuf) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        log::warn!(
            "configured path {} not reachable, using {}",
            path.display(),
            local.display()
        );
    }
    fs::create_dir_all(&local)?;
    Ok(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [credentials]
        email = "fan@example.com"
        password = "hunter2"

        [paths]
        video_directory = "/mnt/media/concerts"

        [downloader]
        binary = "binaries/nugs-downloader"
        format = 4
        video_format = 5
    "#;

    #[test]
    fn sample_config_parses() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.credentials.email, "fan@example.com");
        assert_eq!(
            config.paths.video_directory.as_deref(),
            Some(Path::new("/mnt/media/concerts"))
        );
        assert!(config.paths.data_directory.is_none());
        assert_eq!(config.downloader.format, Some(4));
        assert_eq!(config.downloader.video_format, Some(5));
        assert!(config.downloader.config_json.is_none());
    }

    #[test]
    fn missing_credentials_fail_to_parse() {
        let result: std::result::Result<Config, _> =
            toml::from_str("[downloader]\nbinary = \"dl\"");
        assert!(result.is_err());
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let err = Config::load(Path::new("/nonexistent/nugs-archive.toml")).unwrap_err();
        assert!(matches!(err, ArchiveError::Config(_)));
    }

    #[test]
    fn downloader_config_update_preserves_unknown_keys() {
        let dir = std::env::temp_dir().join(format!("nugs-archive-cfg-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let json_path = dir.join("config.json");
        fs::write(
            &json_path,
            r#"{"email": "old", "outPath": "out", "wvKeyFile": "device.wvd"}"#,
        )
        .unwrap();

        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.downloader.config_json = Some(json_path.clone());
        config.update_downloader_config().unwrap();

        let updated: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(updated["email"], "fan@example.com");
        assert_eq!(updated["password"], "hunter2");
        assert_eq!(updated["format"], 4);
        assert_eq!(updated["videoFormat"], 5);
        // Keys we don't manage stay untouched.
        assert_eq!(updated["outPath"], "out");
        assert_eq!(updated["wvKeyFile"], "device.wvd");

        fs::remove_dir_all(&dir).unwrap();
    }
}
