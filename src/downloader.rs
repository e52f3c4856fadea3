//! External download tool invocation and output placement.
//!
//! The downloader is a separate executable that deposits one media file into
//! a staging directory. We resolve the download URL from the event page URL,
//! run the tool as a blocking subprocess with line-oriented progress
//! reporting, then rename the newest staged file using the canonical
//! identity and move it into the video directory.

use crate::{ArchiveError, Result};
use regex::Regex;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Download-source base for standard releases.
const RELEASE_DOWNLOAD_BASE: &str = "https://play.nugs.net/release/";
/// Download-source base for livestream exclusives.
const EXCLUSIVE_DOWNLOAD_BASE: &str = "https://play.nugs.net/watch/livestreams/exclusive/";

const PROGRESS_PATTERN: &str = r"(\d+)%";

/// Runs the external downloader and places its output.
pub struct DownloadInvoker {
    binary: PathBuf,
}

impl DownloadInvoker {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    /// Download `event_url` into `staging`. The staging directory must exist
    /// and should be empty so output selection is unambiguous.
    pub fn download(&self, event_url: &str, staging: &Path, exclusive: bool) -> Result<()> {
        let url = resolve_download_url(event_url, exclusive)?;
        log::info!("starting downloader for {url}");

        let mut child = Command::new(&self.binary)
            .arg("-o")
            .arg(staging)
            .arg(&url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ArchiveError::Download(format!("cannot start {}: {e}", self.binary.display()))
            })?;

        let progress = Regex::new(PROGRESS_PATTERN).unwrap();
        let mut last_percentage: Option<String> = None;
        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                let line = line?;
                if let Some(captures) = progress.captures(&line) {
                    let percentage = captures[1].to_string();
                    if last_percentage.as_deref() != Some(&percentage) {
                        print!("{percentage}% complete\r");
                        let _ = std::io::stdout().flush();
                        last_percentage = Some(percentage);
                    }
                } else if !line.trim().is_empty() {
                    log::debug!("downloader: {}", line.trim());
                }
            }
        }
        if let Some(stderr) = child.stderr.take() {
            for line in BufReader::new(stderr).lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    log::warn!("downloader: {}", line.trim());
                }
            }
        }

        let status = child.wait()?;
        if last_percentage.is_some() {
            println!();
        }
        if !status.success() {
            return Err(ArchiveError::Download(format!(
                "downloader exited with {status} for {url}"
            )));
        }
        Ok(())
    }

    /// Pick the newest file out of `staging`, rename it to
    /// `"{display_text} {suffix}"` where the suffix is the trailing
    /// underscore-delimited segment of the original filename (typically a
    /// resolution tag like `1080p.mkv`), and move it into `video_directory`.
    ///
    /// Returns the final file name for the processed log.
    pub fn place_output(
        &self,
        staging: &Path,
        display_text: &str,
        video_directory: &Path,
    ) -> Result<String> {
        let newest = newest_file(staging)?.ok_or_else(|| {
            ArchiveError::Download(format!("no output file in {}", staging.display()))
        })?;

        let original_name = newest
            .file_name()
            .map(|n| n.to_string_lossy().replace(':', "_"))
            .unwrap_or_default();
        let final_name = match original_name.rfind('_') {
            Some(index) => format!("{display_text} {}", &original_name[index + 1..]),
            None => format!("{display_text} {original_name}"),
        };

        fs::create_dir_all(video_directory)?;
        let destination = video_directory.join(&final_name);
        move_file(&newest, &destination)?;
        log::info!("{original_name} renamed and moved to {}", destination.display());
        Ok(final_name)
    }
}

/// Translate an event page URL into the downloader's URL for that item. The
/// trailing path segment must be an all-digit release id.
pub fn resolve_download_url(event_url: &str, exclusive: bool) -> Result<String> {
    let id = event_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(|| {
            ArchiveError::Download(format!("no release id in event URL {event_url}"))
        })?;
    let base = if exclusive {
        EXCLUSIVE_DOWNLOAD_BASE
    } else {
        RELEASE_DOWNLOAD_BASE
    };
    Ok(format!("{base}{id}"))
}

fn newest_file(dir: &Path) -> Result<Option<PathBuf>> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let metadata = entry.metadata()?;
        let modified = metadata.modified()?;
        if newest.as_ref().map(|(t, _)| modified > *t).unwrap_or(true) {
            newest = Some((modified, entry.path()));
        }
    }
    Ok(newest.map(|(_, path)| path))
}

/// Rename, falling back to copy-and-remove when the destination is on a
/// different filesystem (network video directories usually are).
fn move_file(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)?;
            Ok(())
        }
    }
}
