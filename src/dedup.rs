//! Idempotent download decisions.
//!
//! The index is built once per run from two sources that were produced by
//! different code paths with different formatting: folder/file names scanned
//! off the video directory, and lines of the persisted processed log. Both
//! are funneled through the same [`normalization_key`] rule as live-scraped
//! identities, so a name like `Phish 2023-09-03 MSG` on disk blocks a fresh
//! scrape of `Phish 2023-09-03 Madison Square Garden, New York, NY`.

use crate::identity::normalization_key;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A read-only set of normalization keys for already-processed events.
#[derive(Debug, Default, Clone)]
pub struct DedupIndex {
    keys: HashSet<String>,
}

impl DedupIndex {
    /// Build the index from any mix of disk names and log lines.
    ///
    /// Names that fail key extraction are excluded — they can never match,
    /// and never block a real duplicate check — rather than raising.
    pub fn build<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys = HashSet::new();
        for name in names {
            match normalization_key(name.as_ref().trim()) {
                Some(key) => {
                    keys.insert(key);
                }
                None => {
                    log::debug!(
                        "no artist/date key in {:?}, excluded from dedup index",
                        name.as_ref()
                    );
                }
            }
        }
        log::debug!("dedup index built with {} keys", keys.len());
        DedupIndex { keys }
    }

    /// Whether a display string refers to an already-processed event.
    ///
    /// The query is normalized through the same key rule before the
    /// membership test. A query with no extractable key is treated as
    /// never-seen.
    pub fn contains(&self, display_text: &str) -> bool {
        match normalization_key(display_text.trim()) {
            Some(key) => self.keys.contains(&key),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in the index, sorted for display.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keys.iter().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Entry names (files and folders) in the video directory. A missing
/// directory is not an error: it just means nothing was archived yet.
pub fn scan_directory(path: &Path) -> Vec<String> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot scan {}: {e}", path.display());
            return Vec::new();
        }
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect()
}

/// Non-empty lines of the processed log. A missing file means no history.
pub fn read_log_lines(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(contents) => contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            log::warn!("cannot read processed log {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Append-only record of successfully downloaded names.
///
/// One display-name per line, appended only after a download fully
/// completes. A crash mid-download leaves no entry, which is the designed
/// recovery signal: the next run re-attempts the item.
#[derive(Debug, Clone)]
pub struct ProcessedLog {
    path: std::path::PathBuf,
}

impl ProcessedLog {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        ProcessedLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, name: &str) -> crate::Result<()> {
        use std::io::Write;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{name}")?;
        Ok(())
    }
}
