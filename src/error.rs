use thiserror::Error;

/// Error types for nugs.net archive operations.
///
/// This enum covers the failures that can occur while authenticating,
/// fetching pages, extracting metadata, and driving the external downloader.
///
/// Parse *degradation* (a missing artist heading, an unmatched date grammar)
/// is deliberately not represented here: the extraction pipeline substitutes
/// sentinels ("Unknown Artist", [`EventDate::Invalid`](crate::EventDate)) and
/// keeps going. `ArchiveError::Parse` is reserved for documents malformed
/// beyond recognition.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// HTTP/network related errors.
    ///
    /// This includes connection failures, timeouts, DNS errors, and other
    /// low-level networking issues.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication failures.
    ///
    /// This occurs when login credentials are invalid, sessions expire,
    /// or authentication is required but not provided.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Failed to parse a page beyond recognition.
    ///
    /// This can happen when the platform changes its HTML structure or
    /// returns unexpected data formats.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Configuration could not be loaded or is unusable.
    ///
    /// Unlike every other variant, this is fatal at startup: no scraping
    /// begins without a valid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The external downloader failed or produced no output file.
    ///
    /// Items that hit this error are not recorded in the processed log, so
    /// they are retried on the next run.
    #[error("Download failed: {0}")]
    Download(String),

    /// File system I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
