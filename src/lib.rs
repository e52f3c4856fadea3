pub mod archive;
pub mod client;
pub mod config;
pub mod dates;
pub mod dedup;
pub mod downloader;
mod error;
pub mod extract;
pub mod identity;
pub mod login;
pub mod sanitize;
pub mod session;
pub mod setlist;

pub use archive::{Archiver, PROCESSED_LOG_FILE};
pub use client::{NugsClient, DEFAULT_BASE_URL};
pub use config::{Config, ResolvedPaths};
pub use dates::{normalize_date, EventDate};
pub use dedup::{DedupIndex, ProcessedLog};
pub use downloader::DownloadInvoker;
pub use error::ArchiveError;
pub use extract::{CatalogCard, EventRecord, NugsParser, PageKind};
pub use identity::{build_identity, normalization_key, CanonicalIdentity};
pub use login::LoginManager;
pub use sanitize::sanitize;
pub use session::{NugsSession, SessionPersistence};
pub use setlist::{parse_setlist, Setlist};

// Re-export scraper types for testing
pub use scraper::Html;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ArchiveError>;
