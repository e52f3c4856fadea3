//! The scrape-extract-dedup-download loop.
//!
//! One [`Archiver`] per run: the dedup index is built once up front from the
//! video directory and the processed log, then the catalog pages are walked
//! sequentially. Every item is wrapped in its own error boundary so one bad
//! page never halts the batch, and the processed log is only appended after
//! a download fully completes, so a crash mid-download is retried next run.

use crate::client::NugsClient;
use crate::config::ResolvedPaths;
use crate::dedup::{read_log_lines, scan_directory, DedupIndex, ProcessedLog};
use crate::downloader::DownloadInvoker;
use crate::extract::{NugsParser, PageKind, BASE_URL};
use crate::identity::build_identity;
use crate::setlist::parse_setlist;
use crate::Result;
use scraper::Html;
use std::fs;
use std::path::PathBuf;

/// File the processed names accumulate in, one per line.
pub const PROCESSED_LOG_FILE: &str = "processed_filenames.txt";

/// Shortcut names accepted in place of full page URLs.
const PAGE_SHORTCUTS: &[(&str, &str)] = &[
    ("watch", "https://play.nugs.net/watch/videos/recent"),
    ("exclusive", "https://play.nugs.net/watch/livestreams/recent"),
];

pub struct Archiver {
    client: NugsClient,
    parser: NugsParser,
    invoker: DownloadInvoker,
    paths: ResolvedPaths,
    index: DedupIndex,
    log: ProcessedLog,
    fallback_year: i32,
    dry_run: bool,
}

impl Archiver {
    /// Build an archiver for one run, loading the dedup index from the video
    /// directory and the processed log.
    pub fn new(
        client: NugsClient,
        invoker: DownloadInvoker,
        paths: ResolvedPaths,
        fallback_year: i32,
        dry_run: bool,
    ) -> Self {
        let log = ProcessedLog::new(paths.data_directory.join(PROCESSED_LOG_FILE));
        let mut names = scan_directory(&paths.video_directory);
        names.extend(read_log_lines(log.path()));
        let index = DedupIndex::build(&names);
        log::info!("dedup index holds {} previously processed events", index.len());

        Self {
            client,
            parser: NugsParser::new(),
            invoker,
            paths,
            index,
            log,
            fallback_year,
            dry_run,
        }
    }

    pub fn dedup_index(&self) -> &DedupIndex {
        &self.index
    }

    /// Process every given page: single-event URLs directly, catalog pages
    /// card by card.
    pub async fn run(&self, pages: &[String]) -> Result<()> {
        for page in pages {
            let url = resolve_page_url(page);
            log::info!("scraping {url}");
            let html = match self.client.fetch_page(&url).await {
                Ok(html) => html,
                Err(e) => {
                    log::error!("cannot fetch {url}: {e}");
                    continue;
                }
            };

            match PageKind::classify(&url) {
                PageKind::SingleEvent => {
                    let exclusive = url.contains("/exclusive/");
                    if let Err(e) = self.process_event(&url, &html, exclusive).await {
                        log::error!("failed to process {url}: {e}");
                    }
                }
                PageKind::CatalogListing => {
                    let cards = self.parser.parse_catalog(&Html::parse_document(&html));
                    if cards.is_empty() {
                        log::warn!("no release cards found on {url}");
                    }
                    for card in cards {
                        let html = match self.client.fetch_page(&card.url).await {
                            Ok(html) => html,
                            Err(e) => {
                                log::error!("cannot fetch {}: {e}", card.url);
                                continue;
                            }
                        };
                        if let Err(e) = self.process_event(&card.url, &html, card.exclusive).await {
                            log::error!("failed to process {}: {e}", card.url);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Extract, dedup-check, persist metadata, and download one event.
    async fn process_event(&self, url: &str, html: &str, exclusive: bool) -> Result<()> {
        let (identity, setlist, cover_url) = {
            let document = Html::parse_document(html);
            let record = self
                .parser
                .parse_event(&document, url, exclusive, self.fallback_year);
            let identity = build_identity(
                &record.artist,
                &record.venue_location(),
                &record.date,
                self.fallback_year,
            );
            (
                identity,
                parse_setlist(&document),
                self.parser.cover_image_url(&document),
            )
        };

        if identity.key.is_none() {
            log::warn!(
                "no artist/date key for {:?}, cannot deduplicate",
                identity.display_text
            );
        }
        if self.index.contains(&identity.display_text) {
            log::info!("already processed, skipping: {}", identity.display_text);
            return Ok(());
        }
        println!("{}", identity.display_text);

        let folder = self.paths.data_directory.join(&identity.display_text);
        fs::create_dir_all(&folder)?;
        fs::write(
            folder.join(format!("{}.html", identity.display_text)),
            html,
        )?;
        fs::write(
            folder.join("info.txt"),
            format!("{url}\n{}", setlist.to_text()),
        )?;
        if let Some(cover_url) = cover_url {
            match self.client.fetch_bytes(&cover_url).await {
                Ok(bytes) => {
                    fs::write(folder.join(format!("{}.jpg", identity.display_text)), bytes)?;
                }
                Err(e) => log::warn!("cover image download failed for {cover_url}: {e}"),
            }
        }

        if self.dry_run {
            log::info!("dry run, not downloading {}", identity.display_text);
            return Ok(());
        }

        let staging = self.create_staging_dir()?;
        let download = self.invoker.download(url, &staging, exclusive).and_then(|()| {
            self.invoker
                .place_output(&staging, &identity.display_text, &self.paths.video_directory)
        });
        let _ = fs::remove_dir_all(&staging);

        let final_name = download?;
        self.log.append(&final_name)?;
        Ok(())
    }

    fn create_staging_dir(&self) -> Result<PathBuf> {
        let staging = self
            .paths
            .video_directory
            .join(format!(".staging-{}", std::process::id()));
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;
        Ok(staging)
    }
}

/// Expand the `watch`/`exclusive` shortcuts; anything else is used as-is.
pub fn resolve_page_url(page: &str) -> String {
    for (shortcut, url) in PAGE_SHORTCUTS {
        if page == *shortcut {
            return (*url).to_string();
        }
    }
    page.to_string()
}

/// A quick sanity check on user-supplied page arguments before the run
/// starts: shortcut names and absolute platform URLs pass.
pub fn is_valid_page(page: &str) -> bool {
    PAGE_SHORTCUTS.iter().any(|(shortcut, _)| page == *shortcut)
        || page.starts_with("http://")
        || page.starts_with("https://")
}

/// Default page scraped when none are given.
pub fn default_pages() -> Vec<String> {
    vec![format!("{BASE_URL}/watch/videos/recent")]
}
