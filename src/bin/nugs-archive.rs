use chrono::Datelike;
use clap::{Parser, Subcommand};
use nugs_archive::archive::{default_pages, is_valid_page};
use nugs_archive::dedup::{read_log_lines, scan_directory};
use nugs_archive::{
    Archiver, Config, DedupIndex, DownloadInvoker, NugsClient, ProcessedLog, SessionPersistence,
    PROCESSED_LOG_FILE,
};
use std::path::PathBuf;

/// Automated archiver for nugs.net concert videos and livestreams
#[derive(Parser)]
#[command(
    name = "nugs-archive",
    about = "Automated archiver for nugs.net concert videos and livestreams",
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = "nugs-archive.toml")]
    config: PathBuf,

    /// Show detailed debug information
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape catalog pages and download anything not yet archived
    Run {
        /// Pages to scrape: `watch`, `exclusive`, or full URLs. May be
        /// repeated. Defaults to the recent videos page.
        #[arg(long = "page")]
        pages: Vec<String>,

        /// Extract and save metadata but skip the downloads
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the already-processed events the dedup index would skip
    List,
    /// Log in and save a fresh session, replacing any existing one
    Login,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            eprintln!();
            eprintln!("Create a config file like:");
            eprintln!();
            eprintln!("  [credentials]");
            eprintln!("  email = \"you@example.com\"");
            eprintln!("  password = \"...\"");
            eprintln!();
            eprintln!("  [paths]");
            eprintln!("  video_directory = \"/mnt/media/concerts\"");
            eprintln!();
            eprintln!("  [downloader]");
            eprintln!("  binary = \"binaries/nugs-downloader\"");
            std::process::exit(1);
        }
    };

    match args.command {
        Commands::Run { pages, dry_run } => run(config, pages, dry_run).await,
        Commands::List => list(config),
        Commands::Login => login(config).await,
    }
}

async fn run(
    config: Config,
    pages: Vec<String>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pages = if pages.is_empty() {
        default_pages()
    } else {
        let (valid, invalid): (Vec<_>, Vec<_>) = pages.into_iter().partition(|p| is_valid_page(p));
        for page in &invalid {
            eprintln!("⚠️  Invalid page argument, skipping: {page}");
        }
        valid
    };
    if pages.is_empty() {
        eprintln!("❌ No valid pages to scrape");
        std::process::exit(1);
    }

    let paths = config.resolve_paths()?;
    println!("📂 Data directory:  {}", paths.data_directory.display());
    println!("📂 Video directory: {}", paths.video_directory.display());

    config.update_downloader_config()?;

    let client = load_or_create_client(&config).await?;
    let invoker = DownloadInvoker::new(config.downloader.binary.clone());
    let fallback_year = chrono::Local::now().year();
    let archiver = Archiver::new(client, invoker, paths, fallback_year, dry_run);

    if !archiver.dedup_index().is_empty() {
        println!("\nPotentially skipping the following:");
        for key in archiver.dedup_index().sorted_keys() {
            println!("  {key}");
        }
        println!();
    }

    archiver.run(&pages).await?;
    println!("✅ Run complete");
    Ok(())
}

fn list(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let paths = config.resolve_paths()?;
    let log = ProcessedLog::new(paths.data_directory.join(PROCESSED_LOG_FILE));
    let mut names = scan_directory(&paths.video_directory);
    names.extend(read_log_lines(log.path()));
    let index = DedupIndex::build(&names);

    if index.is_empty() {
        println!("Nothing archived yet.");
    } else {
        println!("{} archived event(s):", index.len());
        for key in index.sorted_keys() {
            println!("  {key}");
        }
    }
    Ok(())
}

async fn login(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let email = &config.credentials.email;
    let _ = SessionPersistence::remove(email);

    println!("🔐 Logging in as {email}...");
    let http_client = http_client::native::NativeClient::new();
    let client = NugsClient::login_with_credentials(
        Box::new(http_client),
        email,
        &config.credentials.password,
    )
    .await?;

    SessionPersistence::save(client.session())?;
    println!("✅ Session saved");
    Ok(())
}

/// Load existing session or create a new client with fresh login.
///
/// 1. Try to load a saved session from the XDG data directory
/// 2. Validate the loaded session against the live site
/// 3. If the session is invalid or missing, perform a fresh login
/// 4. Save the new session for future use
async fn load_or_create_client(config: &Config) -> Result<NugsClient, Box<dyn std::error::Error>> {
    let email = &config.credentials.email;

    if SessionPersistence::exists(email) {
        println!("📁 Found existing session for {email}, attempting to restore...");
        match SessionPersistence::load(email) {
            Ok(session) => {
                let http_client = http_client::native::NativeClient::new();
                let client = NugsClient::from_session(Box::new(http_client), session);
                if client.validate_session().await {
                    println!("✅ Session is valid, using saved session");
                    return Ok(client);
                }
                println!("❌ Session is invalid or expired");
                let _ = SessionPersistence::remove(email);
            }
            Err(e) => {
                println!("❌ Failed to load session: {e}");
                let _ = SessionPersistence::remove(email);
            }
        }
    }

    println!("🔐 No valid session found, logging in to nugs.net...");
    let http_client = http_client::native::NativeClient::new();
    let client = NugsClient::login_with_credentials(
        Box::new(http_client),
        email,
        &config.credentials.password,
    )
    .await?;

    if let Err(e) = SessionPersistence::save(client.session()) {
        println!("⚠️  Warning: failed to save session: {e}");
    } else {
        println!("💾 Session saved for future runs");
    }
    Ok(client)
}
