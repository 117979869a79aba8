//! Subvault main entry point
//!
//! This is the command-line interface for the Subvault subreddit archiver.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use subvault::config::load_config;
use subvault::crawl::{fetch_comments, fetch_posts, update_posts, ShutdownFlag};
use subvault::load::Loader;
use subvault::reddit::default_listings;
use subvault::{Config, ContentCache, RedditApi, RedditClient};
use tracing_subscriber::EnvFilter;

/// Subvault: an incremental subreddit archiver
///
/// Subvault crawls as many posts and comment trees for a subreddit as the
/// Reddit API will return, caches them as JSON documents keyed by id, and
/// loads the finished cache into a SQLite database for analysis.
#[derive(Parser, Debug)]
#[command(name = "subvault")]
#[command(version)]
#[command(about = "An incremental subreddit archiver", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl every configured listing and cache the posts
    FetchPosts {
        /// Subreddit to crawl (without the /r/ prefix)
        subreddit: String,

        /// Directory holding the per-subreddit caches
        #[arg(long, default_value = "cache")]
        cache_dir: PathBuf,
    },

    /// Fetch comment trees for cached posts that have none stored
    FetchComments {
        /// Subreddit to crawl (without the /r/ prefix)
        subreddit: String,

        /// Directory holding the per-subreddit caches
        #[arg(long, default_value = "cache")]
        cache_dir: PathBuf,
    },

    /// Re-fetch every cached post to refresh scores and comment counts
    UpdatePosts {
        /// Subreddit to crawl (without the /r/ prefix)
        subreddit: String,

        /// Directory holding the per-subreddit caches
        #[arg(long, default_value = "cache")]
        cache_dir: PathBuf,
    },

    /// Load the cache into a SQLite database for analysis
    Load {
        /// Subreddit whose cache to load
        subreddit: String,

        /// Directory holding the per-subreddit caches
        #[arg(long, default_value = "cache")]
        cache_dir: PathBuf,

        /// Database file to write (defaults to <cache-dir>/<subreddit>.db)
        #[arg(long)]
        database: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration; defaults apply without a file
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config(path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    let result = match cli.command {
        Command::FetchPosts {
            subreddit,
            cache_dir,
        } => handle_fetch_posts(&config, &subreddit, &cache_dir).await,
        Command::FetchComments {
            subreddit,
            cache_dir,
        } => handle_fetch_comments(&config, &subreddit, &cache_dir).await,
        Command::UpdatePosts {
            subreddit,
            cache_dir,
        } => handle_update_posts(&config, &subreddit, &cache_dir).await,
        Command::Load {
            subreddit,
            cache_dir,
            database,
        } => handle_load(&subreddit, &cache_dir, database.as_deref()),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("subvault=info,warn"),
            1 => EnvFilter::new("subvault=debug,info"),
            2 => EnvFilter::new("subvault=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the fetch-posts subcommand: one pass over every listing
async fn handle_fetch_posts(
    config: &Config,
    subreddit: &str,
    cache_dir: &Path,
) -> subvault::Result<()> {
    let cache = ContentCache::open(cache_dir.join(subreddit))?;
    let client = RedditClient::new(config)?;
    let listings = default_listings(&config.listings.search_terms);

    let shutdown = ShutdownFlag::new();
    shutdown.arm_ctrl_c();

    tracing::info!("Crawling {} listings of r/{}", listings.len(), subreddit);
    let summary = fetch_posts(&client, &cache, subreddit, &listings, &shutdown).await?;

    tracing::info!(
        "Posts pass finished: {} listings crawled, {} failed, {} posts saved ({} cached total)",
        summary.listings_crawled,
        summary.failures.len(),
        summary.posts_saved,
        summary.cached_posts
    );
    Ok(())
}

/// Handles the fetch-comments subcommand: one pass over unseen posts
async fn handle_fetch_comments(
    config: &Config,
    subreddit: &str,
    cache_dir: &Path,
) -> subvault::Result<()> {
    let cache = Arc::new(ContentCache::open(cache_dir.join(subreddit))?);
    let client: Arc<dyn RedditApi> = Arc::new(RedditClient::new(config)?);

    let shutdown = ShutdownFlag::new();
    shutdown.arm_ctrl_c();

    let summary = fetch_comments(
        client,
        cache,
        subreddit,
        config.crawler.max_concurrent_fetches as usize,
        &shutdown,
    )
    .await?;

    tracing::info!(
        "Comments pass finished: {} posts fetched ({} truncated), {} skipped, {} failed, {} comments saved",
        summary.posts_fetched,
        summary.posts_truncated,
        summary.posts_skipped,
        summary.posts_failed,
        summary.comments_saved
    );
    Ok(())
}

/// Handles the update-posts subcommand: refresh every cached post by id
async fn handle_update_posts(
    config: &Config,
    subreddit: &str,
    cache_dir: &Path,
) -> subvault::Result<()> {
    let cache = ContentCache::open(cache_dir.join(subreddit))?;
    let client = RedditClient::new(config)?;

    let shutdown = ShutdownFlag::new();
    shutdown.arm_ctrl_c();

    let summary = update_posts(&client, &cache, &shutdown).await?;

    tracing::info!(
        "Update pass finished: {} posts checked, {} updated, {} missing, {} batches failed",
        summary.posts_checked,
        summary.posts_updated,
        summary.posts_missing,
        summary.batches_failed
    );
    Ok(())
}

/// Handles the load subcommand: cache into SQLite
fn handle_load(
    subreddit: &str,
    cache_dir: &Path,
    database: Option<&Path>,
) -> subvault::Result<()> {
    let cache = ContentCache::open(cache_dir.join(subreddit))?;
    let db_path = match database {
        Some(path) => path.to_path_buf(),
        None => cache_dir.join(format!("{}.db", subreddit)),
    };

    tracing::info!("Loading cache into {}", db_path.display());
    let mut loader = Loader::open(&db_path)?;
    let summary = loader.load(&cache)?;

    tracing::info!(
        "Load finished: {} posts, {} comments, {} documents skipped",
        summary.posts_loaded,
        summary.comments_loaded,
        summary.documents_skipped
    );
    Ok(())
}
