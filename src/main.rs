use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use linkfeed::config::Config;
use linkfeed::content::{build_http_client, ContentFetcher, FetcherOptions};
use linkfeed::feed::{assemble, write_rss, write_rss_to_file, FeedMeta};
use linkfeed::itemize::{Dispatcher, ItemBuilder};
use linkfeed::storage::{Database, DatabaseError, LinkCache, MemoryCache};
use linkfeed::timeline::{filter_linked, load_timeline, select_count};

#[derive(Parser, Debug)]
#[command(
    name = "linkfeed",
    version,
    about = "Build an RSS feed of the pages linked from a timeline"
)]
struct Args {
    /// Timeline to read (JSON array of posts)
    #[arg(long, value_name = "FILE", env = "LINKFEED_POSTS")]
    posts: PathBuf,

    /// Owner of the timeline, used for the feed title and link
    #[arg(long, value_name = "NAME", env = "LINKFEED_SCREEN_NAME")]
    screen_name: String,

    /// Number of most recent posts to consider
    #[arg(long, value_name = "N", env = "LINKFEED_NUM_POSTS")]
    num_posts: Option<usize>,

    /// Maximum pages fetched at once
    #[arg(long, value_name = "K", env = "LINKFEED_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Config file (default: ~/.config/linkfeed/config.toml)
    #[arg(long, value_name = "FILE", env = "LINKFEED_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite link cache (overrides `cache_path` from the config)
    #[arg(long, value_name = "PATH", env = "LINKFEED_CACHE_DB")]
    cache_db: Option<PathBuf>,

    /// Empty the link cache before fetching
    #[arg(long)]
    reset_cache: bool,

    /// Write the feed here instead of stdout
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,
}

/// Opens the configured cache backend.
///
/// Returns the database handle too when SQLite is in use, for stats.
async fn open_cache(
    path: Option<&Path>,
    config: &Config,
    reset: bool,
) -> Result<(Arc<dyn LinkCache>, Option<Database>)> {
    let Some(path) = path else {
        if reset {
            tracing::info!("No cache database configured, nothing to reset");
        }
        tracing::debug!(capacity = config.memory_cache_capacity, "Using in-memory link cache");
        return Ok((
            Arc::new(MemoryCache::new(config.memory_cache_capacity)),
            None,
        ));
    };

    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in cache path"))?;
    let db = match Database::open(path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: The link cache at {} is locked by another process. Please try again later.",
                path.display()
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open link cache: {}", e));
        }
    };

    if reset {
        let removed = db.clear_cache().await.context("Failed to reset link cache")?;
        tracing::info!(removed, "Link cache reset");
    }

    Ok((Arc::new(db.clone()), Some(db)))
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the feed, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match args.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let count = select_count(args.num_posts, config.default_num_posts, config.max_num_posts)?;
    let concurrency = args.concurrency.unwrap_or(config.default_concurrency);

    let mut posts = load_timeline(&args.posts)
        .await
        .with_context(|| format!("Failed to load timeline from {}", args.posts.display()))?;
    posts.truncate(count);
    let posts = filter_linked(posts);

    let cache_path = args.cache_db.as_deref().or(config.cache_path.as_deref());
    let (cache, db) = open_cache(cache_path, &config, args.reset_cache).await?;

    let client = build_http_client(&config.user_agent).context("Failed to build HTTP client")?;
    let fetcher = ContentFetcher::new(
        client,
        cache,
        FetcherOptions {
            timeout: config.fetch_timeout(),
            allow_private_hosts: config.allow_private_hosts,
            ..FetcherOptions::default()
        },
    );
    let builder = ItemBuilder::new(Arc::new(fetcher), config.profile_base_url.clone());
    let dispatcher = Dispatcher::new(Arc::new(builder), config.max_concurrency);

    tracing::info!(
        posts = posts.len(),
        concurrency,
        screen_name = %args.screen_name,
        "Itemizing timeline"
    );
    let items = dispatcher
        .itemize(posts, concurrency)
        .await
        .context("Failed to itemize timeline")?;

    let meta = FeedMeta::for_screen_name(&args.screen_name, &config.profile_base_url);
    let feed = assemble(meta, items);

    match &args.output {
        Some(path) => write_rss_to_file(&feed, path)?,
        None => {
            let xml = write_rss(&feed)?;
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(xml.as_bytes())
                .context("Failed to write feed to stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }

    if let Some(db) = db {
        match db.cache_stats().await {
            Ok(stats) => tracing::info!(
                entries = stats.total_entries,
                bytes = stats.total_size_bytes,
                "Link cache"
            ),
            Err(e) => tracing::warn!(error = %e, "Failed to read link cache stats"),
        }
    }

    Ok(())
}
