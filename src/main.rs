use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::Result;
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use rwitt::domain::ports::PostStorePort;
use rwitt::infrastructure::image::{ImageCache, RedrawFn};
use rwitt::infrastructure::{AppConfig, CliArgs, JsonPostStore};
use rwitt::presentation::TimelineWindow;

/// How long the prefetch pass waits for stragglers before giving up.
const PREFETCH_DEADLINE: Duration = Duration::from_secs(60);

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let mut config = AppConfig::load(args.config.clone())?;
    config.merge_with_args(args);

    init_logging(&config)?;
    info!(version = rwitt::VERSION, "starting rwitt");

    let store = match config.store_path.clone() {
        Some(path) => JsonPostStore::open(path).await?,
        None => JsonPostStore::open_default().await?,
    };

    let redraw_signal = Arc::new(Notify::new());
    let signal = Arc::clone(&redraw_signal);
    let redraw: RedrawFn = Arc::new(move || signal.notify_one());
    let cache = ImageCache::new(config.image_cache_config(), redraw)?;

    let posts = store.recent(config.timeline.preload).await?;
    if posts.is_empty() {
        info!("no stored posts; nothing to prefetch");
        cache.shutdown().await;
        return Ok(());
    }

    // recent() is newest first: the newest post seeds the window as the
    // center, the rest extend the older side.
    let mut window = TimelineWindow::new(config.timeline.max_per_side);
    let mut posts = posts.iter();
    if let Some(newest) = posts.next() {
        window.seed(newest);
    }
    for post in posts {
        if let Err(e) = window.add_older(post) {
            warn!(error = %e, "skipping out-of-order stored post");
        }
    }
    info!(posts = window.len(), "timeline window populated");

    prefetch_avatars(&cache, &window, &redraw_signal).await;
    info!(stats = %cache.stats(), "prefetch complete");

    cache.shutdown().await;
    Ok(())
}

/// Resolves every avatar the window references, re-querying the cache the
/// way a renderer re-queries on each repaint.
async fn prefetch_avatars(cache: &ImageCache, window: &TimelineWindow, redraw: &Notify) {
    let mut pending: HashSet<String> = window
        .iter()
        .map(|post| post.image_url.to_string())
        .collect();
    let deadline = tokio::time::Instant::now() + PREFETCH_DEADLINE;

    while !pending.is_empty() {
        // Each miss schedules a download unless one is already in flight.
        pending.retain(|url| cache.get(url).is_none());
        if pending.is_empty() {
            break;
        }
        if tokio::time::Instant::now() >= deadline {
            warn!(remaining = pending.len(), "prefetch deadline reached");
            break;
        }
        tokio::select! {
            () = redraw.notified() => {}
            () = tokio::time::sleep(Duration::from_millis(500)) => {}
        }
    }
}
