//! Page-Ripple main entry point
//!
//! This is the command-line interface for the Page-Ripple site crawler.

use anyhow::Context;
use clap::Parser;
use page_ripple::cache::MemoryCache;
use page_ripple::config::{load_config, validate, Config};
use page_ripple::crawler::{build_renderer, Coordinator, MarkdownConverter};
use page_ripple::output::{write_output, write_summary, CrawlOutput};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// How often expired cache entries are purged
const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Page-Ripple: crawl a website and save its main content as Markdown
///
/// Every page is rendered in a headless browser (or fetched over plain HTTP
/// with --no-browser), reduced to its main article content and converted to
/// Markdown. Links are followed breadth-first within the depth, page and
/// domain limits.
#[derive(Parser, Debug)]
#[command(name = "page-ripple")]
#[command(version = "1.0.0")]
#[command(about = "Crawl a website and save its main content as Markdown", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Maximum crawl depth [default: 2]
    #[arg(long)]
    depth: Option<u32>,

    /// Maximum number of pages to crawl [default: 10]
    #[arg(long)]
    pages: Option<usize>,

    /// Timeout per page in seconds [default: 60]
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Maximum requests per second, 0 = unlimited [default: 2.0]
    #[arg(long)]
    rate: Option<f64>,

    /// Delay between requests in milliseconds [default: 500]
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Number of concurrent workers [default: 5]
    #[arg(long)]
    workers: Option<usize>,

    /// Additional domain links may point to (repeatable); defaults to the start URL's host
    #[arg(long = "allow-domain", value_name = "DOMAIN")]
    allow_domains: Vec<String>,

    /// Output directory (multiple pages) or .md file (single page); JSON to stdout if omitted
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Chrome/Chromium executable to render pages with
    #[arg(long, value_name = "PATH", conflicts_with = "no_browser")]
    browser: Option<PathBuf>,

    /// Fetch pages over plain HTTP instead of rendering them (no JavaScript)
    #[arg(long)]
    no_browser: bool,

    /// Do not cache converted pages
    #[arg(long)]
    no_cache: bool,

    /// Overall crawl time limit in seconds [default: timeout * pages + 60]
    #[arg(long, value_name = "SECONDS")]
    crawl_timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(0) => {
            tracing::error!("No pages were crawled");
            tracing::error!("Check that the browser is installed, the URL is reachable and the page has content");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout stays clean for the JSON report.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_ripple=info,warn"),
            1 => EnvFilter::new("page_ripple=debug,info"),
            2 => EnvFilter::new("page_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the configuration: defaults, then the config file, then flags
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    let crawler = &mut config.crawler;
    if let Some(depth) = cli.depth {
        crawler.max_depth = depth;
    }
    if let Some(pages) = cli.pages {
        crawler.max_pages = pages;
    }
    if let Some(timeout) = cli.timeout {
        crawler.page_timeout = Duration::from_secs(timeout);
    }
    if let Some(rate) = cli.rate {
        crawler.rate_limit = rate;
    }
    if let Some(delay) = cli.delay {
        crawler.delay = Duration::from_millis(delay);
    }
    if let Some(workers) = cli.workers {
        crawler.workers = workers;
    }
    if !cli.allow_domains.is_empty() {
        crawler.allowed_domains = cli.allow_domains.clone();
    }

    if let Some(browser) = &cli.browser {
        config.renderer.use_browser = true;
        config.renderer.browser_path = Some(browser.clone());
    }
    if cli.no_browser {
        config.renderer.use_browser = false;
    }

    if cli.output.is_some() {
        config.output.path = cli.output.clone();
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Overall time limit: `timeout * pages + 60` seconds unless given
fn crawl_deadline(cli: &Cli, config: &Config) -> Duration {
    match cli.crawl_timeout {
        Some(secs) => Duration::from_secs(secs),
        None => {
            let pages = u32::try_from(config.crawler.max_pages).unwrap_or(u32::MAX);
            config
                .crawler
                .page_timeout
                .saturating_mul(pages)
                .saturating_add(Duration::from_secs(60))
        }
    }
}

/// Runs the crawl and writes its output, returning the number of pages
async fn run(cli: Cli) -> anyhow::Result<usize> {
    let config = build_config(&cli)?;
    let crawl = &config.crawler;

    tracing::info!("Target URL: {}", cli.url);
    tracing::info!("Max Depth: {}", crawl.max_depth);
    tracing::info!("Max Pages: {}", crawl.max_pages);
    tracing::info!("Timeout: {:?} per page", crawl.page_timeout);
    tracing::info!("Rate Limit: {:.2} requests/second", crawl.rate_limit);
    tracing::info!("Delay: {:?} between requests", crawl.delay);

    let renderer = build_renderer(&config.renderer, crawl.page_timeout)?;
    let mut coordinator = Coordinator::new(Arc::from(renderer), Arc::new(MarkdownConverter::new()));

    let cancel = CancellationToken::new();

    if !cli.no_cache {
        let cache = Arc::new(MemoryCache::new());
        MemoryCache::spawn_janitor(Arc::clone(&cache), CACHE_PURGE_INTERVAL, cancel.child_token());
        coordinator = coordinator.with_cache(cache);
    }

    let deadline = crawl_deadline(&cli, &config);
    spawn_cancel_triggers(cancel.clone(), deadline);

    let report = coordinator
        .crawl_with_report(&cli.url, crawl, cancel.clone())
        .await?;
    cancel.cancel();

    let pages = report.results.len();
    if pages == 0 {
        return Ok(0);
    }

    let output = CrawlOutput::new(cli.url.clone(), report.results, report.stats.elapsed);
    write_output(config.output.path.as_deref(), &output).context("failed to write output")?;

    write_summary(&mut std::io::stderr(), &output.pages, &report.stats)
        .context("failed to write summary")?;

    Ok(pages)
}

/// Cancels the crawl on Ctrl-C or when the overall time limit passes
fn spawn_cancel_triggers(cancel: CancellationToken, deadline: Duration) {
    tokio::spawn(async move {
        let interrupted = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = interrupted => {
                tracing::warn!("Interrupted, finishing with the pages crawled so far");
                cancel.cancel();
            }
            _ = tokio::time::sleep(deadline) => {
                tracing::warn!("Crawl time limit of {:?} reached", deadline);
                cancel.cancel();
            }
        }
    });
}
