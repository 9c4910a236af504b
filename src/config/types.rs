use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Immutable per-crawl parameters
///
/// Built once (from defaults, a TOML file and/or CLI flags) and handed to
/// [`crate::crawler::Coordinator::crawl`]. Never mutated during a crawl.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlConfig {
    /// Maximum link depth from the seed (the seed is depth 0)
    pub max_depth: u32,

    /// Maximum number of page results
    pub max_pages: usize,

    /// Hosts links may point to; empty means "the seed's host only"
    pub allowed_domains: Vec<String>,

    /// Number of worker tasks
    pub workers: usize,

    /// Upper bound for one render call
    pub page_timeout: Duration,

    /// Requests per second across all workers (0 = unlimited)
    pub rate_limit: f64,

    /// Fixed pause after each rate-limit token
    pub delay: Duration,

    /// Backoff policy for render retries
    pub retry: RetryConfig,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_pages: 10,
            allowed_domains: Vec::new(),
            workers: 5,
            page_timeout: Duration::from_secs(60),
            rate_limit: 2.0,
            delay: Duration::from_millis(500),
            retry: RetryConfig::default(),
        }
    }
}

/// Bounded exponential backoff policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt (3 means up to 4 attempts)
    pub max_retries: u32,

    /// Sleep before the first retry
    pub initial_delay: Duration,

    /// Cap for the growing sleep
    pub max_delay: Duration,

    /// Factor applied to the sleep after each retry
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

/// Settings for the page renderer
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Drive a headless browser (false = plain HTTP fetch, no JavaScript)
    pub use_browser: bool,

    /// Explicit browser executable; looked up on PATH when unset
    pub browser_path: Option<PathBuf>,

    /// Virtual time the browser gets for scripts and lazy content to settle
    pub settle_time: Duration,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            use_browser: true,
            browser_path: None,
            settle_time: Duration::from_secs(4),
            user_agent: default_user_agent(),
        }
    }
}

/// Default User-Agent string, a desktop Chrome build
pub fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

/// Where results are written
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputConfig {
    /// Markdown file or directory; `None` prints JSON to stdout
    pub path: Option<PathBuf>,
}

/// Fully resolved configuration: crawl parameters plus collaborators' settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub crawler: CrawlConfig,
    pub renderer: RendererConfig,
    pub output: OutputConfig,
}

/// On-disk TOML layout
///
/// Every section and key is optional; missing values fall back to the
/// defaults of [`Config`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub crawler: CrawlerSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub renderer: RendererSection,
    #[serde(default)]
    pub output: OutputSection,
}

/// `[crawler]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CrawlerSection {
    pub max_depth: Option<u32>,
    pub max_pages: Option<usize>,
    pub allowed_domains: Option<Vec<String>>,
    pub workers: Option<usize>,
    /// Seconds
    pub page_timeout: Option<u64>,
    pub rate_limit: Option<f64>,
    /// Milliseconds
    pub delay: Option<u64>,
}

/// `[retry]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RetrySection {
    pub max_retries: Option<u32>,
    /// Milliseconds
    pub initial_delay: Option<u64>,
    /// Milliseconds
    pub max_delay: Option<u64>,
    pub backoff_multiplier: Option<f64>,
}

/// `[renderer]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RendererSection {
    pub use_browser: Option<bool>,
    pub browser_path: Option<PathBuf>,
    /// Milliseconds
    pub settle_time: Option<u64>,
    pub user_agent: Option<String>,
}

/// `[output]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutputSection {
    pub path: Option<PathBuf>,
}

impl FileConfig {
    /// Applies the file's values on top of the defaults
    pub fn into_config(self) -> Config {
        let mut config = Config::default();

        let crawler = &mut config.crawler;
        if let Some(v) = self.crawler.max_depth {
            crawler.max_depth = v;
        }
        if let Some(v) = self.crawler.max_pages {
            crawler.max_pages = v;
        }
        if let Some(v) = self.crawler.allowed_domains {
            crawler.allowed_domains = v;
        }
        if let Some(v) = self.crawler.workers {
            crawler.workers = v;
        }
        if let Some(v) = self.crawler.page_timeout {
            crawler.page_timeout = Duration::from_secs(v);
        }
        if let Some(v) = self.crawler.rate_limit {
            crawler.rate_limit = v;
        }
        if let Some(v) = self.crawler.delay {
            crawler.delay = Duration::from_millis(v);
        }

        let retry = &mut crawler.retry;
        if let Some(v) = self.retry.max_retries {
            retry.max_retries = v;
        }
        if let Some(v) = self.retry.initial_delay {
            retry.initial_delay = Duration::from_millis(v);
        }
        if let Some(v) = self.retry.max_delay {
            retry.max_delay = Duration::from_millis(v);
        }
        if let Some(v) = self.retry.backoff_multiplier {
            retry.backoff_multiplier = v;
        }

        let renderer = &mut config.renderer;
        if let Some(v) = self.renderer.use_browser {
            renderer.use_browser = v;
        }
        if self.renderer.browser_path.is_some() {
            renderer.browser_path = self.renderer.browser_path;
        }
        if let Some(v) = self.renderer.settle_time {
            renderer.settle_time = Duration::from_millis(v);
        }
        if let Some(v) = self.renderer.user_agent {
            renderer.user_agent = v;
        }

        config.output.path = self.output.path;

        config
    }
}
