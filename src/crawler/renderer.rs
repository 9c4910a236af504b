//! Page renderers
//!
//! A [`Renderer`] turns a URL into the page's HTML. Two implementations:
//!
//! - [`ChromeRenderer`] runs a headless Chrome/Chromium process so scripts
//!   and lazily loaded content are executed before the DOM is dumped
//! - [`HttpRenderer`] performs a plain GET (no JavaScript)
//!
//! # Error Classification
//!
//! | Condition | Kind |
//! |-----------|------|
//! | Timeout (request, process, or per-page limit) | `Timeout` |
//! | Connection failure | `Network` |
//! | HTTP 429 / 5xx | `Network` |
//! | Browser stderr mentioning timeout/connection/network | `Network` |
//! | HTTP 4xx, non-HTML body, browser missing, anything else | `Permanent` |
//!
//! `Timeout` and `Network` are retried by the crawler; `Permanent` is not.

use crate::config::RendererConfig;
use crate::crawler::retry::{is_retryable_message, Retryable};
use crate::RippleError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;

/// Failure class of a render attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderErrorKind {
    Timeout,
    Network,
    Permanent,
}

/// A failed render attempt
#[derive(Debug, Clone, Error)]
#[error("failed to render {url} ({kind:?}): {message}")]
pub struct RenderError {
    pub kind: RenderErrorKind,
    pub url: String,
    pub message: String,
}

impl RenderError {
    pub fn new(kind: RenderErrorKind, url: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn timeout(url: &str, after: Duration) -> Self {
        Self::new(
            RenderErrorKind::Timeout,
            url,
            format!("timed out after {:?}", after),
        )
    }

    /// Classifies opaque failure text
    pub fn from_message(url: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = if is_retryable_message(&message) {
            RenderErrorKind::Network
        } else {
            RenderErrorKind::Permanent
        };
        Self::new(kind, url, message)
    }
}

impl Retryable for RenderError {
    fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            RenderErrorKind::Timeout | RenderErrorKind::Network
        )
    }
}

/// Produces the fully rendered HTML of a page
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, RenderError>;
}

/// Builds the renderer selected by the configuration
///
/// # Arguments
///
/// * `config` - Renderer settings
/// * `timeout` - Upper bound for one render call
pub fn build_renderer(
    config: &RendererConfig,
    timeout: Duration,
) -> Result<Box<dyn Renderer>, RippleError> {
    if config.use_browser {
        Ok(Box::new(ChromeRenderer::from_config(config, timeout)?))
    } else {
        Ok(Box::new(HttpRenderer::from_config(config, timeout)?))
    }
}

// ===== Headless browser =====

/// Executable names probed on `PATH`, in order
const BROWSER_NAMES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "microsoft-edge",
];

/// Headless Chrome/Chromium driven through its command line
///
/// The browser loads the page, runs scripts for the configured virtual time
/// budget (so lazy content can settle), then prints the serialized DOM.
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    browser: PathBuf,
    settle_time: Duration,
    user_agent: String,
    timeout: Duration,
}

impl ChromeRenderer {
    pub fn new(browser: PathBuf, settle_time: Duration, user_agent: String, timeout: Duration) -> Self {
        Self {
            browser,
            settle_time,
            user_agent,
            timeout,
        }
    }

    /// Uses the configured browser path, or the first browser found on `PATH`
    pub fn from_config(config: &RendererConfig, timeout: Duration) -> Result<Self, RippleError> {
        let browser = match &config.browser_path {
            Some(path) => path.clone(),
            None => discover_browser().ok_or(RippleError::BrowserNotFound)?,
        };

        tracing::info!("Using browser at {}", browser.display());

        Ok(Self::new(
            browser,
            config.settle_time,
            config.user_agent.clone(),
            timeout,
        ))
    }

    pub fn browser(&self) -> &Path {
        &self.browser
    }

    fn args(&self, url: &str) -> Vec<String> {
        vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--hide-scrollbars".to_string(),
            format!("--user-agent={}", self.user_agent),
            format!("--virtual-time-budget={}", self.settle_time.as_millis()),
            "--dump-dom".to_string(),
            url.to_string(),
        ]
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        let mut command = tokio::process::Command::new(&self.browser);
        command
            .args(self.args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => return Err(RenderError::timeout(url, self.timeout)),
            Ok(Err(e)) => {
                return Err(RenderError::new(
                    RenderErrorKind::Permanent,
                    url,
                    format!("failed to launch {}: {}", self.browser.display(), e),
                ))
            }
            Ok(Ok(output)) => output,
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(RenderError::from_message(
                url,
                format!("browser exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let html = String::from_utf8_lossy(&output.stdout).into_owned();
        if html.trim().is_empty() {
            return Err(RenderError::from_message(
                url,
                format!("browser returned an empty document: {}", stderr.trim()),
            ));
        }

        Ok(html)
    }
}

/// Looks for a Chrome/Chromium executable on `PATH` (and the usual install
/// locations on Windows)
pub fn discover_browser() -> Option<PathBuf> {
    let dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|path_var| std::env::split_paths(&path_var).collect())
        .unwrap_or_default();

    find_in_dirs(&dirs).or_else(platform_default_browser)
}

fn find_in_dirs(dirs: &[PathBuf]) -> Option<PathBuf> {
    BROWSER_NAMES.iter().find_map(|name| {
        dirs.iter().find_map(|dir| {
            let candidate = dir.join(executable_name(name));
            candidate.is_file().then_some(candidate)
        })
    })
}

#[cfg(windows)]
fn executable_name(name: &str) -> String {
    format!("{}.exe", name)
}

#[cfg(not(windows))]
fn executable_name(name: &str) -> String {
    name.to_string()
}

#[cfg(windows)]
fn platform_default_browser() -> Option<PathBuf> {
    let mut candidates = vec![
        PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
        PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
    ];
    if let Some(local) = std::env::var_os("LOCALAPPDATA") {
        candidates.push(PathBuf::from(local).join(r"Google\Chrome\Application\chrome.exe"));
    }
    candidates.into_iter().find(|path| path.is_file())
}

#[cfg(target_os = "macos")]
fn platform_default_browser() -> Option<PathBuf> {
    [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|path| path.is_file())
}

#[cfg(not(any(windows, target_os = "macos")))]
fn platform_default_browser() -> Option<PathBuf> {
    None
}

// ===== Plain HTTP =====

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - Renderer settings (user agent)
/// * `timeout` - Total request timeout
pub fn build_http_client(config: &RendererConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with a plain GET; no scripts are executed
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &RendererConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config, timeout)?))
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(url, status));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(RenderError::new(
                RenderErrorKind::Permanent,
                url,
                format!("not an HTML page (Content-Type: {})", content_type),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(url, &e))
    }
}

fn classify_status(url: &str, status: StatusCode) -> RenderError {
    let kind = if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        RenderErrorKind::Network
    } else {
        RenderErrorKind::Permanent
    };
    RenderError::new(kind, url, format!("HTTP {}", status))
}

fn classify_reqwest_error(url: &str, error: &reqwest::Error) -> RenderError {
    if error.is_timeout() {
        RenderError::new(RenderErrorKind::Timeout, url, "request timeout")
    } else if error.is_connect() {
        RenderError::new(RenderErrorKind::Network, url, format!("connection failed: {}", error))
    } else {
        RenderError::from_message(url, error.to_string())
    }
}
