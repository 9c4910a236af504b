//! Crawl coordinator
//!
//! The coordinator runs one dispatch loop and a fixed pool of worker tasks.
//! The dispatcher pops URLs from the frontier, marks them visited and hands
//! them over a bounded channel; workers rate-limit, render, extract, convert
//! and feed discovered links back into the frontier.
//!
//! Termination is decided by the dispatcher alone: the crawl is quiescent
//! when no URL is in flight and the frontier is still empty after that
//! check. Every worker completion signals a [`Notify`] so the dispatcher
//! re-checks without polling.

use crate::cache::{ResponseCache, DEFAULT_TTL};
use crate::config::{validate_crawl_config, CrawlConfig};
use crate::crawler::converter::Converter;
use crate::crawler::extractor::ContentExtractor;
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::links::extract_links;
use crate::crawler::rate::RateController;
use crate::crawler::renderer::{RenderError, Renderer};
use crate::crawler::retry::{retry, RetryError};
use crate::crawler::PageResult;
use crate::output::CrawlStats;
use crate::state::{CrawlPhase, PageOutcome};
use crate::url::normalize_url;
use crate::RippleError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Results of a crawl together with its statistics
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Page results in completion order
    pub results: Vec<PageResult>,

    /// Outcome counters and timing
    pub stats: CrawlStats,
}

/// Crawl orchestrator
///
/// Holds the collaborators shared by every crawl: the renderer, the
/// Markdown converter, the content extractor and an optional response cache.
/// All per-crawl state (frontier, visited set, results) lives inside a single
/// [`Coordinator::crawl`] call, so one coordinator can run several crawls.
pub struct Coordinator {
    renderer: Arc<dyn Renderer>,
    converter: Arc<dyn Converter>,
    extractor: ContentExtractor,
    cache: Option<Arc<dyn ResponseCache>>,
}

impl Coordinator {
    /// Creates a coordinator without a cache and with the default extractor
    pub fn new(renderer: Arc<dyn Renderer>, converter: Arc<dyn Converter>) -> Self {
        Self {
            renderer,
            converter,
            extractor: ContentExtractor::default(),
            cache: None,
        }
    }

    /// Serves and stores converted pages through `cache`
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replaces the content extractor
    pub fn with_extractor(mut self, extractor: ContentExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Crawls from `start_url` and returns the collected page results
    ///
    /// # Arguments
    ///
    /// * `start_url` - Seed URL, crawled at depth 0
    /// * `config` - Crawl limits
    /// * `cancel` - Stops the crawl early; results gathered so far are kept
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<PageResult>)` - At most `config.max_pages` results, partial
    ///   if `cancel` fired
    /// * `Err(RippleError)` - The seed URL or the configuration is invalid
    ///
    /// # Example
    ///
    /// ```no_run
    /// use page_ripple::config::{CrawlConfig, RendererConfig};
    /// use page_ripple::crawler::{Coordinator, HttpRenderer, MarkdownConverter};
    /// use std::sync::Arc;
    /// use tokio_util::sync::CancellationToken;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = CrawlConfig::default();
    /// let renderer = HttpRenderer::from_config(&RendererConfig::default(), config.page_timeout)?;
    /// let coordinator = Coordinator::new(Arc::new(renderer), Arc::new(MarkdownConverter::new()));
    ///
    /// let pages = coordinator
    ///     .crawl("https://example.com", &config, CancellationToken::new())
    ///     .await?;
    /// println!("crawled {} pages", pages.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn crawl(
        &self,
        start_url: &str,
        config: &CrawlConfig,
        cancel: CancellationToken,
    ) -> Result<Vec<PageResult>, RippleError> {
        Ok(self.crawl_with_report(start_url, config, cancel).await?.results)
    }

    /// Same as [`Coordinator::crawl`], additionally returning statistics
    pub async fn crawl_with_report(
        &self,
        start_url: &str,
        config: &CrawlConfig,
        cancel: CancellationToken,
    ) -> Result<CrawlReport, RippleError> {
        let seed = normalize_url(start_url).map_err(|source| RippleError::InvalidStartUrl {
            url: start_url.to_string(),
            source,
        })?;
        validate_crawl_config(config)?;

        let start_time = Instant::now();
        let mut phase = CrawlPhase::Seeded;

        let shared = Arc::new(CrawlState {
            config: config.clone(),
            frontier: Frontier::new(),
            results: Mutex::new(Vec::with_capacity(config.max_pages)),
            stats: Mutex::new(CrawlStats::new()),
            in_flight: AtomicUsize::new(0),
            completed: Notify::new(),
            rate: RateController::from_config(config),
            renderer: Arc::clone(&self.renderer),
            converter: Arc::clone(&self.converter),
            extractor: self.extractor.clone(),
            cache: self.cache.clone(),
            cancel,
        });

        shared.frontier.add(&seed, 0);
        tracing::info!(
            "Starting crawl of {} (max depth {}, max pages {}, {} workers)",
            seed,
            config.max_depth,
            config.max_pages,
            config.workers
        );

        let (tx, rx) = mpsc::channel::<FrontierEntry>(config.workers);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let workers: Vec<JoinHandle<()>> = (0..config.workers)
            .map(|id| {
                let shared = Arc::clone(&shared);
                let rx = Arc::clone(&rx);
                tokio::spawn(run_worker(id, shared, rx))
            })
            .collect();

        transition(&mut phase, CrawlPhase::Running);
        dispatch(&shared, &tx).await;

        transition(&mut phase, CrawlPhase::Draining);
        drop(tx);
        for handle in workers {
            if let Err(e) = handle.await {
                tracing::warn!("Worker task failed: {}", e);
            }
        }
        transition(&mut phase, CrawlPhase::Done);

        let results = std::mem::take(&mut *shared.lock_results());
        let mut stats = shared.lock_stats().clone();
        stats.visited = shared.frontier.visited_count();
        stats.elapsed = start_time.elapsed();

        if shared.cancel.is_cancelled() {
            tracing::warn!(
                "Crawl cancelled: returning {} partial result(s)",
                results.len()
            );
        }

        tracing::info!(
            "Crawl completed: {} pages crawled in {:?} ({} visited, {} failed)",
            results.len(),
            stats.elapsed,
            stats.visited,
            stats.failed()
        );

        Ok(CrawlReport { results, stats })
    }
}

/// Moves the crawl to `next`, logging the transition
fn transition(phase: &mut CrawlPhase, next: CrawlPhase) {
    debug_assert!(
        phase.can_transition_to(next),
        "invalid phase transition {} -> {}",
        phase,
        next
    );
    tracing::debug!("Crawl phase: {} -> {}", phase, next);
    *phase = next;
}

/// State shared between the dispatcher and the workers of one crawl
struct CrawlState {
    config: CrawlConfig,
    frontier: Frontier,
    results: Mutex<Vec<PageResult>>,
    stats: Mutex<CrawlStats>,
    in_flight: AtomicUsize,
    completed: Notify,
    rate: RateController,
    renderer: Arc<dyn Renderer>,
    converter: Arc<dyn Converter>,
    extractor: ContentExtractor,
    cache: Option<Arc<dyn ResponseCache>>,
    cancel: CancellationToken,
}

impl CrawlState {
    fn lock_results(&self) -> MutexGuard<'_, Vec<PageResult>> {
        self.results.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_stats(&self) -> MutexGuard<'_, CrawlStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn results_full(&self) -> bool {
        self.lock_results().len() >= self.config.max_pages
    }

    /// Runs the page pipeline for one entry
    async fn process(&self, entry: &FrontierEntry) -> PageOutcome {
        // Entries already handed over when the budget filled are dropped
        // before they cost a render.
        if self.results_full() {
            tracing::debug!("Page budget full, skipping {}", entry.url);
            return PageOutcome::BudgetExhausted;
        }

        if self.rate.acquire(&self.cancel).await.is_err() {
            return PageOutcome::Cancelled;
        }

        if self.results_full() {
            tracing::debug!("Page budget full, skipping {}", entry.url);
            return PageOutcome::BudgetExhausted;
        }

        // Links need the raw HTML, so a cache hit only saves the render on
        // pages whose links will not be followed.
        let follow_links = entry.depth < self.config.max_depth;
        let cached = self.cache.as_ref().and_then(|cache| cache.get(&entry.url));
        if let (Some(markdown), false) = (&cached, follow_links) {
            tracing::debug!("Cache hit for {}", entry.url);
            return self.push_result(entry, markdown.clone(), PageOutcome::Cached);
        }

        let html = match retry(&self.config.retry, &self.cancel, || self.render(&entry.url)).await
        {
            Ok(html) => html,
            Err(RetryError::Cancelled) => return PageOutcome::Cancelled,
            Err(RetryError::Failed { error, attempts }) => {
                tracing::warn!(
                    "Failed to render {} after {} attempt(s): {}",
                    entry.url,
                    attempts,
                    error
                );
                return PageOutcome::RenderFailed;
            }
        };

        let (markdown, outcome) = match cached {
            Some(markdown) => (markdown, PageOutcome::Cached),
            None => match self.convert(entry, &html) {
                Ok(markdown) => (markdown, PageOutcome::Processed),
                Err(outcome) => return outcome,
            },
        };

        let outcome = self.push_result(entry, markdown, outcome);
        if outcome == PageOutcome::BudgetExhausted {
            return outcome;
        }

        if follow_links {
            self.enqueue_links(entry, &html);
        }

        outcome
    }

    /// One render attempt bounded by the page timeout
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        let timeout = self.config.page_timeout;
        match tokio::time::timeout(timeout, self.renderer.render(url)).await {
            Ok(result) => result,
            Err(_) => Err(RenderError::timeout(url, timeout)),
        }
    }

    /// Extracts the main content, converts it and stores it in the cache
    fn convert(&self, entry: &FrontierEntry, html: &str) -> Result<String, PageOutcome> {
        let content = self.extractor.extract_main_content(html).map_err(|e| {
            tracing::warn!("Failed to extract content from {}: {}", entry.url, e);
            PageOutcome::ExtractionFailed
        })?;

        let markdown = self.converter.html_to_markdown(&content).map_err(|e| {
            tracing::warn!("Failed to convert {}: {}", entry.url, e);
            PageOutcome::ConversionFailed
        })?;

        if let Some(cache) = &self.cache {
            cache.set(&entry.url, markdown.clone(), DEFAULT_TTL);
        }

        Ok(markdown)
    }

    /// Appends a result unless the page budget is already used up
    fn push_result(&self, entry: &FrontierEntry, markdown: String, outcome: PageOutcome) -> PageOutcome {
        let mut results = self.lock_results();
        if results.len() >= self.config.max_pages {
            tracing::debug!("Page budget full, dropping {}", entry.url);
            return PageOutcome::BudgetExhausted;
        }

        results.push(PageResult {
            url: entry.url.clone(),
            markdown,
            depth: entry.depth,
        });

        tracing::info!(
            "Progress: {}/{} pages crawled ({} at depth {})",
            results.len(),
            self.config.max_pages,
            entry.url,
            entry.depth
        );

        outcome
    }

    fn enqueue_links(&self, entry: &FrontierEntry, html: &str) {
        let links = match extract_links(html, &entry.url, &self.config.allowed_domains) {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!("Failed to extract links from {}: {}", entry.url, e);
                return;
            }
        };

        let added = links
            .iter()
            .filter(|link| self.frontier.add(link, entry.depth + 1))
            .count();

        tracing::debug!(
            "Found {} link(s) on {}, {} new",
            links.len(),
            entry.url,
            added
        );
    }
}

/// Releases one in-flight slot and wakes the dispatcher
struct InFlightGuard<'a> {
    state: &'a CrawlState,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.state.completed.notify_one();
    }
}

/// Dispatch loop: runs until the crawl is quiescent, the page budget is
/// full, or the crawl is cancelled
async fn dispatch(state: &CrawlState, tx: &mpsc::Sender<FrontierEntry>) {
    loop {
        if state.cancel.is_cancelled() {
            return;
        }

        if state.results_full() {
            tracing::debug!("Page budget reached, stopping dispatch");
            return;
        }

        let Some(entry) = state.frontier.pop() else {
            if state.in_flight.load(Ordering::SeqCst) == 0 {
                if state.frontier.is_empty() {
                    tracing::debug!("Frontier empty and no work in flight");
                    return;
                }
                continue;
            }

            tokio::select! {
                _ = state.cancel.cancelled() => return,
                _ = state.completed.notified() => {}
            }
            continue;
        };

        if state.frontier.is_visited(&entry.url) {
            continue;
        }
        state.frontier.mark_visited(&entry.url);
        state.in_flight.fetch_add(1, Ordering::SeqCst);

        tracing::debug!("Dispatching {} (depth {})", entry.url, entry.depth);

        let sent = tokio::select! {
            _ = state.cancel.cancelled() => false,
            result = tx.send(entry) => result.is_ok(),
        };
        if !sent {
            state.in_flight.fetch_sub(1, Ordering::SeqCst);
            return;
        }
    }
}

async fn run_worker(
    id: usize,
    state: Arc<CrawlState>,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<FrontierEntry>>>,
) {
    tracing::trace!("Worker {} started", id);

    loop {
        let entry = {
            let mut rx = rx.lock().await;
            tokio::select! {
                _ = state.cancel.cancelled() => None,
                entry = rx.recv() => entry,
            }
        };
        let Some(entry) = entry else {
            break;
        };

        let _guard = InFlightGuard { state: &*state };

        let outcome = tokio::select! {
            _ = state.cancel.cancelled() => PageOutcome::Cancelled,
            outcome = state.process(&entry) => outcome,
        };
        state.lock_stats().record(outcome);
    }

    tracing::trace!("Worker {} finished", id);
}
