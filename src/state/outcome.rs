/// Per-page outcomes recorded by the crawl workers
use serde::Serialize;
use std::fmt;

/// What happened to one dispatched URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOutcome {
    // ===== Success States =====
    /// Page was rendered, extracted and converted
    Processed,

    /// Markdown was served from the response cache
    Cached,

    // ===== Skip States =====
    /// The result budget was already full when the page came up
    BudgetExhausted,

    /// The crawl was cancelled while this page was in flight
    Cancelled,

    // ===== Error States =====
    /// Renderer failed permanently or ran out of retries
    RenderFailed,

    /// No main content could be extracted
    ExtractionFailed,

    /// HTML to Markdown conversion failed
    ConversionFailed,
}

impl PageOutcome {
    /// Returns true if the page produced a result
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Processed | Self::Cached)
    }

    /// Returns true if this represents a per-page error
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::RenderFailed | Self::ExtractionFailed | Self::ConversionFailed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Cached => "cached",
            Self::BudgetExhausted => "budget_exhausted",
            Self::Cancelled => "cancelled",
            Self::RenderFailed => "render_failed",
            Self::ExtractionFailed => "extraction_failed",
            Self::ConversionFailed => "conversion_failed",
        }
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
