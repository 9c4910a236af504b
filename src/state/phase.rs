/// Lifecycle phases of a single crawl
///
/// A crawl only moves forward: `Seeded → Running → Draining → Done`.
use std::fmt;

/// Represents the current phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CrawlPhase {
    /// Start URL normalized and placed in the frontier at depth 0
    Seeded,

    /// Dispatch loop is handing frontier entries to workers
    Running,

    /// Page budget reached, frontier quiescent, or crawl cancelled;
    /// workers finish their current item and exit
    Draining,

    /// All workers have exited and the dispatch loop has returned
    Done,
}

impl CrawlPhase {
    /// Returns true if the crawl may move from `self` to `next`
    ///
    /// Phases advance one step at a time, except that a crawl cancelled
    /// before its first dispatch goes straight from `Seeded` to `Draining`.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Seeded, Self::Running)
                | (Self::Seeded, Self::Draining)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeded => "seeded",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(CrawlPhase::Seeded.can_transition_to(CrawlPhase::Running));
        assert!(CrawlPhase::Running.can_transition_to(CrawlPhase::Draining));
        assert!(CrawlPhase::Draining.can_transition_to(CrawlPhase::Done));
        assert!(CrawlPhase::Seeded.can_transition_to(CrawlPhase::Draining));
    }

    #[test]
    fn test_no_backward_or_skipping_transitions() {
        assert!(!CrawlPhase::Running.can_transition_to(CrawlPhase::Seeded));
        assert!(!CrawlPhase::Done.can_transition_to(CrawlPhase::Running));
        assert!(!CrawlPhase::Running.can_transition_to(CrawlPhase::Done));
        assert!(!CrawlPhase::Draining.can_transition_to(CrawlPhase::Running));
    }

    #[test]
    fn test_ordering_follows_lifecycle() {
        assert!(CrawlPhase::Seeded < CrawlPhase::Running);
        assert!(CrawlPhase::Running < CrawlPhase::Draining);
        assert!(CrawlPhase::Draining < CrawlPhase::Done);
    }

    #[test]
    fn test_display() {
        assert_eq!(CrawlPhase::Draining.to_string(), "draining");
    }
}
