//! Per-item outcomes and run reports
//!
//! `Display` on each outcome renders the one-line message logged as the worker finishes.

use std::fmt;
use std::path::PathBuf;

/// Disposition of one item in the primary pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Record had no usable shortcode; nothing written
    Skipped { handle: String },
    /// Completed file already existed; no request made
    Cached { handle: String },
    /// Enriched record written to the completed namespace
    Saved { handle: String, path: PathBuf },
    /// Lookup or save failed; `path` is the failed-namespace copy, if it was written
    Failed {
        handle: String,
        cause: String,
        path: Option<PathBuf>,
    },
}

impl ItemOutcome {
    pub fn handle(&self) -> &str {
        match self {
            Self::Skipped { handle }
            | Self::Cached { handle }
            | Self::Saved { handle, .. }
            | Self::Failed { handle, .. } => handle,
        }
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped { handle } => {
                write!(f, "Skipping post for handle {} (no shortcode)", handle)
            }
            Self::Cached { handle } => write!(f, "{} - Already processed", handle),
            Self::Saved { handle, path } => write!(f, "{} saved to {}", handle, path.display()),
            Self::Failed {
                handle,
                cause,
                path: Some(path),
            } => write!(f, "{} - {}, saved to {}", handle, cause, path.display()),
            Self::Failed {
                handle,
                cause,
                path: None,
            } => write!(f, "{} - {}, not saved", handle, cause),
        }
    }
}

/// Disposition of one item in the retry pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Moved from the failed to the completed namespace
    Recovered { handle: String, path: PathBuf },
    /// Lookup failed again; failed file left in place
    StillFailing { handle: String, cause: String },
    /// The attempt itself broke (unreadable record, worker panic, save failure)
    Error { handle: String, cause: String },
}

impl fmt::Display for RetryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recovered { handle, path } => write!(
                f,
                "{} - Successfully retried and saved to {}",
                handle,
                path.display()
            ),
            Self::StillFailing { handle, cause } => {
                write!(f, "{} - Still no display URL ({})", handle, cause)
            }
            Self::Error { handle, cause } => write!(f, "{} - Error on retry: {}", handle, cause),
        }
    }
}

/// Result of a primary pass, outcomes in completion order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Items dropped by the resume point
    pub resumed_past: usize,
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn saved(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Saved { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    pub fn cached(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Cached { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Result of a retry pass, outcomes in completion order
#[derive(Debug, Clone, Default)]
pub struct RetryReport {
    pub outcomes: Vec<RetryOutcome>,
}

impl RetryReport {
    pub fn recovered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RetryOutcome::Recovered { .. }))
            .count()
    }

    /// Items still sitting in the failed namespace after this pass
    pub fn remaining(&self) -> usize {
        self.outcomes.len() - self.recovered()
    }
}
