/// Scrape status definitions for tracking harvest progress
///
/// This module defines all possible states a discovered URL can be in during
/// the harvest process, and which transitions between them are legal.
use std::fmt;

/// Represents the current state of a discovered URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrapeStatus {
    /// URL has been discovered in the directory but not yet scraped
    Pending,

    /// Profile page was scraped and yielded a non-empty free-text body
    Completed,

    /// Profile page was scraped but its free-text body was empty
    CompletedNoContent,

    /// All scrape attempts were exhausted; requires an explicit requeue
    Failed,
}

impl ScrapeStatus {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if this represents a successful scrape
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::CompletedNoContent)
    }

    /// Returns true if a URL in state `self` may legally move to `to`
    ///
    /// Legal transitions:
    /// - `Pending` may resolve to any terminal state.
    /// - Both completed states may be re-scraped, landing on any terminal
    ///   state again ("latest scrape wins").
    /// - `Failed` may only return to `Pending`, and only through the
    ///   explicit requeue operation. A failed URL never jumps straight to a
    ///   completed state without a fresh attempt from `Pending`.
    pub fn can_transition(&self, to: ScrapeStatus) -> bool {
        use ScrapeStatus::*;
        matches!(
            (*self, to),
            (Pending, Completed | CompletedNoContent | Failed)
                | (
                    Completed | CompletedNoContent,
                    Completed | CompletedNoContent | Failed
                )
                | (Failed, Pending)
        )
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::CompletedNoContent => "completed_no_content",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "completed_no_content" => Some(Self::CompletedNoContent),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Completed,
            Self::CompletedNoContent,
            Self::Failed,
        ]
    }
}

impl fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
