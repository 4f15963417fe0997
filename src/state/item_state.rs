//! Outcome definitions for processed work items
//!
//! Every work item the scheduler dispatches ends in exactly one of these states.

use std::fmt;

/// Terminal state of a single work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    /// Listing fetched and at least one file recorded
    Recorded,

    /// Listing fetched but no qualifying rows (includes unparseable listings)
    Empty,

    /// Listing does not exist (HTTP 404); expected, not an error
    Absent,

    /// Retry budget exhausted
    Failed,

    /// Dispatched but abandoned by a forced shutdown
    Abandoned,
}

impl ItemState {
    /// Returns true if the item counts as processed in progress figures
    pub fn is_processed(&self) -> bool {
        !matches!(self, Self::Abandoned)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recorded => "recorded",
            Self::Empty => "empty",
            Self::Absent => "absent",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
