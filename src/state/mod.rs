//! State module for a census run
//!
//! # Components
//!
//! - `WorkItem`, `FileRecord`, `VolumeResult`: the immutable records a run produces
//! - `ItemState`: the terminal outcome of each dispatched work item
//! - `Aggregator`: the single guarded owner of the shared aggregate

mod aggregator;
mod item_state;
mod records;

// Re-export main types
pub use aggregator::{AggregateSnapshot, AggregateState, Aggregator, RunningTotals};
pub use item_state::ItemState;
pub use records::{FileRecord, VolumeResult, WorkItem};
