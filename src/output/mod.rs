//! Output module for census results
//!
//! This module handles:
//! - Persisting the aggregate snapshot as a JSON document
//! - Flattening a results document into summary and detail CSV tables
//! - Building and printing the final report
//! - Human-readable size formatting

mod csv_export;
pub mod format;
mod persist;
mod report;
mod traits;

pub use csv_export::{count_groups, export_csv, ExportCounts, GROUP_COLUMN};
pub use format::{format_bytes, format_count};
pub use persist::{load_snapshot, JsonPersister};
pub use report::{generate_report, print_report, CensusReport, GroupTotal, TOP_N};
pub use traits::{OutputError, OutputResult, Persister};
