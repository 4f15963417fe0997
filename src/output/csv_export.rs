//! Tabular export of a results document
//!
//! Produces the two CSV tables downstream analysis expects: one summary row
//! per `(group, sub)` entry and one detail row per listed file.

use crate::output::format::format_bytes;
use crate::output::traits::{OutputError, OutputResult};
use crate::state::AggregateSnapshot;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Column holding the group key in both tables
pub const GROUP_COLUMN: &str = "jurisdiction";

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    jurisdiction: &'a str,
    volume: &'a str,
    file_count: u64,
    total_size_bytes: u64,
    total_size_formatted: String,
    avg_file_size_bytes: u64,
    avg_file_size_formatted: String,
}

#[derive(Debug, Serialize)]
struct DetailRow<'a> {
    jurisdiction: &'a str,
    volume: &'a str,
    filename: &'a str,
    size_bytes: u64,
    size_formatted: &'a str,
    last_modified: &'a str,
}

/// Row counts written by [`export_csv`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportCounts {
    pub summary_rows: u64,
    pub detail_rows: u64,
    pub total_files: u64,
    pub total_bytes: u64,
}

/// Writes the summary and detail tables for a snapshot
pub fn export_csv(
    snapshot: &AggregateSnapshot,
    summary_path: &Path,
    detailed_path: &Path,
) -> OutputResult<ExportCounts> {
    let mut counts = ExportCounts::default();

    let mut summary = csv::Writer::from_path(summary_path)?;
    for (group, sub, result) in snapshot.entries() {
        let average = result.average_file_size();
        summary.serialize(SummaryRow {
            jurisdiction: group,
            volume: sub,
            file_count: result.file_count,
            total_size_bytes: result.total_size_bytes,
            total_size_formatted: format_bytes(result.total_size_bytes),
            avg_file_size_bytes: average,
            avg_file_size_formatted: format_bytes(average),
        })?;

        counts.summary_rows += 1;
        counts.total_files += result.file_count;
        counts.total_bytes += result.total_size_bytes;
    }
    summary.flush()?;

    let mut detailed = csv::Writer::from_path(detailed_path)?;
    for (group, sub, result) in snapshot.entries() {
        for file in &result.details {
            detailed.serialize(DetailRow {
                jurisdiction: group,
                volume: sub,
                filename: &file.filename,
                size_bytes: file.size_bytes,
                size_formatted: &file.size_display,
                last_modified: &file.last_modified,
            })?;
            counts.detail_rows += 1;
        }
    }
    detailed.flush()?;

    Ok(counts)
}

/// Counts the distinct non-empty group values in a summary CSV
pub fn count_groups(summary_path: &Path) -> OutputResult<usize> {
    let mut reader = csv::Reader::from_path(summary_path)?;

    let column = reader
        .headers()?
        .iter()
        .position(|h| h == GROUP_COLUMN)
        .ok_or_else(|| {
            OutputError::Format(format!(
                "{} has no '{}' column",
                summary_path.display(),
                GROUP_COLUMN
            ))
        })?;

    let mut groups = HashSet::new();
    for record in reader.records() {
        let record = record?;
        if let Some(group) = record.get(column).map(str::trim) {
            if !group.is_empty() {
                groups.insert(group.to_string());
            }
        }
    }

    Ok(groups.len())
}
