//! Final report over an aggregate snapshot
//!
//! [`generate_report`] is a pure function of the snapshot. Run-level figures
//! (processed items, failures, coverage) come from the scheduler's
//! [`RunStats`] and are only combined at print time.

use crate::crawler::RunStats;
use crate::output::format::{format_bytes, format_count};
use crate::state::AggregateSnapshot;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Length of each ranked list
pub const TOP_N: usize = 10;

/// File and byte totals for one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTotal {
    pub group: String,
    pub files: u64,
    pub bytes: u64,
}

/// Totals and rankings derived from a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CensusReport {
    pub total_files: u64,
    pub total_bytes: u64,

    /// Integer-truncated; zero when no files were found
    pub average_file_size: u64,

    /// Number of recorded `(group, sub)` entries
    pub successful_directories: u64,

    /// Number of distinct groups with at least one entry
    pub group_count: u64,

    /// Top groups by file count, ties by ascending group
    pub top_by_files: Vec<GroupTotal>,

    /// Top groups by total bytes, ties by ascending group
    pub top_by_size: Vec<GroupTotal>,
}

/// Summarizes a snapshot
pub fn generate_report(snapshot: &AggregateSnapshot) -> CensusReport {
    let mut by_group: BTreeMap<&str, GroupTotal> = BTreeMap::new();
    let mut report = CensusReport::default();

    for (group, _sub, result) in snapshot.entries() {
        report.total_files += result.file_count;
        report.total_bytes += result.total_size_bytes;
        report.successful_directories += 1;

        let total = by_group.entry(group).or_insert_with(|| GroupTotal {
            group: group.to_string(),
            files: 0,
            bytes: 0,
        });
        total.files += result.file_count;
        total.bytes += result.total_size_bytes;
    }

    report.average_file_size = if report.total_files > 0 {
        report.total_bytes / report.total_files
    } else {
        0
    };

    let groups: Vec<GroupTotal> = by_group.into_values().filter(|g| g.files > 0).collect();
    report.group_count = groups.len() as u64;
    report.top_by_files = ranked(&groups, |g| g.files);
    report.top_by_size = ranked(&groups, |g| g.bytes);

    report
}

fn ranked(groups: &[GroupTotal], key: impl Fn(&GroupTotal) -> u64) -> Vec<GroupTotal> {
    let mut sorted = groups.to_vec();
    sorted.sort_by(|a, b| match key(b).cmp(&key(a)) {
        Ordering::Equal => a.group.cmp(&b.group),
        other => other,
    });
    sorted.truncate(TOP_N);
    sorted
}

/// Prints the final report to stdout
pub fn print_report(report: &CensusReport, stats: &RunStats) {
    let rule = "=".repeat(60);

    println!("\n{}", rule);
    if stats.interrupted {
        println!("PARTIAL REPORT (interrupted)");
    } else {
        println!("FINAL REPORT");
    }
    println!("{}", rule);

    println!("Total files found: {}", format_count(report.total_files));
    println!("Total size: {}", format_bytes(report.total_bytes));
    println!(
        "Average file size: {}",
        format_bytes(report.average_file_size)
    );
    println!(
        "Successful directories: {}",
        format_count(report.successful_directories)
    );
    println!("Groups with files: {}", format_count(report.group_count));
    println!(
        "Failed/empty requests: {} ({} failed, {} empty, {} not found)",
        format_count(stats.processed.saturating_sub(report.successful_directories)),
        format_count(stats.failed_count()),
        format_count(stats.empty),
        format_count(stats.absent)
    );
    println!(
        "Total combinations processed: {} of {} ({:.1}% coverage)",
        format_count(stats.processed),
        format_count(stats.total_items),
        stats.coverage_percent()
    );
    if stats.abandoned > 0 || stats.not_dispatched() > 0 {
        println!(
            "Not completed: {} abandoned in flight, {} never dispatched",
            format_count(stats.abandoned),
            format_count(stats.not_dispatched())
        );
    }
    println!(
        "Elapsed: {:.2}s ({:.2} requests/second)",
        stats.elapsed.as_secs_f64(),
        stats.items_per_second()
    );

    if !report.top_by_files.is_empty() {
        println!("\nTop {} by File Count:", TOP_N);
        for (i, group) in report.top_by_files.iter().enumerate() {
            println!(
                "{:2}. {}: {} files, {}",
                i + 1,
                group.group,
                format_count(group.files),
                format_bytes(group.bytes)
            );
        }

        println!("\nTop {} by Total Size:", TOP_N);
        for (i, group) in report.top_by_size.iter().enumerate() {
            println!(
                "{:2}. {}: {} ({} files)",
                i + 1,
                group.group,
                format_bytes(group.bytes),
                format_count(group.files)
            );
        }
    }

    if !stats.failed.is_empty() {
        println!("\nFailed listings ({}):", stats.failed.len());
        for failed in &stats.failed {
            println!("  - {}: {}", failed.item, failed.reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Aggregator, FileRecord, VolumeResult};

    fn result(files: u64, bytes_each: u64) -> VolumeResult {
        VolumeResult::from_records(
            (0..files)
                .map(|i| FileRecord {
                    filename: format!("{}.json", i),
                    size_bytes: bytes_each,
                    size_display: String::new(),
                    last_modified: String::new(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_empty_snapshot() {
        let report = generate_report(&AggregateSnapshot::default());

        assert_eq!(report.total_files, 0);
        assert_eq!(report.total_bytes, 0);
        assert_eq!(report.average_file_size, 0);
        assert!(report.top_by_files.is_empty());
        assert!(report.top_by_size.is_empty());
    }

    #[test]
    fn test_totals_and_truncated_average() {
        let aggregator = Aggregator::new();
        aggregator.record("us", "1", result(2, 5));
        aggregator.record("us", "2", result(1, 1));

        let report = generate_report(&aggregator.snapshot());
        assert_eq!(report.total_files, 3);
        assert_eq!(report.total_bytes, 11);
        assert_eq!(report.average_file_size, 3);
        assert_eq!(report.successful_directories, 2);
        assert_eq!(report.group_count, 1);
    }

    #[test]
    fn test_rankings_group_by_group_key() {
        let aggregator = Aggregator::new();
        aggregator.record("small-many", "1", result(5, 1));
        aggregator.record("small-many", "2", result(5, 1));
        aggregator.record("big-few", "1", result(2, 1000));
        aggregator.record("mid", "1", result(3, 10));

        let report = generate_report(&aggregator.snapshot());

        let by_files: Vec<_> = report.top_by_files.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(by_files, vec!["small-many", "mid", "big-few"]);
        assert_eq!(report.top_by_files[0].files, 10);

        let by_size: Vec<_> = report.top_by_size.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(by_size, vec!["big-few", "mid", "small-many"]);
        assert_eq!(report.top_by_size[0].bytes, 2000);
    }

    #[test]
    fn test_ties_break_by_ascending_group() {
        let aggregator = Aggregator::new();
        for group in ["delta", "alpha", "charlie", "bravo"] {
            aggregator.record(group, "1", result(4, 4));
        }

        let report = generate_report(&aggregator.snapshot());
        let order: Vec<_> = report.top_by_files.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(order, vec!["alpha", "bravo", "charlie", "delta"]);
        assert_eq!(report.top_by_files, report.top_by_size);
    }

    #[test]
    fn test_rankings_truncated_to_top_n() {
        let aggregator = Aggregator::new();
        for i in 0..15u64 {
            aggregator.record(format!("g{:02}", i), "1", result(i + 1, 1));
        }

        let report = generate_report(&aggregator.snapshot());
        assert_eq!(report.top_by_files.len(), TOP_N);
        assert_eq!(report.top_by_files[0].group, "g14");
        assert_eq!(report.top_by_files[9].group, "g05");
        assert_eq!(report.group_count, 15);
    }
}
