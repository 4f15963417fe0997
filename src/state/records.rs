//! Core data records: work items, file records and per-volume results

use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of crawl work: a `(group, sub)` pair such as reporter/volume
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkItem {
    /// Group identifier (reporter slug)
    pub group_key: String,

    /// Sub-key within the group (volume number)
    pub sub_key: String,
}

impl WorkItem {
    pub fn new(group_key: impl Into<String>, sub_key: impl Into<String>) -> Self {
        Self {
            group_key: group_key.into(),
            sub_key: sub_key.into(),
        }
    }

    /// Relative path of the listing for this item: `{group}/{sub}/cases/`
    pub fn listing_path(&self) -> String {
        format!("{}/{}/cases/", self.group_key, self.sub_key)
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group_key, self.sub_key)
    }
}

/// One file named by a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,

    /// Size in bytes as parsed from the display string
    pub size_bytes: u64,

    /// Size exactly as the listing displayed it (e.g. `"20.18 KB"`)
    #[serde(rename = "size_str")]
    pub size_display: String,

    pub last_modified: String,
}

/// File count, byte total and file details for one listing
///
/// Built through [`VolumeResult::from_records`] so that `file_count` always
/// equals `details.len()` and `total_size_bytes` the sum of their sizes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VolumeResult {
    #[serde(rename = "files", default)]
    pub file_count: u64,

    #[serde(rename = "size", default)]
    pub total_size_bytes: u64,

    #[serde(default)]
    pub details: Vec<FileRecord>,
}

impl VolumeResult {
    pub fn from_records(details: Vec<FileRecord>) -> Self {
        let total_size_bytes = details.iter().map(|r| r.size_bytes).sum();
        Self {
            file_count: details.len() as u64,
            total_size_bytes,
            details,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }

    /// Integer-truncated average file size, zero for an empty result
    pub fn average_file_size(&self) -> u64 {
        if self.file_count > 0 {
            self.total_size_bytes / self.file_count
        } else {
            0
        }
    }
}
