//! Metadata inputs for a census run
//!
//! This module loads the already-published catalog metadata (volume and
//! reporter records) and derives the work item list from it. Any failure
//! here is a [`StartupError`] and aborts the run before scheduling.

mod combos;

pub use combos::extract_work_items;

use crate::StartupError;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::path::Path;

/// One volume record; only the fields that locate its listing are kept
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolumeMetadata {
    #[serde(default)]
    pub reporter_slug: Option<String>,

    #[serde(default)]
    pub volume_number: Option<VolumeNumber>,
}

/// A volume number as published: sometimes a string, sometimes a number
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum VolumeNumber {
    Text(String),
    Number(u64),
}

impl VolumeNumber {
    /// Path segment for this volume, or `None` when the value counts as missing
    pub fn as_segment(&self) -> Option<String> {
        match self {
            Self::Text(s) if s.is_empty() => None,
            Self::Text(s) => Some(s.clone()),
            Self::Number(0) => None,
            Self::Number(n) => Some(n.to_string()),
        }
    }
}

/// Loads the volume records from a JSON array
pub fn load_volumes(path: &Path) -> Result<Vec<VolumeMetadata>, StartupError> {
    load_json(path)
}

/// Counts the reporter records in a JSON array
///
/// The records themselves are skipped; only the count feeds the startup banner.
pub fn count_reporters(path: &Path) -> Result<usize, StartupError> {
    let reporters: Vec<IgnoredAny> = load_json(path)?;
    Ok(reporters.len())
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StartupError> {
    let display = path.display().to_string();

    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            StartupError::Missing {
                path: display.clone(),
            }
        } else {
            StartupError::Unreadable {
                path: display.clone(),
                source,
            }
        }
    })?;

    serde_json::from_str(&content).map_err(|source| StartupError::Malformed {
        path: display,
        source,
    })
}
