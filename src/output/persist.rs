//! JSON persistence of the aggregate snapshot
//!
//! The document maps `group -> sub -> {files, size, details}`; it is the
//! input of the CSV export and can be reloaded with [`load_snapshot`].

use crate::output::traits::{OutputResult, Persister};
use crate::state::AggregateSnapshot;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes the snapshot as pretty-printed JSON
///
/// The document is written to a sibling `.tmp` file and renamed into place,
/// so an interrupted write never leaves a truncated results file behind.
#[derive(Debug, Clone)]
pub struct JsonPersister {
    path: PathBuf,
}

impl JsonPersister {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Persister for JsonPersister {
    fn flush(&self, snapshot: &AggregateSnapshot) -> OutputResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();
        {
            let mut writer = BufWriter::new(File::create(&temp_path)?);
            serde_json::to_writer_pretty(&mut writer, snapshot)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!(
            "Persisted {} entries to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Reads a snapshot previously written by [`JsonPersister`]
pub fn load_snapshot(path: &Path) -> OutputResult<AggregateSnapshot> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
