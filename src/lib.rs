//! Volume Census: a concurrent directory-listing counter
//!
//! This crate walks a large catalog of static per-volume file listings
//! (`{reporter}/{volume}/cases/`), counts and sizes the files each listing
//! names, and aggregates the results into a nested summary that can be
//! persisted as JSON and flattened to CSV.

pub mod config;
pub mod crawler;
pub mod metadata;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for Volume Census operations
#[derive(Debug, Error)]
pub enum CensusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Startup error: {0}")]
    Startup(#[from] StartupError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while loading the metadata inputs, before any work is scheduled
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Metadata file not found: {path}")]
    Missing { path: String },

    #[error("Failed to read metadata file {path}: {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed metadata in {path}: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },
}

/// Result type alias for Volume Census operations
pub type Result<T> = std::result::Result<T, CensusError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, ListingFetcher, RetryPolicy, WorkScheduler};
pub use metadata::{extract_work_items, VolumeMetadata};
pub use state::{AggregateSnapshot, Aggregator, FileRecord, VolumeResult, WorkItem};
