//! Configuration module for Volume Census
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All keys are optional; command-line overrides are layered on top by the binary.
//!
//! # Example
//!
//! ```no_run
//! use volume_census::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("census.toml")).unwrap();
//! println!("Crawling {} with {} workers", config.crawler.base_url, config.crawler.max_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, InputConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
