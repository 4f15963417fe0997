use serde::Deserialize;

/// Main configuration structure for Volume Census
///
/// Every section falls back to its defaults, so an empty (or absent) file
/// yields a runnable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Root of the static listing host; work item paths are joined onto it
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Number of concurrent listing workers
    #[serde(rename = "max-workers")]
    pub max_workers: usize,

    /// Attempts allotted to a single listing before it is marked failed
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Backoff unit between attempts (milliseconds), multiplied by the attempt index
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Delay before every request (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Emit a progress line every N completed work items
    #[serde(rename = "progress-interval")]
    pub progress_interval: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://static.case.law/".to_string(),
            max_workers: 20,
            max_retries: 3,
            request_timeout_secs: 10,
            retry_backoff_ms: 1000,
            request_delay_ms: 50,
            progress_interval: 100,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "VolumeCensus".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/volume-census/volume-census".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Metadata input locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// JSON array of volume records carrying `reporter_slug` / `volume_number`
    #[serde(rename = "volumes-path")]
    pub volumes_path: String,

    /// JSON array of reporter records (only counted)
    #[serde(rename = "reporters-path")]
    pub reporters_path: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            volumes_path: "VolumesMetadata.json".to_string(),
            reporters_path: "ReportersMetadata.json".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the persisted JSON results document
    #[serde(rename = "results-path")]
    pub results_path: String,

    /// Path to the per-volume summary CSV
    #[serde(rename = "summary-csv-path")]
    pub summary_csv_path: String,

    /// Path to the per-file detail CSV
    #[serde(rename = "detailed-csv-path")]
    pub detailed_csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: "caselaw_file_counts_parallel_fixed.json".to_string(),
            summary_csv_path: "caselaw_summary.csv".to_string(),
            detailed_csv_path: "caselaw_detailed.csv".to_string(),
        }
    }
}
