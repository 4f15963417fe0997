//! Census coordinator - run orchestration
//!
//! This module ties one run together:
//! - Building the transport, fetcher, aggregator and scheduler from config
//! - Driving the scheduler over the work item list
//! - Flushing the aggregate snapshot exactly once, complete or interrupted
//! - Producing the final report

use crate::config::Config;
use crate::crawler::fetcher::{HttpTransport, ListingFetcher, ListingTransport};
use crate::crawler::interrupt::{InterruptHandler, Shutdown};
use crate::crawler::scheduler::{RunStats, WorkScheduler};
use crate::output::{generate_report, CensusReport, JsonPersister, Persister};
use crate::state::{AggregateSnapshot, Aggregator, WorkItem};
use crate::CensusError;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Everything a finished (or interrupted) run produced
#[derive(Debug, Clone)]
pub struct CensusOutcome {
    pub stats: RunStats,
    pub report: CensusReport,
    pub snapshot: AggregateSnapshot,
    pub started_at: DateTime<Utc>,
}

impl CensusOutcome {
    /// `true` if every work item was dispatched
    pub fn is_complete(&self) -> bool {
        !self.stats.interrupted
    }
}

/// Main census coordinator structure
pub struct Coordinator<T> {
    config: Arc<Config>,
    scheduler: WorkScheduler<T>,
    aggregator: Arc<Aggregator>,
}

impl Coordinator<HttpTransport> {
    /// Creates a coordinator that fetches over HTTP
    ///
    /// # Arguments
    ///
    /// * `config` - The census configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CensusError)` - The HTTP client or base URL could not be built
    pub fn new(config: Config) -> Result<Self, CensusError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: ListingTransport + 'static> Coordinator<T> {
    /// Creates a coordinator over an arbitrary transport
    pub fn with_transport(config: Config, transport: T) -> Self {
        let fetcher = Arc::new(ListingFetcher::from_config(transport, &config));
        let aggregator = Arc::new(Aggregator::new());
        let scheduler = WorkScheduler::new(
            fetcher,
            Arc::clone(&aggregator),
            config.crawler.max_workers,
            config.crawler.progress_interval,
        );

        Self {
            config: Arc::new(config),
            scheduler,
            aggregator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    /// Runs the census over `items`
    ///
    /// Dispatch stops early once `shutdown` starts draining. Either way the
    /// snapshot is flushed through `persister` once, after the last worker has
    /// exited.
    ///
    /// # Returns
    ///
    /// * `Ok(CensusOutcome)` - Run finished and the snapshot was persisted
    /// * `Err(CensusError)` - The snapshot could not be persisted
    pub async fn run(
        &self,
        items: Vec<WorkItem>,
        shutdown: &Shutdown,
        persister: &dyn Persister,
    ) -> Result<CensusOutcome, CensusError> {
        let started_at = Utc::now();
        tracing::info!(
            "Starting census of {} work items with {} workers against {}",
            items.len(),
            self.config.crawler.max_workers,
            self.config.crawler.base_url
        );

        let stats = self.scheduler.run(items, shutdown).await;

        if stats.interrupted {
            tracing::warn!(
                "Dispatch stopped early: {} of {} work items processed",
                stats.processed,
                stats.total_items
            );
        } else {
            tracing::info!(
                "All {} work items processed in {:.2?}",
                stats.total_items,
                stats.elapsed
            );
        }

        let snapshot = self.aggregator.snapshot();
        persister.flush(&snapshot)?;
        tracing::info!(
            "Saved {} directory results to {}",
            snapshot.len(),
            persister.describe()
        );

        let report = generate_report(&snapshot);

        Ok(CensusOutcome {
            stats,
            report,
            snapshot,
            started_at,
        })
    }
}

/// Runs a complete census over HTTP with Ctrl-C handling installed
///
/// The first Ctrl-C drains the pool and the second abandons in-flight
/// listings; in both cases the partial snapshot is written to
/// `output.results-path` before this function returns.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use volume_census::config::load_config;
/// use volume_census::crawler::run_census;
/// use volume_census::metadata::{extract_work_items, load_volumes};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("census.toml"))?;
/// let volumes = load_volumes(Path::new(&config.input.volumes_path))?;
/// let outcome = run_census(config, extract_work_items(&volumes)).await?;
/// println!("{} files", outcome.report.total_files);
/// # Ok(())
/// # }
/// ```
pub async fn run_census(
    config: Config,
    items: Vec<WorkItem>,
) -> Result<CensusOutcome, CensusError> {
    let persister = JsonPersister::new(&config.output.results_path);
    let coordinator = Coordinator::new(config)?;

    let handler = Arc::new(InterruptHandler::new(Shutdown::new()));
    let listener = Arc::clone(&handler).install();

    let outcome = coordinator.run(items, handler.shutdown(), &persister).await;
    listener.abort();
    outcome
}
