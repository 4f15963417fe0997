//! Work scheduler: a fixed-width worker pool over the work item queue
//!
//! This module handles:
//! - Distributing work items across `max-workers` concurrent tasks
//! - Running fetch -> parse -> record for each item
//! - Isolating per-item failures from the rest of the run
//! - Periodic progress reporting
//! - Honouring the drain/abort tokens of a [`Shutdown`]

use crate::crawler::fetcher::{FetchOutcome, ListingFetcher, ListingTransport};
use crate::crawler::interrupt::Shutdown;
use crate::crawler::parser::parse_listing;
use crate::output::format_bytes;
use crate::state::{Aggregator, ItemState, VolumeResult, WorkItem};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// A work item whose retry budget ran out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub item: WorkItem,
    pub reason: String,
}

/// Per-run counters gathered from all workers
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Work items handed to the scheduler
    pub total_items: u64,

    /// Items that reached a terminal state (recorded, empty, absent or failed)
    pub processed: u64,

    /// Listings that contributed an aggregate entry
    pub recorded: u64,

    /// Listings fetched with no qualifying rows
    pub empty: u64,

    /// Listings that do not exist
    pub absent: u64,

    /// Items whose retry budget ran out
    pub failed: Vec<FailedItem>,

    /// Items abandoned mid-flight by a forced shutdown
    pub abandoned: u64,

    /// An interrupt left work items abandoned or never dispatched
    pub interrupted: bool,

    pub elapsed: Duration,
}

impl RunStats {
    pub fn failed_count(&self) -> u64 {
        self.failed.len() as u64
    }

    /// Items never dispatched because the run was interrupted
    pub fn not_dispatched(&self) -> u64 {
        self.total_items
            .saturating_sub(self.processed)
            .saturating_sub(self.abandoned)
    }

    /// Share of work items processed, in percent
    pub fn coverage_percent(&self) -> f64 {
        if self.total_items == 0 {
            return 100.0;
        }
        self.processed as f64 / self.total_items as f64 * 100.0
    }

    /// Average processing rate in items per second
    pub fn items_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }

    fn absorb(&mut self, tally: WorkerTally) {
        self.recorded += tally.recorded;
        self.empty += tally.empty;
        self.absent += tally.absent;
        self.abandoned += tally.abandoned;
        self.failed.extend(tally.failed);
    }
}

/// Counts kept locally by one worker and merged when it exits
#[derive(Debug, Default)]
struct WorkerTally {
    recorded: u64,
    empty: u64,
    absent: u64,
    abandoned: u64,
    failed: Vec<FailedItem>,
}

impl WorkerTally {
    fn count(&mut self, item: WorkItem, state: ItemState, reason: Option<String>) {
        match state {
            ItemState::Recorded => self.recorded += 1,
            ItemState::Empty => self.empty += 1,
            ItemState::Absent => self.absent += 1,
            ItemState::Abandoned => self.abandoned += 1,
            ItemState::Failed => self.failed.push(FailedItem {
                item,
                reason: reason.unwrap_or_default(),
            }),
        }
    }
}

/// State shared by all workers of one run
struct RunContext<T> {
    fetcher: Arc<ListingFetcher<T>>,
    aggregator: Arc<Aggregator>,
    queue: Mutex<VecDeque<WorkItem>>,
    processed: AtomicU64,
    total_items: u64,
    progress_interval: u64,
    shutdown: Shutdown,
}

/// Fixed-width pool that drives every work item through fetch, parse and record
pub struct WorkScheduler<T> {
    fetcher: Arc<ListingFetcher<T>>,
    aggregator: Arc<Aggregator>,
    workers: usize,
    progress_interval: u64,
}

impl<T: ListingTransport + 'static> WorkScheduler<T> {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Listing fetcher shared by all workers
    /// * `aggregator` - Destination of every recorded listing
    /// * `workers` - Pool width (clamped to at least 1)
    /// * `progress_interval` - Emit a progress line every N completions
    pub fn new(
        fetcher: Arc<ListingFetcher<T>>,
        aggregator: Arc<Aggregator>,
        workers: usize,
        progress_interval: u64,
    ) -> Self {
        Self {
            fetcher,
            aggregator,
            workers: workers.max(1),
            progress_interval: progress_interval.max(1),
        }
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    /// Processes `items` until the queue is empty or `shutdown` stops dispatch
    ///
    /// Completion order is unspecified. A failing item never stops the run;
    /// it is reported in [`RunStats::failed`].
    pub async fn run(&self, items: Vec<WorkItem>, shutdown: &Shutdown) -> RunStats {
        let start = Instant::now();
        let total_items = items.len() as u64;
        let width = self.workers.min(items.len()).max(1);

        let context = Arc::new(RunContext {
            fetcher: Arc::clone(&self.fetcher),
            aggregator: Arc::clone(&self.aggregator),
            queue: Mutex::new(VecDeque::from(items)),
            processed: AtomicU64::new(0),
            total_items,
            progress_interval: self.progress_interval,
            shutdown: shutdown.clone(),
        });

        tracing::debug!("Starting {} workers for {} work items", width, total_items);

        let mut workers = JoinSet::new();
        for worker_id in 0..width {
            workers.spawn(run_worker(worker_id, Arc::clone(&context)));
        }

        let mut stats = RunStats {
            total_items,
            ..RunStats::default()
        };

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(tally) => stats.absorb(tally),
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }

        stats.processed = context.processed.load(Ordering::SeqCst);
        stats.interrupted =
            shutdown.is_draining() && (stats.abandoned > 0 || stats.not_dispatched() > 0);
        stats.elapsed = start.elapsed();
        stats
    }
}

/// Pulls items until the queue is empty or dispatch is stopped
async fn run_worker<T: ListingTransport>(worker_id: usize, context: Arc<RunContext<T>>) -> WorkerTally {
    let mut tally = WorkerTally::default();

    loop {
        if context.shutdown.is_draining() {
            break;
        }

        let next = context.queue.lock().pop_front();
        let Some(item) = next else {
            break;
        };

        let (state, reason) = tokio::select! {
            biased;
            _ = context.shutdown.aborted() => (ItemState::Abandoned, None),
            outcome = process_item(&context.fetcher, &context.aggregator, &item) => outcome,
        };

        if state.is_processed() {
            report_progress(&context);
        }
        tally.count(item, state, reason);

        if state == ItemState::Abandoned {
            break;
        }
    }

    tracing::trace!("Worker {} exiting", worker_id);
    tally
}

/// Runs one work item end to end
///
/// Fetching and parsing happen outside the aggregator lock; only the final
/// `record` call takes it.
async fn process_item<T: ListingTransport>(
    fetcher: &ListingFetcher<T>,
    aggregator: &Aggregator,
    item: &WorkItem,
) -> (ItemState, Option<String>) {
    match fetcher.fetch(item).await {
        Ok(FetchOutcome::Listing(body)) => {
            let result = VolumeResult::from_records(parse_listing(&body));

            if result.is_empty() {
                tracing::debug!("{}/cases/: no files listed", item);
                return (ItemState::Empty, None);
            }

            let (files, bytes) = (result.file_count, result.total_size_bytes);
            aggregator.record(item.group_key.as_str(), item.sub_key.as_str(), result);
            tracing::info!("✓ {}/cases/: {} files, {}", item, files, format_bytes(bytes));
            (ItemState::Recorded, None)
        }
        Ok(FetchOutcome::Absent) => {
            tracing::debug!("{}/cases/: not found", item);
            (ItemState::Absent, None)
        }
        Err(e) => {
            tracing::error!("❌ Error for {}: {}", item, e.reason());
            (ItemState::Failed, Some(e.reason().to_string()))
        }
    }
}

fn report_progress<T>(context: &RunContext<T>) {
    let done = context.processed.fetch_add(1, Ordering::SeqCst) + 1;
    if done % context.progress_interval != 0 {
        return;
    }

    let totals = context.aggregator.totals();
    tracing::info!(
        "🔄 Progress: {}/{} processed, {} files found so far, {}",
        done,
        context.total_items,
        totals.files,
        format_bytes(totals.bytes)
    );
}
