//! Crawler module for listing fetching and processing
//!
//! This module contains the core census logic, including:
//! - HTTP fetching behind a transport seam, with a composable retry policy
//! - Directory listing parsing
//! - The fixed-width worker pool
//! - Cooperative shutdown on interrupt
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod interrupt;
mod parser;
mod retry;
mod scheduler;

pub use coordinator::{run_census, CensusOutcome, Coordinator};
pub use fetcher::{
    build_http_client, FetchError, FetchOutcome, HttpTransport, ListingFetcher, ListingTransport,
    TransportResponse,
};
pub use interrupt::{InterruptHandler, Shutdown, TriggerAction};
pub use parser::{parse_listing, parse_size};
pub use retry::{Attempt, RetryExhausted, RetryPolicy};
pub use scheduler::{FailedItem, RunStats, WorkScheduler};
