//! Crawler module for tender ingestion
//!
//! This module contains the ingestion pipeline, including:
//! - HTTP fetching with retry logic
//! - Listing and detail page extraction
//! - Bounded-concurrency enrichment
//! - On-demand and periodic refresh

mod coordinator;
mod detail;
mod enrich;
mod fetcher;
mod listing;
mod refresh;
mod scheduler;
mod text;

pub use coordinator::Coordinator;
pub use detail::{classify, classify_and_extract};
pub use enrich::Enricher;
pub use fetcher::{build_http_client, is_retryable, FetchError, PageFetcher, RetryPolicy};
pub use listing::parse_listing;
pub use refresh::{RefreshSummary, Refresher};
pub use scheduler::Scheduler;

use crate::config::Config;
use crate::storage::TenderStore;
use crate::IngestError;
use std::sync::{Arc, Mutex};

/// Wires a refresher from configuration
///
/// This is the main entry point for running refreshes. It will:
/// 1. Build the HTTP client sized to the enrichment concurrency
/// 2. Set up the listing fetcher and the enrichment orchestrator
/// 3. Attach the shared store
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `store` - Ledger backend
/// * `config_hash` - Recorded with every journaled run
///
/// # Returns
///
/// * `Ok(Refresher)` - Ready to refresh
/// * `Err(IngestError)` - The HTTP client could not be built
pub fn build_refresher<S: TenderStore>(
    config: Config,
    store: Arc<Mutex<S>>,
    config_hash: String,
) -> Result<Refresher<S>, IngestError> {
    let coordinator = Coordinator::new(Arc::new(config))?;
    Ok(Refresher::new(coordinator, store, config_hash))
}
