//! Ingestion pipeline coordinator
//!
//! This module composes one pipeline pass:
//! - Walking the configured listing pages sequentially
//! - Extracting summary records from each page
//! - Handing the concatenated records to the enrichment orchestrator

use crate::config::Config;
use crate::crawler::enrich::Enricher;
use crate::crawler::fetcher::{build_http_client, PageFetcher, RetryPolicy};
use crate::crawler::listing::parse_listing;
use crate::record::{MergedRecord, SummaryRecord};
use crate::IngestError;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Main pipeline coordinator
#[derive(Debug, Clone)]
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: PageFetcher,
    enricher: Enricher,
}

impl Coordinator {
    /// Creates a coordinator with its own HTTP client
    ///
    /// Idle connections are capped at the enrichment concurrency.
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(IngestError)` - The HTTP client could not be built
    pub fn new(config: Arc<Config>) -> Result<Self, IngestError> {
        let client = build_http_client(&config.http, config.enrichment.concurrency as usize)?;
        let fetcher = PageFetcher::new(client, RetryPolicy::from_config(&config.retry));
        let enricher = Enricher::new(fetcher.clone(), &config);

        Ok(Self {
            config,
            fetcher,
            enricher,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetches and parses every listing page in order
    ///
    /// A page that cannot be fetched is logged and contributes nothing.
    ///
    /// # Returns
    ///
    /// * `Ok(records)` - Summary records of all reachable pages, page order kept
    /// * `Err(IngestError::ListingUnreachable)` - No page could be fetched
    pub async fn collect_listings(&self) -> Result<Vec<SummaryRecord>, IngestError> {
        let source = &self.config.source;
        let timeout = Duration::from_secs(self.config.http.listing_timeout_secs);
        let page_delay = Duration::from_millis(source.page_delay_ms);

        let mut records = Vec::new();
        let mut failed_pages = 0;

        for (position, page) in source.pages.iter().enumerate() {
            if position > 0 && !page_delay.is_zero() {
                tokio::time::sleep(page_delay).await;
            }

            let url = source.listing_url(*page);
            let base_url = Url::parse(&url)?;
            tracing::info!("Fetching listing page {}: {}", page, url);

            match self.fetcher.fetch(&url, timeout).await {
                Ok(html) => {
                    let page_records = parse_listing(&html, &base_url);
                    tracing::info!("Page {}: {} records", page, page_records.len());
                    records.extend(page_records);
                }
                Err(e) => {
                    failed_pages += 1;
                    tracing::warn!("Listing page {} skipped: {}", page, e);
                }
            }
        }

        if failed_pages == source.pages.len() {
            return Err(IngestError::ListingUnreachable {
                pages: failed_pages,
            });
        }

        Ok(records)
    }

    /// Runs listing collection followed by enrichment
    ///
    /// # Returns
    ///
    /// Merged records in listing order
    pub async fn run_pipeline(&self) -> Result<Vec<MergedRecord>, IngestError> {
        let summaries = self.collect_listings().await?;
        tracing::info!("Collected {} summary records", summaries.len());
        Ok(self.enricher.enrich(summaries).await)
    }
}
