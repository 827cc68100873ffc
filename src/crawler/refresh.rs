//! On-demand refresh: one pipeline pass followed by the dedup ledger

use crate::crawler::coordinator::Coordinator;
use crate::ledger::upsert_new;
use crate::storage::{RunStatus, StorageError, TenderStore};
use crate::IngestError;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Outcome of one refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    /// Merged records produced by the pipeline
    pub parsed_total: usize,
    /// Records the ledger added (or would add, on a dry run)
    pub inserted_new: usize,
    /// Records whose detail page was fetched and classified
    pub enriched: usize,
    pub dry_run: bool,
}

/// Runs the pipeline and hands its output to the ledger
///
/// Live runs are recorded in the store's run journal; dry runs leave no
/// trace in the store.
pub struct Refresher<S: TenderStore> {
    coordinator: Coordinator,
    store: Arc<Mutex<S>>,
    config_hash: String,
}

impl<S: TenderStore> Refresher<S> {
    /// Creates a refresher
    ///
    /// # Arguments
    ///
    /// * `coordinator` - Pipeline to run
    /// * `store` - Ledger backend, shared with other readers
    /// * `config_hash` - Recorded with every journaled run
    pub fn new(coordinator: Coordinator, store: Arc<Mutex<S>>, config_hash: String) -> Self {
        Self {
            coordinator,
            store,
            config_hash,
        }
    }

    pub fn store(&self) -> &Arc<Mutex<S>> {
        &self.store
    }

    /// Runs one refresh
    ///
    /// Partial degradation (skipped rows, failed detail fetches, some
    /// unreachable listing pages) still yields a summary. Only a fully
    /// unreachable listing or a store failure is an error.
    ///
    /// # Arguments
    ///
    /// * `dry_run` - Compute the result without mutating the store
    pub async fn refresh_once(&self, dry_run: bool) -> Result<RefreshSummary, IngestError> {
        let run_id = if dry_run {
            None
        } else {
            Some(self.with_store(|store| store.begin_run(&self.config_hash))?)
        };

        let outcome = self.refresh_inner(dry_run).await;

        if let Some(run_id) = run_id {
            let (status, parsed, inserted) = match &outcome {
                Ok(summary) => (
                    RunStatus::Completed,
                    summary.parsed_total as u64,
                    summary.inserted_new as u64,
                ),
                Err(_) => (RunStatus::Failed, 0, 0),
            };
            if let Err(e) =
                self.with_store(|store| store.finish_run(run_id, status, parsed, inserted))
            {
                tracing::warn!("Could not close run {} in the journal: {}", run_id, e);
            }
        }

        outcome
    }

    async fn refresh_inner(&self, dry_run: bool) -> Result<RefreshSummary, IngestError> {
        let records = self.coordinator.run_pipeline().await?;
        let enriched = records.iter().filter(|r| r.enrichment.is_some()).count();

        let inserted_new = self.with_store(|store| upsert_new(store, &records, dry_run))?;

        let summary = RefreshSummary {
            parsed_total: records.len(),
            inserted_new,
            enriched,
            dry_run,
        };
        tracing::info!(
            "Refresh finished: {} parsed, {} enriched, {} new{}",
            summary.parsed_total,
            summary.enriched,
            summary.inserted_new,
            if dry_run { " (dry run)" } else { "" }
        );
        Ok(summary)
    }

    /// Runs `f` under the store lock
    ///
    /// The guard never lives across an await point.
    fn with_store<T>(
        &self,
        f: impl FnOnce(&mut S) -> Result<T, StorageError>,
    ) -> Result<T, IngestError> {
        let mut store = self.store.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(f(&mut *store)?)
    }
}
