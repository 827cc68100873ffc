//! Dedup ledger
//!
//! Decides which merged records are new relative to the store and commits
//! them together with the aggregate counter.

use crate::record::MergedRecord;
use crate::storage::{LedgerEntry, StorageResult, TenderStore};
use std::collections::HashSet;

/// Adds the records the store has not seen before
///
/// Records with an empty ID are skipped and not counted. A repeated ID
/// within `records` counts once, the first occurrence winning.
///
/// A dry run performs no store calls at all and reports every remaining
/// record as new. A live run checks each ID, writes the absent ones in one
/// atomic batch, then increments the counter by exactly the number written.
/// A failed batch propagates and leaves the counter untouched.
///
/// # Arguments
///
/// * `store` - Ledger backend
/// * `records` - Merged records in pipeline order
/// * `dry_run` - Compute the result without mutating the store
///
/// # Returns
///
/// The number of new records
pub fn upsert_new<S: TenderStore + ?Sized>(
    store: &mut S,
    records: &[MergedRecord],
    dry_run: bool,
) -> StorageResult<usize> {
    let mut seen = HashSet::new();
    let mut skipped_empty = 0;
    let mut candidates = Vec::with_capacity(records.len());

    for record in records {
        let id = record.id();
        if id.trim().is_empty() {
            skipped_empty += 1;
            continue;
        }
        if seen.insert(id) {
            candidates.push(record);
        } else {
            tracing::debug!("Duplicate ID {} within batch ignored", id);
        }
    }

    if skipped_empty > 0 {
        tracing::warn!("Skipped {} records without an ID", skipped_empty);
    }

    if dry_run {
        tracing::info!(
            "Dry run: {} records would be checked against the store",
            candidates.len()
        );
        return Ok(candidates.len());
    }

    let mut fresh = Vec::new();
    for record in candidates {
        if !store.exists(record.id())? {
            fresh.push(LedgerEntry::from_record(record));
        }
    }

    if fresh.is_empty() {
        tracing::info!("No new tenders");
        return Ok(0);
    }

    store.batch_write(&fresh)?;
    let total = store.increment_counter(fresh.len() as u64)?;
    tracing::info!("Stored {} new tenders, {} known in total", fresh.len(), total);

    Ok(fresh.len())
}
