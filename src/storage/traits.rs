//! Storage traits and error types
//!
//! This module defines the trait interface for ledger backends and
//! associated error types.

use crate::storage::{LedgerEntry, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Document serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store lock poisoned by a panicked writer")]
    Poisoned,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for ledger backend implementations
///
/// The ingestion path only needs `exists`, `batch_write`,
/// `increment_counter` and `read_counter`; the remaining operations serve
/// the run journal and operator statistics.
pub trait TenderStore {
    // ===== Ledger =====

    /// Returns true if a tender with this ID is stored
    fn exists(&self, id: &str) -> StorageResult<bool>;

    /// Writes all entries in one atomic commit
    ///
    /// Either every entry is stored or none is. An entry whose ID is already
    /// stored fails the whole batch with `ConstraintViolation`.
    fn batch_write(&mut self, entries: &[LedgerEntry]) -> StorageResult<()>;

    /// Adds `delta` to the aggregate counter
    ///
    /// # Returns
    ///
    /// The counter value after the increment
    fn increment_counter(&mut self, delta: u64) -> StorageResult<u64>;

    /// Reads the aggregate counter (zero if never incremented)
    fn read_counter(&self) -> StorageResult<u64>;

    // ===== Inspection =====

    /// Gets a stored entry by ID
    fn get_entry(&self, id: &str) -> StorageResult<Option<LedgerEntry>>;

    /// Counts stored entries
    fn count_entries(&self) -> StorageResult<u64>;

    /// Stored entries per classification, unenriched entries under `"none"`
    fn classification_breakdown(&self) -> StorageResult<Vec<(String, u64)>>;

    // ===== Run Journal =====

    /// Records the start of a live refresh run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn begin_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run finished with its outcome
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        parsed_total: u64,
        inserted_new: u64,
    ) -> StorageResult<()>;

    /// Most recent runs first
    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;
}
