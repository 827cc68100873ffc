//! Storage module for the dedup ledger
//!
//! This module persists everything that outlives a refresh run:
//! - One JSON document per tender ID
//! - The aggregate counter of known tenders
//! - The journal of live refresh runs
//!
//! Backends: SQLite for production, in-memory for tests and dry tooling.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{StorageError, StorageResult, TenderStore};

use crate::record::{MergedRecord, CLASSIFICATION_KEY};
use serde_json::{Map, Value};
use std::path::Path;

/// Opens or creates the SQLite ledger
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully opened store
/// * `Err(StorageError)` - Failed to open the database
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}

/// One stored tender document
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub id: String,
    /// The full merged field mapping
    pub document: Map<String, Value>,
}

impl LedgerEntry {
    /// Builds the entry persisted for a merged record
    pub fn from_record(record: &MergedRecord) -> Self {
        Self {
            id: record.id().to_string(),
            document: record.to_document(),
        }
    }

    /// Classification recorded in the document, if enriched
    pub fn classification(&self) -> Option<&str> {
        self.document.get(CLASSIFICATION_KEY).and_then(Value::as_str)
    }
}

/// Represents a refresh run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub parsed_total: Option<u64>,
    pub inserted_new: Option<u64>,
}

/// Status of a refresh run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
