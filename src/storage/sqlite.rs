//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the TenderStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageResult, TenderStore};
use crate::storage::{LedgerEntry, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde_json::{Map, Value};
use std::path::Path;

/// Counter row tracking known tenders
const TENDER_COUNTER: &str = "tenders";

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Maps a primary-key conflict to `ConstraintViolation`
fn insert_error(id: &str, error: rusqlite::Error) -> StorageError {
    match &error {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            StorageError::ConstraintViolation(format!("tender {} is already stored", id))
        }
        _ => StorageError::Sqlite(error),
    }
}

fn run_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Running),
        parsed_total: row.get::<_, Option<i64>>(5)?.map(|n| n as u64),
        inserted_new: row.get::<_, Option<i64>>(6)?.map(|n| n as u64),
    })
}

impl TenderStore for SqliteStore {
    // ===== Ledger =====

    fn exists(&self, id: &str) -> StorageResult<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM tenders WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn batch_write(&mut self, entries: &[LedgerEntry]) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO tenders (id, document, classification, inserted_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;

            for entry in entries {
                let document = serde_json::to_string(&entry.document)?;
                stmt.execute(params![entry.id, document, entry.classification(), now])
                    .map_err(|e| insert_error(&entry.id, e))?;
            }
        }

        // Dropping an uncommitted transaction rolls it back
        tx.commit()?;
        Ok(())
    }

    fn increment_counter(&mut self, delta: u64) -> StorageResult<u64> {
        self.conn.execute(
            "INSERT INTO counters (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = value + excluded.value",
            params![TENDER_COUNTER, delta as i64],
        )?;
        self.read_counter()
    }

    fn read_counter(&self) -> StorageResult<u64> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT value FROM counters WHERE name = ?1",
                params![TENDER_COUNTER],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0) as u64)
    }

    // ===== Inspection =====

    fn get_entry(&self, id: &str) -> StorageResult<Option<LedgerEntry>> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM tenders WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(json) => {
                let document: Map<String, Value> = serde_json::from_str(&json)?;
                Ok(Some(LedgerEntry {
                    id: id.to_string(),
                    document,
                }))
            }
            None => Ok(None),
        }
    }

    fn count_entries(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tenders", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn classification_breakdown(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(classification, 'none'), COUNT(*) FROM tenders
             GROUP BY 1 ORDER BY 1",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    // ===== Run Journal =====

    fn begin_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        parsed_total: u64,
        inserted_new: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, parsed_total = ?3, inserted_new = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                parsed_total as i64,
                inserted_new as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::Database(format!("run {} not found", run_id)));
        }
        Ok(())
    }

    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status, parsed_total, inserted_new
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;

        let runs = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }
}
