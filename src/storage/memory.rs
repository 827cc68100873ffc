//! In-memory storage implementation
//!
//! Same contract as the SQLite backend, nothing persisted.

use crate::storage::traits::{StorageError, StorageResult, TenderStore};
use crate::storage::{LedgerEntry, RunRecord, RunStatus};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, LedgerEntry>,
    counter: u64,
    runs: Vec<RunRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TenderStore for MemoryStore {
    fn exists(&self, id: &str) -> StorageResult<bool> {
        Ok(self.entries.contains_key(id))
    }

    fn batch_write(&mut self, entries: &[LedgerEntry]) -> StorageResult<()> {
        // Validate the whole batch before touching the map
        let mut batch_ids = HashSet::new();
        for entry in entries {
            if self.entries.contains_key(&entry.id) || !batch_ids.insert(entry.id.as_str()) {
                return Err(StorageError::ConstraintViolation(format!(
                    "tender {} is already stored",
                    entry.id
                )));
            }
        }

        for entry in entries {
            self.entries.insert(entry.id.clone(), entry.clone());
        }
        Ok(())
    }

    fn increment_counter(&mut self, delta: u64) -> StorageResult<u64> {
        self.counter += delta;
        Ok(self.counter)
    }

    fn read_counter(&self) -> StorageResult<u64> {
        Ok(self.counter)
    }

    fn get_entry(&self, id: &str) -> StorageResult<Option<LedgerEntry>> {
        Ok(self.entries.get(id).cloned())
    }

    fn count_entries(&self) -> StorageResult<u64> {
        Ok(self.entries.len() as u64)
    }

    fn classification_breakdown(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for entry in self.entries.values() {
            let key = entry.classification().unwrap_or("none").to_string();
            *counts.entry(key).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }

    fn begin_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let id = self.runs.len() as i64 + 1;
        self.runs.push(RunRecord {
            id,
            started_at: Utc::now().to_rfc3339(),
            finished_at: None,
            config_hash: config_hash.to_string(),
            status: RunStatus::Running,
            parsed_total: None,
            inserted_new: None,
        });
        Ok(id)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        parsed_total: u64,
        inserted_new: u64,
    ) -> StorageResult<()> {
        let run = self
            .runs
            .iter_mut()
            .find(|run| run.id == run_id)
            .ok_or_else(|| StorageError::Database(format!("run {} not found", run_id)))?;

        run.status = status;
        run.finished_at = Some(Utc::now().to_rfc3339());
        run.parsed_total = Some(parsed_total);
        run.inserted_new = Some(inserted_new);
        Ok(())
    }

    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        Ok(self.runs.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn entry(id: &str) -> LedgerEntry {
        LedgerEntry {
            id: id.to_string(),
            document: Map::new(),
        }
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let mut store = MemoryStore::new();
        store.batch_write(&[entry("A1")]).unwrap();

        let result = store.batch_write(&[entry("B1"), entry("A1")]);
        assert!(matches!(result, Err(StorageError::ConstraintViolation(_))));
        assert!(!store.exists("B1").unwrap());

        // Duplicates within one batch are rejected too
        assert!(store.batch_write(&[entry("C1"), entry("C1")]).is_err());
        assert_eq!(store.count_entries().unwrap(), 1);
    }

    #[test]
    fn test_runs_most_recent_first() {
        let mut store = MemoryStore::new();
        let first = store.begin_run("h").unwrap();
        let second = store.begin_run("h").unwrap();
        store.finish_run(first, RunStatus::Failed, 0, 0).unwrap();

        let runs = store.recent_runs(1).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, second);
        assert_eq!(store.recent_runs(5).unwrap()[1].status, RunStatus::Failed);
    }
}
