//! Statistics generation from the tender store
//!
//! This module provides functionality for extracting and displaying
//! ledger statistics from the storage layer.

use crate::storage::{RunRecord, StorageResult, TenderStore};

/// Number of journaled runs shown by default
pub const RECENT_RUNS: usize = 5;

/// Ledger statistics summary
#[derive(Debug, Clone)]
pub struct LedgerStatistics {
    /// Value of the aggregate counter
    pub counter: u64,

    /// Number of stored entries
    pub stored: u64,

    /// Stored entries minus counter; non-zero means the two have drifted
    pub drift: i64,

    /// Stored entries per classification, "none" for unenriched records
    pub breakdown: Vec<(String, u64)>,

    /// Latest journaled runs, most recent first
    pub recent_runs: Vec<RunRecord>,
}

impl LedgerStatistics {
    pub fn is_consistent(&self) -> bool {
        self.drift == 0
    }
}

/// Loads statistics from storage
///
/// Drift is reported only. Nothing here rewrites the counter.
///
/// # Arguments
///
/// * `store` - The storage backend to query
/// * `runs` - How many journaled runs to include
///
/// # Returns
///
/// * `Ok(LedgerStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics<S: TenderStore + ?Sized>(
    store: &S,
    runs: usize,
) -> StorageResult<LedgerStatistics> {
    let counter = store.read_counter()?;
    let stored = store.count_entries()?;

    Ok(LedgerStatistics {
        counter,
        stored,
        drift: stored as i64 - counter as i64,
        breakdown: store.classification_breakdown()?,
        recent_runs: store.recent_runs(runs)?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &LedgerStatistics) {
    println!("=== Ledger Statistics ===\n");

    println!("Overview:");
    println!("  Counter: {}", stats.counter);
    println!("  Stored tenders: {}", stats.stored);
    if stats.is_consistent() {
        println!("  Drift: none");
    } else {
        println!(
            "  Drift: {:+} (stored - counter, not reconciled automatically)",
            stats.drift
        );
    }
    println!();

    println!("By Classification:");
    let mut breakdown: Vec<_> = stats.breakdown.iter().collect();
    breakdown.sort_by(|a, b| b.1.cmp(&a.1));

    for (classification, count) in breakdown {
        let percentage = if stats.stored > 0 {
            (*count as f64 / stats.stored as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", classification, count, percentage);
    }
    println!();

    if stats.recent_runs.is_empty() {
        println!("No journaled runs");
        return;
    }

    println!("Recent Runs ({}):", stats.recent_runs.len());
    for run in &stats.recent_runs {
        let counts = match (run.parsed_total, run.inserted_new) {
            (Some(parsed), Some(inserted)) => format!("{} parsed, {} new", parsed, inserted),
            _ => "-".to_string(),
        };
        println!(
            "  #{} {} [{}] {}",
            run.id,
            run.started_at,
            run.status.to_db_string(),
            counts
        );
    }
}
