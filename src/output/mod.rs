//! Output module for operator-facing reports
//!
//! This module handles:
//! - Gathering ledger statistics from the store
//! - Reporting counter drift without reconciling it

pub mod stats;

pub use stats::{load_statistics, print_statistics, LedgerStatistics, RECENT_RUNS};
