//! Tender-Sweep: incremental procurement tender ingestion
//!
//! This crate walks paginated tender listings, enriches every summary row with
//! its detail page, classifies and extracts the detail layout, and merges the
//! result into a persisted store, adding only tenders it has not seen before.

pub mod config;
pub mod crawler;
pub mod ledger;
pub mod output;
pub mod record;
pub mod storage;

use thiserror::Error;

/// Main error type for Tender-Sweep operations
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("All {pages} listing pages were unreachable")]
    ListingUnreachable { pages: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Tender-Sweep operations
pub type Result<T> = std::result::Result<T, IngestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Refresher, RefreshSummary, Scheduler};
pub use ledger::upsert_new;
pub use record::{Classification, DetailFields, FieldValue, MergedRecord, SummaryRecord};
