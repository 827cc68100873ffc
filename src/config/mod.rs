//! Configuration module for Tender-Sweep
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use tender_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("tender-sweep.toml")).unwrap();
//! println!("Walking {} listing pages", config.source.pages.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, EnrichmentConfig, HttpConfig, RetryConfig, SchedulerConfig, SourceConfig,
    StorageConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
