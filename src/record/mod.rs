//! Record types flowing through the ingestion pipeline
//!
//! # Components
//!
//! - `SummaryRecord`: one row of a listing page
//! - `DetailFields`: fields extracted from a detail page
//! - `MergedRecord`: a summary plus its (optional) detail enrichment
//! - `Classification`: which kind of detail page was seen

mod classification;
mod fields;

// Re-export main types
pub use classification::Classification;
pub use fields::{
    DetailFields, Enrichment, FieldValue, MergedRecord, SummaryRecord, CLASSIFICATION_KEY,
    SUMMARY_KEYS,
};
