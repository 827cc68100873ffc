//! Detail page extractor
//!
//! Classifies a detail page as a completed results protocol or a published
//! announcement, then runs the matching field schema plus the structural
//! panel pass.
//!
//! # Components
//!
//! - `classify`: ordered marker rules over the visible text
//! - `schema`: declarative field rules and the engine applying them
//! - `completed` / `published`: the two rule tables
//! - `panels`: top block and headed panel tables

mod classify;
mod completed;
mod panels;
mod published;
mod schema;

pub use classify::classify;

use crate::crawler::text::{clean_text, visible_text};
use crate::record::{Classification, DetailFields};
use completed::COMPLETED_RULES;
use panels::extract_panels;
use published::PUBLISHED_RULES;
use schema::Schema;
use scraper::Html;
use std::sync::LazyLock;

static COMPLETED_SCHEMA: LazyLock<Schema> = LazyLock::new(|| Schema::compile(&COMPLETED_RULES));
static PUBLISHED_SCHEMA: LazyLock<Schema> = LazyLock::new(|| Schema::compile(&PUBLISHED_RULES));

/// Classifies a detail page and extracts its fields
///
/// Unknown pages yield no fields. Schema fields take precedence over panel
/// fields of the same name.
///
/// # Arguments
///
/// * `html` - The detail page markup
///
/// # Returns
///
/// The classification and the extracted fields
pub fn classify_and_extract(html: &str) -> (Classification, DetailFields) {
    let document = Html::parse_document(html);
    let text = visible_text(&document);

    let classification = classify(&clean_text(&text));
    let schema: &Schema = match classification {
        Classification::Completed => &*COMPLETED_SCHEMA,
        Classification::Published => &*PUBLISHED_SCHEMA,
        Classification::Unknown => return (classification, DetailFields::new()),
    };

    let mut fields = schema.extract(&document, &text);
    fields.absorb(extract_panels(&document));

    tracing::debug!(
        "Extracted {} fields from a {} page",
        fields.len(),
        classification
    );
    (classification, fields)
}
