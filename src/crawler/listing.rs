//! Listing page extractor
//!
//! Turns the results table of one listing page into `SummaryRecord`s. Rows
//! are parsed independently: a malformed row is skipped with a warning and
//! never affects its neighbours.

use crate::crawler::text::{clean_text, element_text, non_empty};
use crate::record::SummaryRecord;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Minimum data cells of a well-formed result row
const MIN_CELLS: usize = 7;

const LOTS_PREFIX: &str = "Лотов:";
const ORGANIZER_PREFIX: &str = "Организатор:";

/// Why a result row was skipped
#[derive(Debug, Error)]
enum RowError {
    #[error("expected at least 7 cells, found {0}")]
    TooFewCells(usize),

    #[error("no announcement ID in the first cell")]
    MissingId,
}

/// Parses the results table of a listing page
///
/// A page without `table#search-result` yields an empty sequence; that is
/// logged, not treated as a failure.
///
/// # Arguments
///
/// * `html` - The listing page markup
/// * `base_url` - URL the page was fetched from, for resolving detail links
///
/// # Returns
///
/// Summary records in table order
pub fn parse_listing(html: &str, base_url: &Url) -> Vec<SummaryRecord> {
    let document = Html::parse_document(html);

    let (Ok(table_selector), Ok(row_selector), Ok(cell_selector)) = (
        Selector::parse("table#search-result"),
        Selector::parse("tr"),
        Selector::parse("td"),
    ) else {
        return Vec::new();
    };

    let Some(table) = document.select(&table_selector).next() else {
        tracing::warn!("No results table found on {}", base_url);
        return Vec::new();
    };

    let mut records = Vec::new();
    for (index, row) in table.select(&row_selector).enumerate() {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();

        // Header rows carry <th> cells only
        if cells.is_empty() {
            continue;
        }

        match parse_row(&cells, base_url) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Skipping row {} on {}: {}", index + 1, base_url, e),
        }
    }

    tracing::debug!("Parsed {} rows from {}", records.len(), base_url);
    records
}

/// Parses one result row
///
/// Column layout: ID and lot count, title with link and organizer, method,
/// acceptance start, acceptance end, amount, status.
fn parse_row(cells: &[ElementRef<'_>], base_url: &Url) -> Result<SummaryRecord, RowError> {
    if cells.len() < MIN_CELLS {
        return Err(RowError::TooFewCells(cells.len()));
    }

    let id = child_text(&cells[0], "strong")
        .ok_or(RowError::MissingId)?;

    let mut record = SummaryRecord::new(id);
    record.lots = child_text(&cells[0], "small")
        .map(|text| strip_label(&text, LOTS_PREFIX))
        .and_then(non_empty);

    if let Some(anchor) = first_child(&cells[1], "a") {
        record.title = non_empty(element_text(&anchor));
        record.link = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url));
    }
    record.organizer = child_text(&cells[1], "small")
        .map(|text| strip_label(&text, ORGANIZER_PREFIX))
        .and_then(non_empty);

    record.method = non_empty(element_text(&cells[2]));
    record.starts_at = non_empty(element_text(&cells[3]));
    record.ends_at = non_empty(element_text(&cells[4]));

    // The amount is emphasized when present; fall back to the whole cell
    record.amount = child_text(&cells[5], "strong").or_else(|| non_empty(element_text(&cells[5])));
    record.status = non_empty(element_text(&cells[6]));

    Ok(record)
}

/// First descendant of `cell` matching `css`
fn first_child<'a>(cell: &ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    cell.select(&selector).next()
}

/// Normalized, non-empty text of the first descendant matching `css`
fn child_text(cell: &ElementRef<'_>, css: &str) -> Option<String> {
    first_child(cell, css)
        .map(|element| element_text(&element))
        .and_then(non_empty)
}

/// Removes a leading label such as `Лотов:` and re-normalizes
fn strip_label(text: &str, label: &str) -> String {
    clean_text(text.replace(label, "").as_str())
}

fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    match base_url.join(href) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::debug!("Unresolvable detail link '{}': {}", href, e);
            None
        }
    }
}
