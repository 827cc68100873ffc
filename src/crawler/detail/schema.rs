//! Declarative field rules and the engine that applies them
//!
//! A schema is a fixed list of `FieldRule`s. Every rule is evaluated on its
//! own: a rule that finds nothing leaves its field absent and never affects
//! the others.

use crate::crawler::text::{clean_text, element_text, non_empty, truncate_chars};
use crate::record::DetailFields;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Cells longer than this are layout containers, never labels
const MAX_LABEL_CHARS: usize = 200;

/// Clamp applied to every item of a pattern list
const LIST_ITEM_MAX_CHARS: usize = 300;

/// A table column copied into a rendered row
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub index: usize,
    pub max_chars: Option<usize>,
}

/// Column copied verbatim
pub const fn col(index: usize) -> Column {
    Column {
        index,
        max_chars: None,
    }
}

/// Column clamped to `max_chars`
pub const fn clamped(index: usize, max_chars: usize) -> Column {
    Column {
        index,
        max_chars: Some(max_chars),
    }
}

/// Rows of the first table mentioning every marker
#[derive(Debug)]
pub struct TableRule {
    pub field: &'static str,
    /// Lowercase phrases the table text must all contain
    pub markers: &'static [&'static str],
    /// Rows with fewer data cells are skipped
    pub min_cells: usize,
    /// Cells rendered, `|`-joined, in this order
    pub columns: &'static [Column],
    pub limit: usize,
    pub count_field: Option<&'static str>,
    /// Scalar fields taken from the first rendered row, by rendered position
    pub first_row: &'static [(usize, &'static str)],
}

/// How one detail field is located
#[derive(Debug)]
pub enum FieldRule {
    /// Table row or form group labelled `label`, falling back to `pattern`
    Labelled {
        field: &'static str,
        label: &'static str,
        pattern: &'static str,
        max_chars: usize,
    },

    /// First capture group of `pattern` over the raw text
    Text {
        field: &'static str,
        pattern: &'static str,
        max_chars: usize,
    },

    /// Every match of `pattern` rendered through `template`
    TextList {
        field: &'static str,
        pattern: &'static str,
        /// Expanded with `${n}` capture references
        template: &'static str,
        limit: usize,
        count_field: Option<&'static str>,
    },

    TableRows(TableRule),
}

impl FieldRule {
    fn pattern(&self) -> Option<&'static str> {
        match self {
            Self::Labelled { pattern, .. }
            | Self::Text { pattern, .. }
            | Self::TextList { pattern, .. } => Some(*pattern),
            Self::TableRows(_) => None,
        }
    }
}

/// A rule list with its patterns compiled
pub struct Schema {
    rules: &'static [FieldRule],
    patterns: Vec<Option<Regex>>,
}

impl Schema {
    /// Compiles every pattern of `rules`
    ///
    /// Rule tables are static, so an invalid pattern is a programming error.
    pub fn compile(rules: &'static [FieldRule]) -> Self {
        let patterns = rules
            .iter()
            .map(|rule| {
                rule.pattern()
                    .map(|pattern| Regex::new(pattern).expect("valid field pattern"))
            })
            .collect();

        Self { rules, patterns }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies every rule to a parsed page and its raw visible text
    pub fn extract(&self, document: &Html, text: &str) -> DetailFields {
        let mut fields = DetailFields::new();

        for (rule, pattern) in self.rules.iter().zip(&self.patterns) {
            match (rule, pattern) {
                (
                    FieldRule::Labelled {
                        field,
                        label,
                        max_chars,
                        ..
                    },
                    Some(pattern),
                ) => {
                    let value = labelled_value(document, label)
                        .or_else(|| first_capture(pattern, text));
                    if let Some(value) = value {
                        fields.insert_text(*field, truncate_chars(&value, *max_chars));
                    }
                }
                (FieldRule::Text { field, max_chars, .. }, Some(pattern)) => {
                    if let Some(value) = first_capture(pattern, text) {
                        fields.insert_text(*field, truncate_chars(&value, *max_chars));
                    }
                }
                (
                    FieldRule::TextList {
                        field,
                        template,
                        limit,
                        count_field,
                        ..
                    },
                    Some(pattern),
                ) => {
                    let items = rendered_matches(pattern, template, text);
                    if let Some(count_field) = count_field {
                        if !items.is_empty() {
                            fields.insert_text(*count_field, items.len().to_string());
                        }
                    }
                    fields.insert_list(*field, items.into_iter().take(*limit).collect());
                }
                (FieldRule::TableRows(table_rule), _) => {
                    apply_table_rule(document, table_rule, &mut fields);
                }
                _ => {}
            }
        }

        fields
    }
}

/// Normalized first capture group of `pattern`
fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_text(m.as_str()))
        .and_then(non_empty)
}

fn rendered_matches(pattern: &Regex, template: &str, text: &str) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let mut rendered = String::new();
            caps.expand(template, &mut rendered);
            non_empty(truncate_chars(&clean_text(&rendered), LIST_ITEM_MAX_CHARS))
        })
        .collect()
}

/// Structural lookup of a labelled value
///
/// Table rows are tried first (label in the first cell, value in the
/// second), then form groups (label element, value in the input).
fn labelled_value(document: &Html, label: &str) -> Option<String> {
    row_value(document, label).or_else(|| form_group_value(document, label))
}

fn row_value(document: &Html, label: &str) -> Option<String> {
    let row_selector = Selector::parse("tr").ok()?;

    document.select(&row_selector).find_map(|row| {
        let cells: Vec<ElementRef<'_>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| matches!(cell.value().name(), "th" | "td"))
            .collect();

        if cells.len() < 2 {
            return None;
        }

        let head = element_text(&cells[0]);
        if head.chars().count() > MAX_LABEL_CHARS || !head.contains(label) {
            return None;
        }

        non_empty(element_text(&cells[1]))
    })
}

fn form_group_value(document: &Html, label: &str) -> Option<String> {
    let group_selector = Selector::parse("div.form-group").ok()?;
    let label_selector = Selector::parse("label").ok()?;
    let input_selector = Selector::parse("input, textarea").ok()?;

    document.select(&group_selector).find_map(|group| {
        let label_element = group.select(&label_selector).next()?;
        if !element_text(&label_element).contains(label) {
            return None;
        }

        let input = group.select(&input_selector).next()?;
        match input.value().attr("value") {
            Some(value) => non_empty(clean_text(value)),
            None => non_empty(element_text(&input)),
        }
    })
}

fn apply_table_rule(document: &Html, rule: &TableRule, fields: &mut DetailFields) {
    let rows = table_rows(document, rule);
    let Some(first) = rows.first() else {
        return;
    };

    for (position, field) in rule.first_row {
        if let Some(cell) = first.get(*position) {
            fields.insert_text(*field, cell.as_str());
        }
    }

    if let Some(count_field) = rule.count_field {
        fields.insert_text(count_field, rows.len().to_string());
    }
    fields.insert_list(rule.field, rows.iter().map(|cells| cells.join("|")).collect());
}

/// Selected cells of each body row of the first table containing every marker
fn table_rows(document: &Html, rule: &TableRule) -> Vec<Vec<String>> {
    let (Ok(table_selector), Ok(row_selector), Ok(cell_selector)) = (
        Selector::parse("table"),
        Selector::parse("tr"),
        Selector::parse("td"),
    ) else {
        return Vec::new();
    };

    let table = document.select(&table_selector).find(|table| {
        let text = element_text(table).to_lowercase();
        rule.markers.iter().all(|marker| text.contains(marker))
    });

    let Some(table) = table else {
        return Vec::new();
    };

    table
        .select(&row_selector)
        // First row is the header
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
            if cells.len() < rule.min_cells {
                return None;
            }
            Some(select_cells(&cells, rule.columns))
        })
        .take(rule.limit)
        .collect()
}

fn select_cells(cells: &[ElementRef<'_>], columns: &[Column]) -> Vec<String> {
    columns
        .iter()
        .map(|column| {
            let text = cells
                .get(column.index)
                .map(|cell| element_text(cell))
                .unwrap_or_default();
            match column.max_chars {
                Some(max_chars) => truncate_chars(&text, max_chars),
                None => text,
            }
        })
        .collect()
}
