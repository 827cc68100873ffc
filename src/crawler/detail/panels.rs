//! Structural panel pass
//!
//! Reads the announcement top block (read-only form inputs) and every headed
//! panel table, keyed `<panel>.<row label>`.

use crate::crawler::text::{clean_text, element_text, non_empty, truncate_chars};
use crate::record::DetailFields;
use scraper::{ElementRef, Html, Selector};

/// Top block labels and the fields they fill
const TOP_BLOCK_FIELDS: [(&str, &str); 6] = [
    ("Номер объявления", "announcement.number"),
    ("Наименование объявления", "announcement.title"),
    ("Статус объявления", "announcement.status"),
    ("Дата публикации объявления", "announcement.published_at"),
    ("Срок начала приема заявок", "announcement.accept_from"),
    ("Срок окончания приема заявок", "announcement.accept_until"),
];

/// Panel rows duplicated by the listing; never copied
const SKIPPED_ROWS: [&str; 2] = ["Кол-во лотов в объявлении", "Сумма закупки"];

const PANEL_LIST_LIMIT: usize = 50;
const PANEL_VALUE_MAX_CHARS: usize = 1000;

/// Runs the top block and panel table extraction
pub fn extract_panels(document: &Html) -> DetailFields {
    let mut fields = DetailFields::new();
    top_block(document, &mut fields);
    panel_tables(document, &mut fields);
    fields
}

fn top_block(document: &Html, fields: &mut DetailFields) {
    let (Ok(group_selector), Ok(label_selector), Ok(input_selector)) = (
        Selector::parse("div.form-group"),
        Selector::parse("label.control-label"),
        Selector::parse("input.form-control"),
    ) else {
        return;
    };

    for group in document.select(&group_selector) {
        let (Some(label), Some(input)) = (
            group.select(&label_selector).next(),
            group.select(&input_selector).next(),
        ) else {
            continue;
        };

        let label = element_text(&label);
        let Some((_, field)) = TOP_BLOCK_FIELDS.iter().find(|(text, _)| *text == label) else {
            continue;
        };

        if let Some(value) = input.value().attr("value") {
            fields.insert_text(*field, clean_text(value));
        }
    }
}

fn panel_tables(document: &Html, fields: &mut DetailFields) {
    let (Ok(panel_selector), Ok(heading_selector), Ok(table_selector), Ok(row_selector)) = (
        Selector::parse("div.panel"),
        Selector::parse("div.panel-heading"),
        Selector::parse("table"),
        Selector::parse("tr"),
    ) else {
        return;
    };

    for panel in document.select(&panel_selector) {
        let (Some(heading), Some(table)) = (
            panel.select(&heading_selector).next(),
            panel.select(&table_selector).next(),
        ) else {
            continue;
        };

        let prefix = panel_prefix(&element_text(&heading));
        for row in table.select(&row_selector) {
            read_panel_row(&row, &prefix, fields);
        }
    }
}

/// Short prefixes for the two well-known panels; the heading otherwise
fn panel_prefix(heading: &str) -> String {
    if heading.contains("Общие сведения") {
        "general".to_string()
    } else if heading.contains("Информация об организаторе") {
        "organizer".to_string()
    } else {
        heading.to_string()
    }
}

fn read_panel_row(row: &ElementRef<'_>, prefix: &str, fields: &mut DetailFields) {
    let (Ok(th_selector), Ok(td_selector), Ok(li_selector)) = (
        Selector::parse("th"),
        Selector::parse("td"),
        Selector::parse("li"),
    ) else {
        return;
    };

    let (Some(th), Some(td)) = (row.select(&th_selector).next(), row.select(&td_selector).next())
    else {
        return;
    };

    let key = element_text(&th);
    if key.is_empty() || SKIPPED_ROWS.contains(&key.as_str()) {
        return;
    }
    let field = format!("{}.{}", prefix, key);

    let items: Vec<String> = td
        .select(&li_selector)
        .filter_map(|li| non_empty(element_text(&li)))
        .take(PANEL_LIST_LIMIT)
        .collect();

    if items.is_empty() {
        fields.insert_text(field, truncate_chars(&element_text(&td), PANEL_VALUE_MAX_CHARS));
    } else {
        fields.insert_list(field, items);
    }
}
