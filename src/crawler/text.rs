//! Text helpers shared by the listing and detail extractors

use scraper::{ElementRef, Html};

/// Elements whose text never reaches the reader
const INVISIBLE_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Collapses whitespace runs to single spaces and trims both ends
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalized text content of an element
///
/// Text nodes are joined with a space so adjacent inline elements do not
/// run together.
pub fn element_text(element: &ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Returns `None` for empty strings
pub fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Truncates to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Raw visible text of a document
///
/// Text nodes are concatenated verbatim, preserving the line structure of
/// the markup; text inside script, style, noscript and template elements is
/// dropped.
pub fn visible_text(document: &Html) -> String {
    let mut out = String::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| INVISIBLE_ELEMENTS.contains(&element.name()))
        });

        if !hidden {
            out.push_str(text);
        }
    }

    out
}
