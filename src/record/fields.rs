use crate::record::Classification;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Keys a summary record contributes to a stored document
pub const SUMMARY_KEYS: [&str; 10] = [
    "id",
    "title",
    "link",
    "lots",
    "organizer",
    "method",
    "starts_at",
    "ends_at",
    "amount",
    "status",
];

/// Key holding the detail classification of an enriched document
pub const CLASSIFICATION_KEY: &str = "classification";

/// One row of a listing page
///
/// Every text field is whitespace-normalized by the listing extractor. Dates
/// and amounts stay in the site's free-text formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryRecord {
    /// Site-assigned announcement number
    pub id: String,
    pub title: Option<String>,
    /// Absolute detail page URL
    pub link: Option<String>,
    /// Lot count as printed under the ID
    pub lots: Option<String>,
    pub organizer: Option<String>,
    /// Procurement method
    pub method: Option<String>,
    /// Start of bid acceptance
    pub starts_at: Option<String>,
    /// End of bid acceptance
    pub ends_at: Option<String>,
    /// Amount in tenge, locale formatted
    pub amount: Option<String>,
    pub status: Option<String>,
}

impl SummaryRecord {
    /// Creates a record carrying only its ID
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Key/value pairs in `SUMMARY_KEYS` order, skipping absent fields
    pub fn field_pairs(&self) -> Vec<(&'static str, &str)> {
        let optional = [
            ("title", &self.title),
            ("link", &self.link),
            ("lots", &self.lots),
            ("organizer", &self.organizer),
            ("method", &self.method),
            ("starts_at", &self.starts_at),
            ("ends_at", &self.ends_at),
            ("amount", &self.amount),
            ("status", &self.status),
        ];

        let mut pairs = vec![("id", self.id.as_str())];
        pairs.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| value.as_deref().map(|v| (key, v))),
        );
        pairs
    }
}

/// A detail field value: single text or a capped list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Text(_) => None,
            Self::List(items) => Some(items.as_slice()),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        }
    }
}

/// Fields extracted from one detail page
///
/// Empty values are never stored: a field is either present with content or
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailFields(BTreeMap<String, FieldValue>);

impl DetailFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a text field unless the value is empty
    pub fn insert_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.0.insert(name.into(), FieldValue::Text(value));
        }
    }

    /// Inserts a list field unless it has no items
    pub fn insert_list(&mut self, name: impl Into<String>, items: Vec<String>) {
        if !items.is_empty() {
            self.0.insert(name.into(), FieldValue::List(items));
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Shortcut for a text field's value
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// Shortcut for a list field's items
    pub fn list(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(FieldValue::as_list)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    /// Moves every field of `other` into `self`, keeping existing keys
    pub fn absorb(&mut self, other: DetailFields) {
        for (name, value) in other.0 {
            self.0.entry(name).or_insert(value);
        }
    }
}

/// Classification plus fields of a successfully fetched detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub classification: Classification,
    pub fields: DetailFields,
}

/// A summary record merged with its detail enrichment, if any
///
/// A record whose enrichment failed carries `enrichment: None` and is
/// indistinguishable from its summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRecord {
    pub summary: SummaryRecord,
    pub enrichment: Option<Enrichment>,
}

impl MergedRecord {
    /// Wraps a summary record without detail fields
    pub fn from_summary(summary: SummaryRecord) -> Self {
        Self {
            summary,
            enrichment: None,
        }
    }

    /// Merges a summary record with a classified detail page
    pub fn enriched(
        summary: SummaryRecord,
        classification: Classification,
        fields: DetailFields,
    ) -> Self {
        Self {
            summary,
            enrichment: Some(Enrichment {
                classification,
                fields,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.summary.id
    }

    pub fn classification(&self) -> Option<Classification> {
        self.enrichment.as_ref().map(|e| e.classification)
    }

    /// Builds the stored document: summary fields first, then the
    /// classification, then detail fields. Summary keys win on collision.
    pub fn to_document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        for (key, value) in self.summary.field_pairs() {
            doc.insert(key.to_string(), Value::String(value.to_string()));
        }

        if let Some(enrichment) = &self.enrichment {
            doc.insert(
                CLASSIFICATION_KEY.to_string(),
                Value::String(enrichment.classification.as_str().to_string()),
            );
            for (name, value) in enrichment.fields.iter() {
                if doc.contains_key(name) {
                    tracing::debug!("Detail field '{}' shadows a summary field, dropped", name);
                    continue;
                }
                doc.insert(name.clone(), value.to_json());
            }
        }

        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> SummaryRecord {
        SummaryRecord {
            id: "15001-1".to_string(),
            title: Some("Поставка бумаги".to_string()),
            link: Some("https://example.kz/ru/announce/index/15001".to_string()),
            amount: Some("1 200 000,00".to_string()),
            ..SummaryRecord::default()
        }
    }

    #[test]
    fn test_field_pairs_skip_absent() {
        let record = summary();
        let pairs = record.field_pairs();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["id", "title", "link", "amount"]);
    }

    #[test]
    fn test_detail_fields_ignore_empty_values() {
        let mut fields = DetailFields::new();
        fields.insert_text("customer_name", "");
        fields.insert_list("suppliers", vec![]);
        assert!(fields.is_empty());

        fields.insert_text("customer_name", "ГУ Аппарат акима");
        assert_eq!(fields.text("customer_name"), Some("ГУ Аппарат акима"));
        assert_eq!(fields.list("customer_name"), None);
    }

    #[test]
    fn test_absorb_keeps_existing_keys() {
        let mut base = DetailFields::new();
        base.insert_text("signed_by", "first");

        let mut other = DetailFields::new();
        other.insert_text("signed_by", "second");
        other.insert_text("signed_date", "01.02.2025 10:00:00");

        base.absorb(other);
        assert_eq!(base.text("signed_by"), Some("first"));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_unenriched_document_is_summary_only() {
        let doc = MergedRecord::from_summary(summary()).to_document();
        assert_eq!(doc.len(), 4);
        assert!(doc.keys().all(|k| SUMMARY_KEYS.contains(&k.as_str())));
        assert!(!doc.contains_key(CLASSIFICATION_KEY));
    }

    #[test]
    fn test_enriched_document_merges_fields() {
        let mut fields = DetailFields::new();
        fields.insert_text("customer_name", "ГУ Отдел образования");
        fields.insert_list("suppliers", vec!["ТОО Альфа|Алматы||".to_string()]);
        fields.insert_text("title", "should not replace the summary title");

        let doc = MergedRecord::enriched(summary(), Classification::Completed, fields).to_document();

        assert_eq!(doc["id"], "15001-1");
        assert_eq!(doc["title"], "Поставка бумаги");
        assert_eq!(doc[CLASSIFICATION_KEY], "completed");
        assert_eq!(doc["customer_name"], "ГУ Отдел образования");
        assert_eq!(doc["suppliers"], serde_json::json!(["ТОО Альфа|Алматы||"]));
    }
}
