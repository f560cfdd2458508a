//! Response normalizer.
//!
//! Converts the search service's loosely-typed JSON array into canonical
//! [`Paper`] records. The service's response shape has drifted across
//! versions (`authors` vs `names`, `date` vs `publication_date`, keywords as
//! a comma string or an array, numeric or string `year`), so every field is
//! resolved through a priority list of source keys in [`keys`]. A new shape
//! only needs a new entry there.
//!
//! Only a non-array top level is fatal. Individual fields never fail: a
//! missing, null or unusable value falls back to a fixed default.

use crate::error::{PubSearchError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// An untyped record as received from the search service
pub type RawRecord = Map<String, Value>;

/// Source keys per canonical field, highest priority first.
pub mod keys {
    pub const ID: &[&str] = &["id", "pmid"];
    pub const TITLE: &[&str] = &["title"];
    pub const NAMES: &[&str] = &["names", "authors"];
    pub const JOURNAL: &[&str] = &["journal"];
    pub const DATE: &[&str] = &["date", "publication_date"];
    pub const YEAR: &[&str] = &["year"];
    pub const DOI: &[&str] = &["doi"];
    pub const KEYWORDS: &[&str] = &["keywords"];
    pub const MATCH_PERCENT: &[&str] = &["matchPercent"];
}

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_NAMES: &str = "Unknown Names";
pub const UNKNOWN_JOURNAL: &str = "Unknown Journal";
pub const NO_DOI: &str = "No DOI";

/// Canonical, fully populated search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    /// Identifier, unique within one result set
    pub id: String,
    pub title: String,
    /// Comma-joined author names (display form)
    pub authors: String,
    pub journal: String,
    pub year: String,
    pub doi: String,
    /// Publication date as sent by the service, may carry a time part
    pub date: String,
    pub keywords: Vec<String>,
    /// Relevance score in `[0, 100]`
    pub match_percent: f64,
}

impl Paper {
    /// The author string under its export column name
    pub fn names(&self) -> &str {
        &self.authors
    }

    /// Keywords as shown in the table and used for sorting
    pub fn keywords_display(&self) -> String {
        self.keywords.join(", ")
    }

    pub fn has_doi(&self) -> bool {
        self.doi != NO_DOI
    }
}

/// Parse a response body and normalize it.
///
/// Bodies that are not JSON at all count as malformed, like a non-array top level.
pub fn normalize_body(body: &str) -> Result<Vec<Paper>> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| PubSearchError::MalformedResponse(format!("response is not JSON: {}", e)))?;
    normalize(&payload)
}

/// Normalize a decoded payload, one [`Paper`] per array element.
pub fn normalize(payload: &Value) -> Result<Vec<Paper>> {
    let items = payload.as_array().ok_or_else(|| {
        PubSearchError::MalformedResponse(format!(
            "expected a JSON array, got {}",
            json_type_name(payload)
        ))
    })?;

    let empty = RawRecord::new();
    let papers: Vec<Paper> = items
        .iter()
        .map(|item| match item.as_object() {
            Some(record) => normalize_record(record),
            None => {
                warn!(kind = json_type_name(item), "Non-object search record, using fallbacks");
                normalize_record(&empty)
            }
        })
        .collect();

    info!(count = papers.len(), "Normalized search response");
    Ok(papers)
}

/// Resolve every canonical field of one record.
pub fn normalize_record(record: &RawRecord) -> Paper {
    let id = resolve_string(record, keys::ID).unwrap_or_else(generate_id);
    let authors = resolve_string(record, keys::NAMES).unwrap_or_else(|| UNKNOWN_NAMES.to_string());
    let date = resolve_string(record, keys::DATE).unwrap_or_default();
    let year = resolve_string(record, keys::YEAR).unwrap_or_else(|| year_from_date(&date));

    Paper {
        title: resolve_string(record, keys::TITLE).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        journal: resolve_string(record, keys::JOURNAL)
            .unwrap_or_else(|| UNKNOWN_JOURNAL.to_string()),
        doi: resolve_string(record, keys::DOI).unwrap_or_else(|| NO_DOI.to_string()),
        keywords: resolve(record, keys::KEYWORDS)
            .map(keywords_from_value)
            .unwrap_or_default(),
        match_percent: resolve(record, keys::MATCH_PERCENT)
            .and_then(percent_from_value)
            .unwrap_or(0.0),
        id,
        authors,
        year,
        date,
    }
}

/// First value among `keys` that is present and not null
fn resolve<'a>(record: &'a RawRecord, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| !v.is_null())
}

fn resolve_string(record: &RawRecord, keys: &[&str]) -> Option<String> {
    resolve(record, keys).and_then(value_to_string)
}

/// Convert JSON value to string
fn value_to_string(val: &Value) -> Option<String> {
    match val {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => None,
        _ => Some(val.to_string()),
    }
}

/// Date with any time suffix (from the first `T`) removed
fn year_from_date(date: &str) -> String {
    match date.find('T') {
        Some(idx) => date[..idx].to_string(),
        None => date.to_string(),
    }
}

fn keywords_from_value(val: &Value) -> Vec<String> {
    match val {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
        // Arrays are taken element for element; null entries become empty strings
        Value::Array(items) => items
            .iter()
            .map(|item| value_to_string(item).unwrap_or_default())
            .collect(),
        other => {
            debug!(kind = json_type_name(other), "Ignoring keywords of unexpected type");
            Vec::new()
        }
    }
}

fn percent_from_value(val: &Value) -> Option<f64> {
    let raw = match val {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    }?;
    raw.is_finite().then(|| raw.clamp(0.0, 100.0))
}

/// Random identifier for records the service sent without one
fn generate_id() -> String {
    format!("gen-{:016x}", rand::random::<u64>())
}

fn json_type_name(val: &Value) -> &'static str {
    match val {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
