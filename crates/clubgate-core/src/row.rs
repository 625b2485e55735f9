//! Resolution of untyped import rows into member candidates.
//!
//! Rows come from spreadsheet readers or JSON payloads as a mapping of
//! column name to value. Column names are whatever the person who built the
//! spreadsheet typed, so fields are located by case-insensitive header
//! matching against a list of accepted names.

use crate::constants::{DNI_HEADERS, NAME_HEADERS, ROW_NUMBER_KEYS};
use crate::dni::number_text;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// An untyped row record: column name to cell value.
pub type RowRecord = Map<String, Value>;

/// Find the first field whose header matches any candidate name.
///
/// Matching runs in two passes:
///
/// 1. exact match of the trimmed, lowercased header, honouring the order
///    of `candidates`;
/// 2. a looser pass where the lowercased header merely contains a
///    candidate (`"DNI del socio"` matches `"dni"`).
///
/// Both passes resolve ties by column order: records keep the order of the
/// sheet, and the leftmost matching column is taken.
///
/// # Examples
///
/// ```
/// use clubgate_core::row::{find_field, RowRecord};
/// use serde_json::json;
///
/// let record: RowRecord = serde_json::from_value(json!({
///     " Nombre ": "Ana",
///     "Documento Nro": "30.111.222",
/// })).unwrap();
///
/// assert_eq!(find_field(&record, &["nombre"]), Some(&json!("Ana")));
/// assert_eq!(find_field(&record, &["documento"]), Some(&json!("30.111.222")));
/// assert_eq!(find_field(&record, &["email"]), None);
/// ```
pub fn find_field<'a>(record: &'a RowRecord, candidates: &[&str]) -> Option<&'a Value> {
    let mut lowered: HashMap<String, &String> = HashMap::with_capacity(record.len());
    for key in record.keys() {
        lowered.entry(key.trim().to_lowercase()).or_insert(key);
    }

    for candidate in candidates {
        let wanted = candidate.trim().to_lowercase();
        if let Some(key) = lowered.get(&wanted) {
            return record.get(key.as_str());
        }
    }

    for (key, value) in record {
        let header = key.to_lowercase();
        if candidates
            .iter()
            .any(|c| header.contains(c.trim().to_lowercase().as_str()))
        {
            return Some(value);
        }
    }

    None
}

/// Render a cell as text: strings verbatim, numbers and booleans printed,
/// everything else empty.
pub fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_text(n),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// A member row as supplied to a bulk import, before normalization.
///
/// The raw values are kept untouched so that failures can echo back what
/// the caller sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRow {
    /// Raw full name cell
    #[serde(default)]
    pub full_name: Value,

    /// Raw DNI cell
    #[serde(default)]
    pub dni: Value,

    /// Explicit 1-based source row number, if the reader tracked one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_number: Option<usize>,
}

impl MemberRow {
    /// Build a row from text values.
    pub fn new(full_name: impl Into<String>, dni: impl Into<String>) -> Self {
        Self {
            full_name: Value::String(full_name.into()),
            dni: Value::String(dni.into()),
            row_number: None,
        }
    }

    /// Attach an explicit source row number.
    pub fn with_row_number(mut self, row_number: usize) -> Self {
        self.row_number = Some(row_number);
        self
    }

    /// Resolve a row from an untyped record using header matching.
    ///
    /// Missing columns resolve to `Value::Null`; the import pipeline
    /// reports such rows as invalid instead of failing here.
    ///
    /// # Examples
    ///
    /// ```
    /// use clubgate_core::row::{MemberRow, RowRecord};
    /// use serde_json::json;
    ///
    /// let record: RowRecord = serde_json::from_value(json!({
    ///     "Nombre Completo": "Ana Pérez",
    ///     "DNI": 30111222,
    ///     "sourceRow": 7,
    /// })).unwrap();
    ///
    /// let row = MemberRow::from_record(&record);
    /// assert_eq!(row.full_name, json!("Ana Pérez"));
    /// assert_eq!(row.dni, json!(30111222));
    /// assert_eq!(row.row_number, Some(7));
    /// ```
    pub fn from_record(record: &RowRecord) -> Self {
        Self {
            full_name: find_field(record, &NAME_HEADERS).cloned().unwrap_or_default(),
            dni: find_field(record, &DNI_HEADERS).cloned().unwrap_or_default(),
            row_number: explicit_row_number(record),
        }
    }

    /// Trimmed textual full name.
    pub fn full_name_text(&self) -> String {
        field_text(&self.full_name).trim().to_string()
    }
}

/// Read `rowNumber` / `sourceRow` as a positive integer.
///
/// Zero, negatives and non-numeric text are ignored so the caller falls
/// back to the positional row number.
fn explicit_row_number(record: &RowRecord) -> Option<usize> {
    ROW_NUMBER_KEYS
        .iter()
        .filter_map(|key| record.get(*key))
        .find_map(|value| match value {
            Value::Number(n) => n.as_u64().map(|n| n as usize),
            Value::String(s) => s.trim().parse::<usize>().ok(),
            _ => None,
        })
        .filter(|n| *n > 0)
}
