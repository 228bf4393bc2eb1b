//! Validated sensor records and the batches they travel in.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field carrying the receipt timestamp assigned at validation.
pub const TIMESTAMP_FIELD: &str = "timestamp";
/// Producer-assigned device identifier.
pub const DEVICE_ID_FIELD: &str = "device_id";
/// Producer-assigned per-device sequence number.
pub const SEQUENCE_FIELD: &str = "sequence";

/// A scalar sensor value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl FieldValue {
    /// Convert a parsed JSON value, rejecting arrays and objects.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Self::Null),
            serde_json::Value::Bool(b) => Some(Self::Bool(b)),
            serde_json::Value::Number(n) => Some(Self::Number(n)),
            serde_json::Value::String(s) => Some(Self::Text(s)),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => n.as_u64(),
            Self::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Text rendering used for tabular cells; null renders empty.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed(""),
            Self::Bool(true) => Cow::Borrowed("true"),
            Self::Bool(false) => Cow::Borrowed("false"),
            Self::Number(n) => Cow::Owned(n.to_string()),
            Self::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

/// One normalized sensor reading.
///
/// Only the validator constructs records, so every record carries a receipt
/// timestamp as its first field. There are no mutating accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub(crate) fn from_fields(fields: IndexMap<String, FieldValue>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// True when the field is present with a non-null value.
    pub fn has_value(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_null())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn timestamp(&self) -> &str {
        match self.fields.get(TIMESTAMP_FIELD) {
            Some(FieldValue::Text(ts)) => ts,
            _ => "",
        }
    }

    pub fn device_id(&self) -> Option<&FieldValue> {
        self.get(DEVICE_ID_FIELD).filter(|v| !v.is_null())
    }

    pub fn sequence(&self) -> Option<u64> {
        self.get(SEQUENCE_FIELD).and_then(FieldValue::as_u64)
    }
}

/// Records flushed together, in queue order. Consumed once by the router.
#[derive(Debug, Default)]
pub struct Batch {
    records: Vec<Record>,
}

impl Batch {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
