//! Schema-free record documents
//!
//! A [`Record`] is any JSON object. The server owns two fields, `id` and
//! `createdAt`, which are stamped on create and carried over on update.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{CREATED_AT_FIELD, ID_FIELD};
use crate::types::{Error, RecordId, Result};

/// A single pokemon entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Decode a client-supplied JSON string into a record
    ///
    /// Anything other than a JSON object is rejected as a validation error.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| Error::validation(format!("record is not valid JSON: {}", e)))?;
        Record::try_from(value)
            .map_err(|other| Error::validation(format!("record must be a JSON object, got {}", json_kind(&other))))
    }

    /// Server-assigned id, if stamped
    pub fn id(&self) -> Option<RecordId> {
        self.0.get(ID_FIELD).and_then(Value::as_u64)
    }

    /// Server-assigned creation timestamp, if stamped
    pub fn created_at(&self) -> Option<&str> {
        self.0.get(CREATED_AT_FIELD).and_then(Value::as_str)
    }

    /// Look up a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field, returning the previous value
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// Stamp the generated fields, replacing anything the client sent for them
    pub fn stamp(&mut self, id: RecordId, created_at: &str) {
        self.0.insert(ID_FIELD.to_string(), Value::from(id));
        self.0.insert(CREATED_AT_FIELD.to_string(), Value::from(created_at));
    }

    /// All fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert into a plain JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl TryFrom<Value> for Record {
    /// The rejected value is handed back unchanged
    type Error = Value;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Record(map)),
            other => Err(other),
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.into_value()
    }
}

/// ISO-8601 UTC with millisecond precision and a `Z` suffix
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
