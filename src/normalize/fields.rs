//! Structured field set produced by the parsers

use std::collections::BTreeMap;

use serde::Serialize;

use super::error::ParseResult;

/// A single typed field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl FieldValue {
    /// Infer the type of a raw token
    ///
    /// Precedence: `true`/`false`, then integer, then finite float, else the
    /// text itself. Non-finite floats (`NaN`, `inf`) stay strings since JSON
    /// cannot carry them.
    pub fn coerce(raw: &str) -> Self {
        match raw {
            "true" => FieldValue::Bool(true),
            "false" => FieldValue::Bool(false),
            _ => {
                if let Ok(n) = raw.parse::<i64>() {
                    FieldValue::Int(n)
                } else if let Some(f) = parse_finite_float(raw) {
                    FieldValue::Float(f)
                } else {
                    FieldValue::Str(raw.to_string())
                }
            }
        }
    }
}

pub(super) fn parse_finite_float(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|f| f.is_finite())
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// Named fields, kept sorted by key so output is deterministic
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, FieldValue>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field; a repeated key replaces the earlier value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize as a single-line JSON object
    pub fn to_json(&self) -> ParseResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
