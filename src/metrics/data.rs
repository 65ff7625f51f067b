//! Data structures for device records and derived samples.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A dynamically-typed field value as polled from the bridge.
///
/// Bridge payloads mix numbers, booleans, strings and the occasional
/// nested structure inside one device mapping, so fields are carried as a
/// tagged variant rather than as raw JSON scattered through the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean field (e.g. `state_on`, `config_reachable`)
    Bool(bool),
    /// Integer field (e.g. `state_bri`, `config_battery`)
    Int(i64),
    /// Floating-point field (e.g. `state_temperature`)
    Float(f64),
    /// String field (e.g. `name`, `model_id`, `state_lastupdated`)
    Str(String),
    /// Anything else the bridge sends (arrays, nested objects).
    ///
    /// Renderable as a label, never coercible to a sample value.
    Json(serde_json::Value),
}

impl FieldValue {
    /// Convert a JSON value into a field value.
    ///
    /// Returns `None` for JSON `null`: an explicit null and a missing
    /// field are the same thing to the extraction engine, so nulls are
    /// never stored in a record.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Self::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Int(i))
                } else {
                    Some(Self::Float(n.as_f64().unwrap_or(0.0)))
                }
            }
            serde_json::Value::String(s) => Some(Self::Str(s)),
            other => Some(Self::Json(other)),
        }
    }

    /// Render the value to its canonical label string form.
    ///
    /// Booleans render as `"1"`/`"0"`, numbers in their natural decimal
    /// form, strings verbatim. Case folding is the caller's concern.
    pub fn render(&self) -> String {
        match self {
            Self::Bool(true) => "1".to_string(),
            Self::Bool(false) => "0".to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => s.clone(),
            Self::Json(v) => v.to_string(),
        }
    }

    /// The dynamic type name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Json(serde_json::Value::Array(_)) => "array",
            Self::Json(_) => "object",
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// One polled snapshot of a single device's fields.
///
/// Produced fresh by the record source on every poll, read-only to the
/// extraction engine, discarded after sample derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device kind this record belongs to (e.g. `"light"`, `"sensor"`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Field name → value mapping; fields vary by device kind
    #[serde(rename = "result")]
    pub fields: BTreeMap<String, FieldValue>,
}

impl DeviceRecord {
    /// Create an empty record for the given device kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Insert a field, dropping JSON nulls.
    pub fn insert_json(&mut self, name: impl Into<String>, value: serde_json::Value) {
        if let Some(value) = FieldValue::from_json(value) {
            self.fields.insert(name.into(), value);
        }
    }

    /// Insert an already-typed field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// One fully-resolved observation ready for exposition.
///
/// `label_values` is positionally aligned with the owning definition's
/// label list. Two samples with the same metric name and label values are
/// the same time series downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Ordered label values, one per schema label
    pub label_values: Vec<String>,
    /// The gauge value
    pub value: f64,
}

/// All samples derived for one metric definition in one poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricFamily {
    /// Output metric identifier (e.g. `hue_light_state`)
    pub name: String,
    /// Human-readable description
    pub help: String,
    /// Exposition label names, lowercased, same order as the definition
    pub label_names: Vec<String>,
    /// Samples in record-enumeration order
    pub samples: Vec<Sample>,
}
