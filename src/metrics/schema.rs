//! Metric schema: the declarative list of metrics to derive.
//!
//! The schema is loaded once at process start from a JSON document and is
//! immutable for the life of the process; every poll borrows it read-only,
//! so concurrent scrapes need no synchronization around it.

use crate::error::{ExporterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One schema entry: how to derive one output metric from one device kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDef {
    /// Device kind this definition applies to (e.g. `"light"`)
    pub device_kind: String,
    /// Output metric identifier (e.g. `hue_light_state`)
    pub name: String,
    /// Human-readable description
    pub help: String,
    /// Ordered record field names to expose as labels.
    ///
    /// Order is significant: it defines label identity across samples.
    pub labels: Vec<String>,
    /// Record field supplying the sample value.
    ///
    /// When absent, every matching record yields a constant `1.0`
    /// (an "info" metric carrying only labels).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_field: Option<String>,
}

impl MetricDef {
    /// Exposition label names: lowercased, same order as `labels`.
    pub fn exposition_label_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.to_lowercase()).collect()
    }
}

/// The full, ordered metric schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricSchema {
    /// Metric definitions in output order
    pub metrics: Vec<MetricDef>,
}

impl MetricSchema {
    /// Load and validate a schema from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ExporterError::schema_error(format!(
                "failed to read schema file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate a schema from a JSON string.
    pub fn from_json(contents: &str) -> Result<Self> {
        let schema: Self = serde_json::from_str(contents)
            .map_err(|e| ExporterError::schema_error(format!("invalid schema JSON: {}", e)))?;
        schema.validate()?;
        Ok(schema)
    }

    /// Validate schema invariants.
    ///
    /// Metric names must be non-empty and unique within the schema, and a
    /// definition's label list must not contain duplicates. Anything the
    /// engine can cope with at derivation time (missing fields, unknown
    /// device kinds) is deliberately not checked here.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for def in &self.metrics {
            if def.name.is_empty() {
                return Err(ExporterError::schema_error(format!(
                    "metric for device kind '{}' has an empty name",
                    def.device_kind
                )));
            }
            if !names.insert(def.name.as_str()) {
                return Err(ExporterError::schema_error(format!(
                    "duplicate metric name '{}'",
                    def.name
                )));
            }
            let mut labels = HashSet::new();
            for label in &def.labels {
                if !labels.insert(label.as_str()) {
                    return Err(ExporterError::schema_error(format!(
                        "metric '{}' declares label '{}' more than once",
                        def.name, label
                    )));
                }
            }
        }
        Ok(())
    }
}
