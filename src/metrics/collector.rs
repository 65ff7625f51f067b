//! Core sample derivation: label derivation, value coercion and the
//! per-poll extraction engine.

use crate::error::{ExporterError, Result};
use crate::metrics::data::{DeviceRecord, MetricFamily, Sample};
use crate::metrics::schema::{MetricDef, MetricSchema};
use crate::metrics::traits::RecordSource;
use std::sync::Arc;
use tracing::debug;

/// Derive the ordered label-value sequence for one record.
///
/// Total: a missing label field becomes the empty string, never an error
/// and never a skipped record. Every value is lowercased except for the
/// label named `"name"`: device display names are case-sensitive
/// identifiers and must not be mangled, while folding everything else
/// avoids accidental series duplication from inconsistent casing in
/// bridge data.
pub fn derive_labels(labels: &[String], record: &DeviceRecord) -> Vec<String> {
    labels
        .iter()
        .map(|label| {
            let rendered = match record.get(label) {
                Some(value) => value.render(),
                None => String::new(),
            };
            if label == "name" {
                rendered
            } else {
                rendered.to_lowercase()
            }
        })
        .collect()
}

/// Coerce a record's value field into the sample value.
///
/// Returns `Ok(None)` when the record has no such field; the record is
/// skipped, not an error. A definition without a value field is an "info"
/// metric and always yields `1.0`. String and nested values fail the whole
/// poll: they mean the schema and the bridge data disagree.
pub fn coerce_value(value_field: Option<&str>, record: &DeviceRecord) -> Result<Option<f64>> {
    use crate::metrics::data::FieldValue;

    let Some(field) = value_field else {
        return Ok(Some(1.0));
    };

    match record.get(field) {
        None => Ok(None),
        Some(FieldValue::Float(f)) => Ok(Some(*f)),
        Some(FieldValue::Int(i)) => Ok(Some(*i as f64)),
        Some(FieldValue::Bool(b)) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Some(other) => Err(ExporterError::UnsupportedValueType {
            field: field.to_string(),
            value_type: other.type_name(),
            record: serde_json::to_string(&record.fields).unwrap_or_default(),
        }),
    }
}

/// Derive all samples for one metric definition from the matching records.
fn derive_family(def: &MetricDef, records: &[DeviceRecord]) -> Result<MetricFamily> {
    let mut samples = Vec::new();

    for record in records.iter().filter(|r| r.kind == def.device_kind) {
        let Some(value) = coerce_value(def.value_field.as_deref(), record)? else {
            continue;
        };
        samples.push(Sample {
            label_values: derive_labels(&def.labels, record),
            value,
        });
    }

    Ok(MetricFamily {
        name: def.name.clone(),
        help: def.help.clone(),
        label_names: def.exposition_label_names(),
        samples,
    })
}

/// The extraction engine: drives the metric schema over a record source.
///
/// Stateless across polls; each call to [`poll`](Self::poll) fetches a
/// fresh record set and derives a fresh sample set, so concurrent polls
/// are independent and need no locking.
pub struct Collector {
    schema: Arc<MetricSchema>,
    source: Box<dyn RecordSource>,
}

impl Collector {
    /// Create a collector over the given schema and record source.
    pub fn new(schema: Arc<MetricSchema>, source: Box<dyn RecordSource>) -> Self {
        Self { schema, source }
    }

    /// The schema this collector derives from.
    pub fn schema(&self) -> &MetricSchema {
        &self.schema
    }

    /// Run one full poll cycle: fetch records, derive every family.
    ///
    /// Either the whole poll's samples are returned or none are: any
    /// coercion failure aborts remaining derivation and surfaces as a
    /// single error to the caller, which decides between failing the
    /// scrape and serving stale data.
    pub async fn poll(&self) -> Result<Vec<MetricFamily>> {
        let records = self.source.fetch_records().await?;
        debug!(records = records.len(), "fetched device records");
        self.derive(&records)
    }

    /// Derive all families from an already-fetched record set.
    pub fn derive(&self, records: &[DeviceRecord]) -> Result<Vec<MetricFamily>> {
        let mut families = Vec::with_capacity(self.schema.metrics.len());
        for def in &self.schema.metrics {
            let family = derive_family(def, records)?;
            debug!(metric = %family.name, samples = family.samples.len(), "derived family");
            families.push(family);
        }
        Ok(families)
    }
}
