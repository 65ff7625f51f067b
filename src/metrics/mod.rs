//! Schema-driven metric extraction.
//!
//! This module holds the core of the exporter: the data model for polled
//! device records, the declarative metric schema, and the engine that
//! turns one into samples according to the other.

pub mod collector;
pub mod data;
pub mod schema;
pub mod traits;

// Re-export commonly used items
pub use collector::Collector;
pub use data::{DeviceRecord, FieldValue, MetricFamily, Sample};
pub use schema::{MetricDef, MetricSchema};
pub use traits::RecordSource;
