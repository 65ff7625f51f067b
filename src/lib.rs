//! # Hue Exporter - Prometheus metrics for Philips Hue bridges
//!
//! A small exporter that polls a Hue bridge for device state and re-exposes
//! it as Prometheus gauges. Which metrics exist is entirely schema-driven:
//! a JSON document maps device fields to metric names, labels and values,
//! and the extraction engine derives typed samples from the heterogeneous,
//! partially-populated records the bridge returns.
//!
//! ## Features
//!
//! - **Schema-driven metrics**: declare metrics as data, not code
//! - **Lights and sensors**: flattened into uniform field mappings
//! - **Robust under partial data**: missing labels become empty strings,
//!   missing value fields skip the record, wrong types fail loudly
//! - **Stale-or-fail scrapes**: explicit policy for bridge outages
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hue_exporter::{start_web_server, Collector, HueBridge, MetricSchema, WebConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = Arc::new(MetricSchema::from_file("hue_metrics.json")?);
//!     let bridge = HueBridge::new("http://192.168.1.2", "token")?;
//!     let collector = Arc::new(Collector::new(schema, Box::new(bridge)));
//!
//!     start_web_server(WebConfig::default(), collector).await?;
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod error;
pub mod metrics;
pub mod web;

// Re-export public API
pub use bridge::HueBridge;
pub use error::{ExporterError, Result};
pub use metrics::{
    collector::Collector,
    data::{DeviceRecord, FieldValue, MetricFamily, Sample},
    schema::{MetricDef, MetricSchema},
    traits::RecordSource,
};
pub use web::{start_web_server, ScrapePolicy, WebConfig};

/// The default port the exporter listens on
pub const DEFAULT_LISTEN_PORT: u16 = 9773;

/// The default metric schema file
pub const DEFAULT_SCHEMA_FILE: &str = "hue_metrics.json";
