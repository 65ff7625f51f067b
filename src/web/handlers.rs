//! HTTP handlers and text exposition rendering.

use crate::metrics::data::MetricFamily;
use crate::web::config::ScrapePolicy;
use crate::web::router::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

/// Content type of the Prometheus text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Escape a label value for the exposition format.
fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Escape a help string for the exposition format.
fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Render derived families as Prometheus text exposition format.
///
/// All schema metrics are gauges; families with no samples still emit
/// their HELP/TYPE header so the metric stays discoverable.
pub fn render_exposition(families: &[MetricFamily]) -> String {
    let mut out = String::new();

    for family in families {
        out.push_str(&format!("# HELP {} {}\n", family.name, escape_help(&family.help)));
        out.push_str(&format!("# TYPE {} gauge\n", family.name));

        for sample in &family.samples {
            if family.label_names.is_empty() {
                out.push_str(&format!("{} {}\n", family.name, sample.value));
            } else {
                let labels = family
                    .label_names
                    .iter()
                    .zip(&sample.label_values)
                    .map(|(name, value)| format!("{}=\"{}\"", name, escape_label_value(value)))
                    .collect::<Vec<_>>()
                    .join(",");
                out.push_str(&format!("{}{{{}}} {}\n", family.name, labels, sample.value));
            }
        }
    }

    out
}

fn exposition_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], body).into_response()
}

/// Scrape endpoint: run one poll and serve the derived samples.
///
/// A failed poll never crashes the process; depending on the configured
/// policy the scrape either serves the last successful poll's body or
/// fails with HTTP 500.
pub async fn scrape_metrics(State(state): State<AppState>) -> Response {
    match state.collector.poll().await {
        Ok(families) => {
            let body = render_exposition(&families);
            *state.last_good.write().await = Some(body.clone());
            exposition_response(body)
        }
        Err(e) => {
            error!("poll failed: {}", e);
            if state.policy == ScrapePolicy::ServeStale {
                if let Some(stale) = state.last_good.read().await.clone() {
                    return exposition_response(stale);
                }
            }
            (StatusCode::INTERNAL_SERVER_ERROR, format!("poll failed: {}\n", e)).into_response()
        }
    }
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "hue_exporter",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
