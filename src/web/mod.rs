//! Web server exposing the scrape and health endpoints.

pub mod config;
pub mod handlers;
pub mod router;

// Re-export commonly used items
pub use config::{BasicAuth, ScrapePolicy, WebConfig};
pub use router::create_app;

use crate::error::{ExporterError, Result};
use crate::metrics::Collector;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Start the web server with the provided configuration and collector.
pub async fn start_web_server(config: WebConfig, collector: Arc<Collector>) -> Result<()> {
    let app = create_app(collector, &config);

    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| ExporterError::config_error(format!("Invalid bind address: {}", e)))?;

    info!("Starting Hue exporter on http://{}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ExporterError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ExporterError::web_server_error(format!("Server error: {}", e)))?;

    Ok(())
}
