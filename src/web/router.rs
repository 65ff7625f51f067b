//! Web application router, state and middleware setup.

use crate::metrics::Collector;
use crate::web::config::{BasicAuth, ScrapePolicy, WebConfig};
use crate::web::handlers;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use base64::Engine;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Shared state behind the scrape endpoint.
///
/// The collector is stateless across polls; the only retained state is
/// the last successfully rendered body, kept for the serve-stale policy.
#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<Collector>,
    pub last_good: Arc<RwLock<Option<String>>>,
    pub policy: ScrapePolicy,
}

/// Check the `Authorization` header against the configured credentials.
async fn basic_auth_layer(
    State(auth): State<Arc<BasicAuth>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .and_then(|v| base64::engine::general_purpose::STANDARD.decode(v).ok())
        .and_then(|v| String::from_utf8(v).ok())
        .is_some_and(|decoded| decoded == format!("{}:{}", auth.user, auth.password));

    if authorized {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Basic realm=\"metrics\"")],
            "Invalid username or password",
        )
            .into_response()
    }
}

/// Create the axum application with all routes and middleware.
pub fn create_app(collector: Arc<Collector>, config: &WebConfig) -> Router {
    let state = AppState {
        collector,
        last_good: Arc::new(RwLock::new(None)),
        policy: config.on_error,
    };

    let mut app = Router::new()
        .route("/metrics", get(handlers::scrape_metrics))
        .route("/health", get(handlers::health_check))
        .with_state(state);

    if let Some(auth) = &config.auth {
        app = app.layer(middleware::from_fn_with_state(
            Arc::new(auth.clone()),
            basic_auth_layer,
        ));
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExporterError, Result};
    use crate::metrics::data::DeviceRecord;
    use crate::metrics::schema::{MetricDef, MetricSchema};
    use crate::metrics::traits::RecordSource;
    use async_trait::async_trait;
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    /// In-memory source: serves a fixed record set, optionally failing
    /// after the first fetch.
    struct FakeSource {
        records: Vec<DeviceRecord>,
        fail_after_first: bool,
        fetched: AtomicBool,
    }

    impl FakeSource {
        fn new(records: Vec<DeviceRecord>) -> Self {
            Self {
                records,
                fail_after_first: false,
                fetched: AtomicBool::new(false),
            }
        }

        fn failing_after_first(records: Vec<DeviceRecord>) -> Self {
            Self {
                records,
                fail_after_first: true,
                fetched: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl RecordSource for FakeSource {
        async fn fetch_records(&self) -> Result<Vec<DeviceRecord>> {
            if self.fail_after_first && self.fetched.swap(true, Ordering::SeqCst) {
                return Err(ExporterError::bridge_error("bridge unreachable"));
            }
            Ok(self.records.clone())
        }
    }

    fn test_schema() -> MetricSchema {
        MetricSchema {
            metrics: vec![MetricDef {
                device_kind: "light".to_string(),
                name: "hue_light_state".to_string(),
                help: "light status".to_string(),
                labels: vec!["name".to_string()],
                value_field: Some("state_on".to_string()),
            }],
        }
    }

    fn test_records() -> Vec<DeviceRecord> {
        let mut record = DeviceRecord::new("light");
        record.insert("name", "Lamp");
        record.insert("state_on", true);
        vec![record]
    }

    fn app_with(source: FakeSource, config: &WebConfig) -> Router {
        let collector = Collector::new(Arc::new(test_schema()), Box::new(source));
        create_app(Arc::new(collector), config)
    }

    async fn get_response(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_scrape_serves_exposition() {
        let app = app_with(FakeSource::new(test_records()), &WebConfig::default());
        let (status, body) = get_response(&app, "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("hue_light_state{name=\"Lamp\"} 1\n"));
    }

    #[tokio::test]
    async fn test_failed_poll_serves_stale_body() {
        let config = WebConfig::default().with_scrape_policy(ScrapePolicy::ServeStale);
        let app = app_with(FakeSource::failing_after_first(test_records()), &config);

        let (status, first) = get_response(&app, "/metrics").await;
        assert_eq!(status, StatusCode::OK);

        let (status, second) = get_response(&app, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failed_poll_fails_scrape_under_fail_policy() {
        let config = WebConfig::default().with_scrape_policy(ScrapePolicy::Fail);
        let app = app_with(FakeSource::failing_after_first(test_records()), &config);

        let (status, _) = get_response(&app, "/metrics").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get_response(&app, "/metrics").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("bridge unreachable"));
    }

    #[tokio::test]
    async fn test_failed_first_poll_has_no_stale_fallback() {
        let source = FakeSource {
            records: Vec::new(),
            fail_after_first: true,
            fetched: AtomicBool::new(true),
        };
        let app = app_with(source, &WebConfig::default());

        let (status, _) = get_response(&app, "/metrics").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_basic_auth_rejects_missing_credentials() {
        let config = WebConfig::default().with_auth("prom", "secret");
        let app = app_with(FakeSource::new(test_records()), &config);

        let (status, _) = get_response(&app, "/metrics").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_basic_auth_accepts_valid_credentials() {
        let config = WebConfig::default().with_auth("prom", "secret");
        let app = app_with(FakeSource::new(test_records()), &config);

        let credentials = base64::engine::general_purpose::STANDARD.encode("prom:secret");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .header(header::AUTHORIZATION, format!("Basic {}", credentials))
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = app_with(FakeSource::new(test_records()), &WebConfig::default());
        let (status, body) = get_response(&app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"status\":\"ok\""));
    }
}
