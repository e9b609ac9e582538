use anyhow::Result;
use axum::http::{header::HeaderName, HeaderMap, HeaderValue, StatusCode};
use axum::{extract::Extension, handler::get, AddExtensionLayer, Router};
use futures::prelude::*;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::get_metrics_recorder;

const METRIC_SCRAPES: &str = "weft_coordinator_metrics_scrapes";

/// Spawn the Prometheus scrape endpoint for the coordinator's metrics.
///
/// Every series the coordinator task registers (events, handler errors,
/// snapshot broadcasts, connected executors) lands in the global recorder
/// this endpoint renders.
pub fn spawn_metrics_server(config: &Config, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<Result<()>> {
    metrics::register_counter!(METRIC_SCRAPES, metrics::Unit::Count, "scrapes served on the metrics endpoint");
    let handle = get_metrics_recorder().handle();
    let app = Router::new().route("/metrics", get(render_metrics)).layer(AddExtensionLayer::new(handle));
    let addr = ([0, 0, 0, 0], config.metrics_port).into();
    let server = axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async move {
            let _res = shutdown.recv().await;
        });
    tracing::info!(metrics_port = config.metrics_port, "metrics endpoint is listening on /metrics");
    tokio::spawn(server.map_err(anyhow::Error::from))
}

/// Render the current contents of the metrics registry.
async fn render_metrics(Extension(handle): Extension<PrometheusHandle>) -> (StatusCode, HeaderMap, String) {
    metrics::increment_counter!(METRIC_SCRAPES);
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("content-type"), HeaderValue::from_static("text/plain; version=0.0.4"));
    (StatusCode::OK, headers, handle.render())
}
