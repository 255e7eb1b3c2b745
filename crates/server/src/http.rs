//! HTTP surface: metrics exposition plus liveness and readiness probes.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Content type of the Prometheus text format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub const LIVENESS_BODY: &str = "I am alive, please don't kill me...";
pub const READINESS_BODY: &str = "I am ready, please send me some requests...";

pub fn router(metrics: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/liveness", get(liveness))
        .route("/readiness", get(readiness))
        .with_state(metrics)
}

/// Serve `app` until `shutdown` flips to `true`.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
}

/// Axum handler: `GET /metrics` → Prometheus text.
async fn metrics_handler(State(metrics): State<PrometheusHandle>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], metrics.render())
}

async fn liveness() -> &'static str {
    LIVENESS_BODY
}

async fn readiness() -> &'static str {
    READINESS_BODY
}
