//! Global Prometheus registry plus the `/metrics` and `/health` endpoints
//! every binary exposes (§ambient "Metrics", §6 "GET /health").

use {
    axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router},
    prometheus::{Encoder, TextEncoder},
    std::{
        net::SocketAddr,
        sync::{Arc, OnceLock},
    },
};

static PROM_REGISTRY: OnceLock<prometheus::Registry> = OnceLock::new();
static STORAGE_REGISTRY: OnceLock<prometheus_metric_storage::StorageRegistry> = OnceLock::new();

/// Creates the process-wide registry. Every metric in the binary, no matter
/// which crate defines it, ends up registered here. Must be called exactly
/// once, before any `#[derive(MetricStorage)]` struct is first instantiated.
pub fn setup_registry(namespace: Option<String>) {
    let registry = prometheus::Registry::new();
    let storage = prometheus_metric_storage::StorageRegistry::new(registry.clone(), namespace);
    PROM_REGISTRY
        .set(registry)
        .unwrap_or_else(|_| panic!("setup_registry called more than once"));
    STORAGE_REGISTRY
        .set(storage)
        .unwrap_or_else(|_| panic!("setup_registry called more than once"));
}

pub fn get_registry() -> &'static prometheus::Registry {
    PROM_REGISTRY.get().expect("setup_registry must run before the registry is used")
}

/// Backs every `Metrics::instance(observe::metrics::storage_registry())` call
/// site across the workspace.
pub fn storage_registry() -> &'static prometheus_metric_storage::StorageRegistry {
    STORAGE_REGISTRY
        .get()
        .expect("setup_registry must run before the registry is used")
}

/// A binary's notion of "still alive" for `/health`. Implementations decide
/// what that means for them (an open database pool, a responsive RPC
/// endpoint, a fresh-enough last-seen block).
#[async_trait::async_trait]
pub trait LivenessChecking: Send + Sync {
    async fn is_alive(&self) -> bool;
}

/// Serves `/metrics` (Prometheus text exposition) and `/health` (200 while
/// `liveness` reports alive, 503 otherwise) until the process is killed.
pub async fn serve_metrics(liveness: Arc<dyn LivenessChecking>, addr: SocketAddr) -> std::io::Result<()> {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(liveness);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "serving metrics and health endpoints");
    axum::serve(listener, app).await
}

async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = get_registry().gather();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(?err, "failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, Vec::new());
    }
    (StatusCode::OK, buffer)
}

async fn health_handler(State(liveness): State<Arc<dyn LivenessChecking>>) -> impl IntoResponse {
    if liveness.is_alive().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysAlive;
    #[async_trait::async_trait]
    impl LivenessChecking for AlwaysAlive {
        async fn is_alive(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn health_handler_reports_ok_when_alive() {
        let status = health_handler(State(Arc::new(AlwaysAlive) as Arc<dyn LivenessChecking>)).await;
        assert_eq!(status.into_response().status(), StatusCode::OK);
    }
}
