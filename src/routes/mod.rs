// HTTP routes

mod http;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
};
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};

use crate::models::{Alert, Resource};
use crate::snapshot_repo::SnapshotRepo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) repo: Arc<SnapshotRepo>,
    pub(crate) resources: Arc<Vec<Resource>>,
    /// Hand-off to the alert delivery side; this service never dedupes.
    pub(crate) alert_tx: mpsc::Sender<Alert>,
}

pub fn app(
    repo: Arc<SnapshotRepo>,
    resources: Arc<Vec<Resource>>,
    alert_tx: mpsc::Sender<Alert>,
) -> Router {
    let state = AppState {
        repo,
        resources,
        alert_tx,
    };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/endpoint/{endpoint_id}/system", put(http::ingest_handler)) // PUT snapshot
        .route("/endpoint/{endpoint_id}/chart", get(http::chart_handler)) // GET chart data
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
