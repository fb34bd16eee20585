// Handlers: version, snapshot ingest, chart query

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use super::AppState;
use crate::identity::MS_PER_MINUTE;
use crate::models::{SystemSnapshot, check_alerts, normalize};
use crate::snapshot_repo::chart_query;
use crate::version::{NAME, VERSION};

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// PUT /endpoint/{endpoint_id}/system — ingest one snapshot. Idempotent:
/// repeat submissions within a minute upsert the same row. Alerts produced
/// here are handed to the delivery channel and forgotten.
pub(super) async fn ingest_handler(
    State(state): State<AppState>,
    Path(endpoint_id): Path<String>,
    axum::Json(raw): axum::Json<SystemSnapshot>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (record, endpoint_state, bucket_ts) = normalize(&raw, &endpoint_id);
    let id_hex = hex::encode(&record.id);

    state
        .repo
        .upsert_snapshot(&record)
        .await
        .map_err(internal)?;
    state
        .repo
        .upsert_endpoint_state(&endpoint_state)
        .await
        .map_err(internal)?;

    for alert in check_alerts(&raw, &state.resources) {
        tracing::debug!(
            endpoint_id = %endpoint_id,
            resource = ?alert.resource,
            "threshold alert raised"
        );
        if state.alert_tx.send(alert).await.is_err() {
            tracing::warn!("alert channel closed; dropping alert");
        }
    }

    Ok(axum::Json(serde_json::json!({
        "id": id_hex,
        "t": bucket_ts,
    })))
}

#[derive(Debug, Deserialize)]
pub(super) struct ChartQueryParams {
    /// Range start, ms since epoch.
    pub start: i64,
    /// Range end, ms since epoch. Absent means "up to now".
    pub end: Option<i64>,
    /// Bucket width in ms. Absent or below native resolution is clamped to
    /// one minute.
    pub interval: Option<i64>,
}

/// GET /endpoint/{endpoint_id}/chart?start=&end=&interval=
pub(super) async fn chart_handler(
    State(state): State<AppState>,
    Path(endpoint_id): Path<String>,
    Query(params): Query<ChartQueryParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let interval = params.interval.unwrap_or(MS_PER_MINUTE).max(MS_PER_MINUTE);
    let chart_data = chart_query::get_system_chart(
        &state.repo,
        &endpoint_id,
        params.start,
        params.end,
        interval,
    )
    .await
    .map_err(internal)?;
    Ok(axum::Json(chart_data))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
