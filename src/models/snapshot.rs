// Snapshot wire payload and its two stored projections.
// Metrics go into the append-only time series; descriptive attributes go
// into a last-write-wins per-endpoint state row.

use serde::{Deserialize, Serialize};

use crate::identity::{generate_id, truncate_minute};

/// One health submission from a remote endpoint, as received on the wire.
/// Field keys stay short for transport (agents post one of these per minute).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSnapshot {
    /// Milliseconds since epoch at sample time; sub-minute precision is
    /// discarded at normalization.
    #[serde(rename = "t")]
    pub timestamp: i64,

    #[serde(rename = "h", default)]
    pub hostname: String,
    #[serde(rename = "u", default)]
    pub uptime: u64,
    #[serde(rename = "v", default)]
    pub virtualization: String,
    #[serde(rename = "p", default)]
    pub platform: String,
    #[serde(rename = "cc", default)]
    pub cpu_cores: i64,
    #[serde(rename = "mt", default)]
    pub mem_total: i64,
    #[serde(rename = "st", default)]
    pub swap_total: i64,
    #[serde(rename = "ht", default)]
    pub huge_total: i64,

    #[serde(rename = "pc", default)]
    pub processes: i64,
    #[serde(rename = "cu", default)]
    pub cpu_usage: f64,
    #[serde(rename = "mu", default)]
    pub mem_usage: f64,
    #[serde(rename = "su", default)]
    pub swap_usage: f64,
    #[serde(rename = "hu", default)]
    pub huge_usage: f64,
}

/// One time-series row: metrics for a single endpoint minute. Append-only;
/// the deterministic id makes re-submission within the same minute collapse
/// to a single row.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    pub id: Vec<u8>,
    pub endpoint_id: String,
    /// Minute-truncated, milliseconds since epoch.
    pub created_at: i64,
    pub cpu_usage: f64,
    pub mem_usage: f64,
    pub swap_usage: f64,
    pub huge_usage: f64,
    pub processes: i64,
}

/// Latest known descriptive state of an endpoint. One row per endpoint,
/// overwritten in place; never part of the time series.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointState {
    pub endpoint_id: String,
    pub hostname: String,
    /// Seconds. Saturated from the wire's u64 so the stored value never
    /// wraps negative.
    pub uptime: i64,
    pub virtualization: String,
    pub platform: String,
    pub cpu_cores: i64,
    pub mem_total: i64,
    pub swap_total: i64,
    pub huge_total: i64,
    /// Milliseconds since epoch of the submission that wrote this row.
    pub updated_at: i64,
}

/// Splits a wire snapshot into its stored projections. Truncates the
/// timestamp down to the start of its minute and stamps the deterministic id.
/// Returns the truncated timestamp for use as the chart/upsert key.
pub fn normalize(
    raw: &SystemSnapshot,
    endpoint_id: &str,
) -> (SnapshotRecord, EndpointState, i64) {
    let created_at = truncate_minute(raw.timestamp);
    let record = SnapshotRecord {
        id: generate_id(endpoint_id, created_at),
        endpoint_id: endpoint_id.to_string(),
        created_at,
        cpu_usage: raw.cpu_usage,
        mem_usage: raw.mem_usage,
        swap_usage: raw.swap_usage,
        huge_usage: raw.huge_usage,
        processes: raw.processes,
    };
    let state = EndpointState {
        endpoint_id: endpoint_id.to_string(),
        hostname: raw.hostname.clone(),
        uptime: i64::try_from(raw.uptime).unwrap_or(i64::MAX),
        virtualization: raw.virtualization.clone(),
        platform: raw.platform.clone(),
        cpu_cores: raw.cpu_cores,
        mem_total: raw.mem_total,
        swap_total: raw.swap_total,
        huge_total: raw.huge_total,
        updated_at: raw.timestamp,
    };
    (record, state, created_at)
}
