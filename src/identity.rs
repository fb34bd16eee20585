// Deterministic snapshot identity: one id per (endpoint, minute).

use sha2::{Digest, Sha256};

/// Native sampling resolution of the time series.
pub const MS_PER_MINUTE: i64 = 60_000;

/// Length of a snapshot id in bytes (truncated SHA-256).
pub const SNAPSHOT_ID_LEN: usize = 16;

/// Floors a millisecond timestamp to the start of its containing UTC minute.
pub fn truncate_minute(timestamp_ms: i64) -> i64 {
    timestamp_ms.div_euclid(MS_PER_MINUTE) * MS_PER_MINUTE
}

/// Deterministic snapshot id from endpoint id and a minute-truncated
/// millisecond timestamp. The caller truncates; this function only hashes.
/// Same (endpoint, minute) always yields the same id, which makes
/// re-submission an idempotent upsert instead of a duplicate insert.
pub fn generate_id(endpoint_id: &str, timestamp_ms: i64) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(endpoint_id.as_bytes());
    hasher.update(timestamp_ms.to_be_bytes());
    hasher.finalize()[..SNAPSHOT_ID_LEN].to_vec()
}
