// Chart query: native per-minute scan, or store-side bucket averaging when
// the requested interval is coarser than the sampling rate.

use tracing::instrument;

use super::{SnapshotRepo, StoreError};
use crate::identity::MS_PER_MINUTE;
use crate::models::{Chart, ChartData};

/// Builds chart data for one endpoint over [start, end] (end of None means
/// "up to now") at `interval_ms` resolution. Intervals at native resolution
/// stream raw rows; coarser intervals delegate averaging to the store so
/// thousands of per-minute rows never cross the wire per chart request.
/// Intervals below native must be clamped by the caller before this runs.
#[instrument(skip(repo), fields(operation = "get_system_chart"))]
pub async fn get_system_chart(
    repo: &SnapshotRepo,
    endpoint_id: &str,
    start: i64,
    end: Option<i64>,
    interval_ms: i64,
) -> Result<ChartData, StoreError> {
    if interval_ms == MS_PER_MINUTE {
        return get_system_chart_single(repo, endpoint_id, start, end).await;
    }

    let mut chart = Chart::new(start, end, interval_ms);
    let rows = repo
        .get_bucketed_averages(endpoint_id, start, end, interval_ms)
        .await?;
    for row in rows {
        chart.add("cpu_usage", row.bucket, row.cpu_usage);
        chart.add("mem_usage", row.bucket, row.mem_usage);
        chart.add("swap_usage", row.bucket, row.swap_usage);
        chart.add("huge_usage", row.bucket, row.huge_usage);
    }
    Ok(chart.export())
}

/// Native-resolution path: one chart point per stored minute, straight
/// scan and project.
async fn get_system_chart_single(
    repo: &SnapshotRepo,
    endpoint_id: &str,
    start: i64,
    end: Option<i64>,
) -> Result<ChartData, StoreError> {
    let mut chart = Chart::new(start, end, MS_PER_MINUTE);
    let records = repo.get_records_in_range(endpoint_id, start, end).await?;
    for record in records {
        chart.add("cpu_usage", record.created_at, record.cpu_usage);
        chart.add("mem_usage", record.created_at, record.mem_usage);
        chart.add("swap_usage", record.created_at, record.swap_usage);
        chart.add("huge_usage", record.created_at, record.huge_usage);
    }
    Ok(chart.export())
}
