// SQLite snapshot store. endpoint_snapshots is the append-only time series
// (one row per endpoint per minute, keyed by the deterministic id);
// endpoint_state holds the latest descriptive attributes per endpoint.

pub mod chart_query;

use std::path::Path;
use std::str::FromStr;

use futures_util::TryStreamExt;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use thiserror::Error;
use tracing::instrument;

use crate::models::{EndpointState, SnapshotRecord};

/// Store failures. Query and decode are kept distinct: a decode failure on
/// any row aborts the whole request rather than yielding a partial chart.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot store query: {0}")]
    Query(#[from] sqlx::Error),
    #[error("snapshot store decode: {0}")]
    Decode(sqlx::Error),
}

/// One bucketed-average row from the aggregation query.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketedAverages {
    /// Bucket start, ms since epoch, left-aligned to the interval.
    pub bucket: i64,
    pub cpu_usage: f64,
    pub mem_usage: f64,
    pub swap_usage: f64,
    pub huge_usage: f64,
}

pub struct SnapshotRepo {
    pool: SqlitePool,
    retention_ms: i64,
}

impl SnapshotRepo {
    pub async fn connect(path: &str, retention_days: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        let retention_ms = (retention_days as i64) * 24 * 60 * 60 * 1000;
        Ok(Self { pool, retention_ms })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS endpoint_snapshots (
                id BLOB PRIMARY KEY,
                endpoint_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                cpu_usage REAL NOT NULL,
                mem_usage REAL NOT NULL,
                swap_usage REAL NOT NULL,
                huge_usage REAL NOT NULL,
                processes INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_snapshots_endpoint_created_at
             ON endpoint_snapshots(endpoint_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS endpoint_state (
                endpoint_id TEXT PRIMARY KEY,
                hostname TEXT NOT NULL,
                uptime INTEGER NOT NULL,
                virtualization TEXT NOT NULL,
                platform TEXT NOT NULL,
                cpu_cores INTEGER NOT NULL,
                mem_total INTEGER NOT NULL,
                swap_total INTEGER NOT NULL,
                huge_total INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upserts one time-series row keyed by its deterministic id. A repeat
    /// submission within the same minute overwrites the metrics in place, so
    /// the (endpoint, minute) invariant holds without a read-then-write.
    #[instrument(
        skip(self, record),
        fields(repo = "snapshot", operation = "upsert_snapshot")
    )]
    pub async fn upsert_snapshot(&self, record: &SnapshotRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO endpoint_snapshots
            (id, endpoint_id, created_at, cpu_usage, mem_usage, swap_usage, huge_usage, processes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT(id) DO UPDATE SET
                cpu_usage = excluded.cpu_usage,
                mem_usage = excluded.mem_usage,
                swap_usage = excluded.swap_usage,
                huge_usage = excluded.huge_usage,
                processes = excluded.processes
            "#,
        )
        .bind(&record.id)
        .bind(&record.endpoint_id)
        .bind(record.created_at)
        .bind(record.cpu_usage)
        .bind(record.mem_usage)
        .bind(record.swap_usage)
        .bind(record.huge_usage)
        .bind(record.processes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Overwrites the latest-known-state row for an endpoint.
    #[instrument(
        skip(self, state),
        fields(repo = "snapshot", operation = "upsert_endpoint_state")
    )]
    pub async fn upsert_endpoint_state(&self, state: &EndpointState) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO endpoint_state
            (endpoint_id, hostname, uptime, virtualization, platform,
             cpu_cores, mem_total, swap_total, huge_total, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&state.endpoint_id)
        .bind(&state.hostname)
        .bind(state.uptime)
        .bind(&state.virtualization)
        .bind(&state.platform)
        .bind(state.cpu_cores)
        .bind(state.mem_total)
        .bind(state.swap_total)
        .bind(state.huge_total)
        .bind(state.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_endpoint_state(
        &self,
        endpoint_id: &str,
    ) -> Result<Option<EndpointState>, StoreError> {
        let row = sqlx::query(
            "SELECT endpoint_id, hostname, uptime, virtualization, platform,
                    cpu_cores, mem_total, swap_total, huge_total, updated_at
             FROM endpoint_state WHERE endpoint_id = $1",
        )
        .bind(endpoint_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(Self::parse_state_row(&row)?))
    }

    /// Raw rows for one endpoint in [start, end] (or [start, now) when end
    /// is None), ascending by created_at. Streams off the cursor; a decode
    /// failure drops the cursor and aborts.
    #[instrument(
        skip(self),
        fields(repo = "snapshot", operation = "get_records_in_range")
    )]
    pub async fn get_records_in_range(
        &self,
        endpoint_id: &str,
        start: i64,
        end: Option<i64>,
    ) -> Result<Vec<SnapshotRecord>, StoreError> {
        let query = match end {
            Some(end) => sqlx::query(
                "SELECT id, endpoint_id, created_at, cpu_usage, mem_usage, swap_usage, huge_usage, processes
                 FROM endpoint_snapshots
                 WHERE endpoint_id = $1 AND created_at >= $2 AND created_at <= $3
                 ORDER BY created_at ASC",
            )
            .bind(endpoint_id)
            .bind(start)
            .bind(end),
            None => sqlx::query(
                "SELECT id, endpoint_id, created_at, cpu_usage, mem_usage, swap_usage, huge_usage, processes
                 FROM endpoint_snapshots
                 WHERE endpoint_id = $1 AND created_at >= $2
                 ORDER BY created_at ASC",
            )
            .bind(endpoint_id)
            .bind(start),
        };

        let mut rows = query.fetch(&self.pool);
        let mut out = Vec::new();
        while let Some(row) = rows.try_next().await? {
            out.push(Self::parse_record_row(&row)?);
        }
        Ok(out)
    }

    /// Server-side bucket averaging: groups rows by left-aligned,
    /// epoch-relative floor bucket and averages each metric, one row per
    /// populated bucket, ascending. Empty buckets produce no row.
    #[instrument(
        skip(self),
        fields(repo = "snapshot", operation = "get_bucketed_averages")
    )]
    pub async fn get_bucketed_averages(
        &self,
        endpoint_id: &str,
        start: i64,
        end: Option<i64>,
        interval_ms: i64,
    ) -> Result<Vec<BucketedAverages>, StoreError> {
        let query = match end {
            Some(end) => sqlx::query(
                "SELECT (created_at / $1) * $2 AS bucket,
                        AVG(cpu_usage) AS cpu_usage, AVG(mem_usage) AS mem_usage,
                        AVG(swap_usage) AS swap_usage, AVG(huge_usage) AS huge_usage
                 FROM endpoint_snapshots
                 WHERE endpoint_id = $3 AND created_at >= $4 AND created_at <= $5
                 GROUP BY bucket
                 ORDER BY bucket ASC",
            )
            .bind(interval_ms)
            .bind(interval_ms)
            .bind(endpoint_id)
            .bind(start)
            .bind(end),
            None => sqlx::query(
                "SELECT (created_at / $1) * $2 AS bucket,
                        AVG(cpu_usage) AS cpu_usage, AVG(mem_usage) AS mem_usage,
                        AVG(swap_usage) AS swap_usage, AVG(huge_usage) AS huge_usage
                 FROM endpoint_snapshots
                 WHERE endpoint_id = $3 AND created_at >= $4
                 GROUP BY bucket
                 ORDER BY bucket ASC",
            )
            .bind(interval_ms)
            .bind(interval_ms)
            .bind(endpoint_id)
            .bind(start),
        };

        let mut rows = query.fetch(&self.pool);
        let mut out = Vec::new();
        while let Some(row) = rows.try_next().await? {
            out.push(Self::parse_bucketed_row(&row)?);
        }
        Ok(out)
    }

    /// Deletes time-series rows older than the retention window.
    #[instrument(skip(self), fields(repo = "snapshot", operation = "prune_old_data"))]
    pub async fn prune_old_data(&self) -> anyhow::Result<u64> {
        let cutoff = (std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)?
            .as_millis() as i64)
            - self.retention_ms;
        let r = sqlx::query("DELETE FROM endpoint_snapshots WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }

    /// Reclaim space after deletes (run periodically after pruning).
    #[instrument(skip(self), fields(repo = "snapshot", operation = "vacuum"))]
    pub async fn vacuum(&self) -> anyhow::Result<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }

    fn parse_record_row(row: &SqliteRow) -> Result<SnapshotRecord, StoreError> {
        Ok(SnapshotRecord {
            id: row.try_get("id").map_err(StoreError::Decode)?,
            endpoint_id: row.try_get("endpoint_id").map_err(StoreError::Decode)?,
            created_at: row.try_get("created_at").map_err(StoreError::Decode)?,
            cpu_usage: row.try_get("cpu_usage").map_err(StoreError::Decode)?,
            mem_usage: row.try_get("mem_usage").map_err(StoreError::Decode)?,
            swap_usage: row.try_get("swap_usage").map_err(StoreError::Decode)?,
            huge_usage: row.try_get("huge_usage").map_err(StoreError::Decode)?,
            processes: row.try_get("processes").map_err(StoreError::Decode)?,
        })
    }

    fn parse_bucketed_row(row: &SqliteRow) -> Result<BucketedAverages, StoreError> {
        Ok(BucketedAverages {
            bucket: row.try_get("bucket").map_err(StoreError::Decode)?,
            cpu_usage: row.try_get("cpu_usage").map_err(StoreError::Decode)?,
            mem_usage: row.try_get("mem_usage").map_err(StoreError::Decode)?,
            swap_usage: row.try_get("swap_usage").map_err(StoreError::Decode)?,
            huge_usage: row.try_get("huge_usage").map_err(StoreError::Decode)?,
        })
    }

    fn parse_state_row(row: &SqliteRow) -> Result<EndpointState, StoreError> {
        Ok(EndpointState {
            endpoint_id: row.try_get("endpoint_id").map_err(StoreError::Decode)?,
            hostname: row.try_get("hostname").map_err(StoreError::Decode)?,
            uptime: row.try_get("uptime").map_err(StoreError::Decode)?,
            virtualization: row
                .try_get("virtualization")
                .map_err(StoreError::Decode)?,
            platform: row.try_get("platform").map_err(StoreError::Decode)?,
            cpu_cores: row.try_get("cpu_cores").map_err(StoreError::Decode)?,
            mem_total: row.try_get("mem_total").map_err(StoreError::Decode)?,
            swap_total: row.try_get("swap_total").map_err(StoreError::Decode)?,
            huge_total: row.try_get("huge_total").map_err(StoreError::Decode)?,
            updated_at: row.try_get("updated_at").map_err(StoreError::Decode)?,
        })
    }
}
