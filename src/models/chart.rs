// Chart accumulator: named series of (bucket, value) points.
// One Chart per request; built, exported, discarded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One chart point: bucket start (ms since epoch) and the raw or averaged
/// value for that bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: i64,
    pub y: f64,
}

/// Exported chart: series name to ascending point list. Sparse by design —
/// a bucket with no underlying data is absent, never zero. Consumers must
/// read absence as "no data", not "no load".
pub type ChartData = BTreeMap<String, Vec<ChartPoint>>;

/// Accumulates named series keyed by bucket timestamp for one chart request.
pub struct Chart {
    start: i64,
    end: Option<i64>,
    interval_ms: i64,
    series: BTreeMap<String, BTreeMap<i64, f64>>,
}

impl Chart {
    /// `end` of None means "up to now" (half-open range). The range and
    /// interval are carried for callers that need them; accumulation itself
    /// accepts whatever buckets the query produced.
    pub fn new(start: i64, end: Option<i64>, interval_ms: i64) -> Self {
        Self {
            start,
            end,
            interval_ms,
            series: BTreeMap::new(),
        }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> Option<i64> {
        self.end
    }

    pub fn interval_ms(&self) -> i64 {
        self.interval_ms
    }

    /// Inserts or overwrites the value at `bucket_ts` for `series`. Last
    /// write wins; queries are expected to yield one row per bucket already
    /// sorted ascending.
    pub fn add(&mut self, series: &str, bucket_ts: i64, value: f64) {
        self.series
            .entry(series.to_string())
            .or_default()
            .insert(bucket_ts, value);
    }

    /// Materializes all series as ascending (x, y) sequences. No gap
    /// filling: missing buckets stay missing.
    pub fn export(self) -> ChartData {
        self.series
            .into_iter()
            .map(|(name, points)| {
                let points = points
                    .into_iter()
                    .map(|(x, y)| ChartPoint { x, y })
                    .collect();
                (name, points)
            })
            .collect()
    }
}
