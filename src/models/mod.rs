// Domain models (ported from the Go endpoints service)

mod alert;
mod chart;
mod snapshot;

pub use alert::{Alert, AlertLevel, Resource, ResourceKind, check_alerts};
pub use chart::{Chart, ChartData, ChartPoint};
pub use snapshot::{EndpointState, SnapshotRecord, SystemSnapshot, normalize};
