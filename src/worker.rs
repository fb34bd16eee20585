// Maintenance worker: prune snapshots past retention on an interval.
// VACUUM runs on a configurable schedule (cron expression or fixed interval).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::snapshot_repo::SnapshotRepo;

/// Config for the maintenance worker.
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    pub prune_interval_secs: u64,
    /// Optional cron expression for VACUUM (e.g. "0 3 * * *" = 03:00 daily). Uses local time.
    pub vacuum_schedule: Option<String>,
    /// Run VACUUM every N seconds when vacuum_schedule is not set.
    pub vacuum_interval_secs: u64,
}

/// Spawns the maintenance worker. Returns a join handle.
pub fn spawn(
    repo: Arc<SnapshotRepo>,
    config: MaintenanceConfig,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(repo, config, shutdown_rx).await;
    })
}

#[instrument(skip(repo, shutdown_rx), fields(prune_interval_secs = config.prune_interval_secs))]
async fn run(
    repo: Arc<SnapshotRepo>,
    config: MaintenanceConfig,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) {
    let mut prune_tick = tokio::time::interval(Duration::from_secs(config.prune_interval_secs));
    prune_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let (vacuum_tx, mut vacuum_rx) = tokio::sync::mpsc::channel::<()>(1);
    tokio::spawn(vacuum_scheduler(config.clone(), vacuum_tx));

    loop {
        tokio::select! {
            _ = prune_tick.tick() => {
                match repo.prune_old_data().await {
                    Ok(pruned) if pruned > 0 => {
                        info!(pruned_rows = pruned, "pruned snapshots past retention");
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "prune failed"),
                }
            }
            _ = vacuum_rx.recv() => {
                if let Err(e) = repo.vacuum().await {
                    warn!(error = %e, "vacuum failed");
                } else {
                    info!("vacuum complete");
                }
            }
            _ = &mut shutdown_rx => {
                tracing::debug!("maintenance worker shutting down");
                break;
            }
        }
    }
}

/// Sends a message on `tx` at each VACUUM time (cron or fixed interval). Uses local time for cron.
async fn vacuum_scheduler(config: MaintenanceConfig, tx: tokio::sync::mpsc::Sender<()>) {
    if let Some(ref cron_str) = config.vacuum_schedule {
        let Ok(schedule) = cron::Schedule::from_str(cron_str) else {
            warn!(cron = %cron_str, "invalid vacuum_schedule; VACUUM will not run");
            return;
        };
        loop {
            let now = chrono::Local::now();
            let next = schedule.after(&now).next();
            if let Some(next) = next {
                let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
                tokio::time::sleep(delay).await;
                if tx.send(()).await.is_err() {
                    break;
                }
            } else {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
    } else {
        let interval = Duration::from_secs(config.vacuum_interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            if tx.send(()).await.is_err() {
                break;
            }
        }
    }
}
