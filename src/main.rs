use anyhow::Result;
use hostpulse::*;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let repo = Arc::new(
        snapshot_repo::SnapshotRepo::connect(
            &app_config.database.path,
            app_config.database.retention_days,
        )
        .await?,
    );
    repo.init().await?;

    // Delivery collaborator boundary: this service only evaluates thresholds
    // and hands finished alerts over. The receiver here stands in for the
    // notification transport and just logs.
    let (alert_tx, mut alert_rx) = mpsc::channel::<models::Alert>(64);
    tokio::spawn(async move {
        while let Some(alert) = alert_rx.recv().await {
            tracing::info!(
                resource = ?alert.resource,
                level = ?alert.level,
                frequency_secs = alert.frequency.as_secs(),
                "{}", alert.message
            );
        }
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let worker_handle = worker::spawn(
        repo.clone(),
        worker::MaintenanceConfig {
            prune_interval_secs: app_config.maintenance.prune_interval_secs,
            vacuum_schedule: app_config.maintenance.vacuum_schedule.clone(),
            vacuum_interval_secs: app_config.maintenance.vacuum_interval_secs,
        },
        shutdown_rx,
    );

    let resources = Arc::new(app_config.alerts.clone());
    let app = routes::app(repo, resources, alert_tx);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let in_container = std::path::Path::new("/.dockerenv").exists()
        || std::env::var("CONTAINER").as_deref() == Ok("1");

    if in_container {
        // In Docker: run server until error or SIGTERM (no signal handler; avoids immediate exit)
        axum::serve(listener, app).await?;
    } else {
        tokio::select! {
            result = axum::serve(listener, app) => {
                result?;
            }
            _ = async {
                #[cfg(unix)]
                {
                    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                        Ok(s) => s,
                        Err(_) => {
                            let _ = tokio::signal::ctrl_c().await;
                            return;
                        }
                    };
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                }
                #[cfg(not(unix))]
                {
                    tokio::signal::ctrl_c().await
                }
            } => {
                tracing::info!("Received shutdown signal");
                let _ = shutdown_tx.send(());
                let _ = worker_handle.await;
            }
        }
    }

    Ok(())
}
