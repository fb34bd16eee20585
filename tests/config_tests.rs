// Config parsing and validation tests

use hostpulse::config::AppConfig;
use hostpulse::models::{AlertLevel, ResourceKind};

const FULL_CONFIG: &str = r#"
[server]
port = 8080
host = "0.0.0.0"

[database]
path = "data/metrics.db"
retention_days = 14

[maintenance]
prune_interval_secs = 600
vacuum_schedule = "0 3 * * * *"
vacuum_interval_secs = 86400

[[alerts]]
resource = "system_high_memory"
value = 90.0
level = "high"

[[alerts]]
resource = "system_high_swap"
value = 50.0
level = "medium"

[[alerts]]
resource = "system_high_huge_pages"
value = 75.0
level = "low"
"#;

#[test]
fn load_full_config() {
    let config = AppConfig::load_from_str(FULL_CONFIG).unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.database.retention_days, 14);
    assert_eq!(
        config.maintenance.vacuum_schedule.as_deref(),
        Some("0 3 * * * *")
    );
    assert_eq!(config.alerts.len(), 3);
    assert_eq!(config.alerts[0].resource, ResourceKind::SystemHighMemory);
    assert_eq!(config.alerts[0].value, 90.0);
    assert_eq!(config.alerts[1].level, AlertLevel::Medium);
    assert_eq!(config.alerts[2].resource, ResourceKind::SystemHighHugePages);
}

#[test]
fn alerts_and_vacuum_schedule_are_optional() {
    let config = AppConfig::load_from_str(
        r#"
        [server]
        port = 8080
        host = "127.0.0.1"

        [database]
        path = "data/metrics.db"

        [maintenance]
        prune_interval_secs = 600
        vacuum_interval_secs = 86400
        "#,
    )
    .unwrap();
    assert!(config.alerts.is_empty());
    assert!(config.maintenance.vacuum_schedule.is_none());
    // retention default
    assert_eq!(config.database.retention_days, 30);
}

#[test]
fn empty_database_path_rejected() {
    let err = AppConfig::load_from_str(
        r#"
        [server]
        port = 8080
        host = "127.0.0.1"

        [database]
        path = ""

        [maintenance]
        prune_interval_secs = 600
        vacuum_interval_secs = 86400
        "#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("database.path"));
}

#[test]
fn zero_prune_interval_rejected() {
    let err = AppConfig::load_from_str(
        r#"
        [server]
        port = 8080
        host = "127.0.0.1"

        [database]
        path = "data/metrics.db"

        [maintenance]
        prune_interval_secs = 0
        vacuum_interval_secs = 86400
        "#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("prune_interval_secs"));
}

#[test]
fn unknown_alert_resource_rejected() {
    AppConfig::load_from_str(
        r#"
        [server]
        port = 8080
        host = "127.0.0.1"

        [database]
        path = "data/metrics.db"

        [maintenance]
        prune_interval_secs = 600
        vacuum_interval_secs = 86400

        [[alerts]]
        resource = "system_high_disk"
        value = 90.0
        level = "high"
        "#,
    )
    .unwrap_err();
}

#[test]
fn non_finite_alert_value_rejected() {
    let err = AppConfig::load_from_str(
        r#"
        [server]
        port = 8080
        host = "127.0.0.1"

        [database]
        path = "data/metrics.db"

        [maintenance]
        prune_interval_secs = 600
        vacuum_interval_secs = 86400

        [[alerts]]
        resource = "system_high_memory"
        value = -5.0
        level = "high"
        "#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("alerts[0].value"));
}
