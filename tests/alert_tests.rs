// Threshold evaluator tests. These pin two deliberate departures from the
// Go service: every violated threshold is reported (not just the last one
// evaluated), and the hugepages rule compares the hugepages metric rather
// than swap.

mod common;

use std::time::Duration;

use common::snapshot;
use hostpulse::models::{AlertLevel, Resource, ResourceKind, check_alerts};

fn resource(kind: ResourceKind, value: f64, level: AlertLevel) -> Resource {
    Resource {
        resource: kind,
        value,
        level,
    }
}

#[test]
fn memory_over_threshold_produces_one_alert() {
    let snap = snapshot(60_000, 0.0, 95.0, 0.0, 0.0);
    let resources = vec![resource(ResourceKind::SystemHighMemory, 90.0, AlertLevel::High)];
    let alerts = check_alerts(&snap, &resources);

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].resource, ResourceKind::SystemHighMemory);
    assert_eq!(alerts[0].level, AlertLevel::High);
    assert!(alerts[0].message.contains("95.00%"), "{}", alerts[0].message);
    assert_eq!(alerts[0].frequency, Duration::from_secs(300));
}

#[test]
fn memory_below_threshold_produces_none() {
    let snap = snapshot(60_000, 0.0, 85.0, 0.0, 0.0);
    let resources = vec![resource(ResourceKind::SystemHighMemory, 90.0, AlertLevel::High)];
    assert!(check_alerts(&snap, &resources).is_empty());
}

#[test]
fn comparison_is_strictly_greater() {
    let snap = snapshot(60_000, 0.0, 90.0, 0.0, 0.0);
    let resources = vec![resource(ResourceKind::SystemHighMemory, 90.0, AlertLevel::Low)];
    assert!(check_alerts(&snap, &resources).is_empty());
}

#[test]
fn swap_over_threshold_produces_alert() {
    let snap = snapshot(60_000, 0.0, 0.0, 77.5, 0.0);
    let resources = vec![resource(ResourceKind::SystemHighSwap, 50.0, AlertLevel::Medium)];
    let alerts = check_alerts(&snap, &resources);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].resource, ResourceKind::SystemHighSwap);
    assert!(alerts[0].message.contains("77.50%"));
}

#[test]
fn hugepages_rule_compares_hugepages_not_swap() {
    // swap is over the threshold, hugepages is not: no alert.
    let snap = snapshot(60_000, 0.0, 0.0, 99.0, 10.0);
    let resources = vec![resource(
        ResourceKind::SystemHighHugePages,
        50.0,
        AlertLevel::High,
    )];
    assert!(check_alerts(&snap, &resources).is_empty());

    // hugepages over the threshold fires, and embeds the hugepages value.
    let snap = snapshot(60_000, 0.0, 0.0, 0.0, 81.0);
    let alerts = check_alerts(&snap, &resources);
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].message.contains("81.00%"));
}

#[test]
fn simultaneous_violations_are_all_reported() {
    let snap = snapshot(60_000, 0.0, 95.0, 80.0, 0.0);
    let resources = vec![
        resource(ResourceKind::SystemHighMemory, 90.0, AlertLevel::High),
        resource(ResourceKind::SystemHighSwap, 50.0, AlertLevel::Medium),
    ];
    let alerts = check_alerts(&snap, &resources);
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].resource, ResourceKind::SystemHighMemory);
    assert_eq!(alerts[1].resource, ResourceKind::SystemHighSwap);
}

#[test]
fn empty_resource_list_produces_none() {
    let snap = snapshot(60_000, 99.0, 99.0, 99.0, 99.0);
    assert!(check_alerts(&snap, &[]).is_empty());
}

#[test]
fn evaluation_is_pure() {
    let snap = snapshot(60_000, 0.0, 95.0, 80.0, 0.0);
    let resources = vec![
        resource(ResourceKind::SystemHighMemory, 90.0, AlertLevel::High),
        resource(ResourceKind::SystemHighSwap, 50.0, AlertLevel::Medium),
    ];
    let first = check_alerts(&snap, &resources);
    let second = check_alerts(&snap, &resources);
    assert_eq!(first, second);
}
