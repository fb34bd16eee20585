// Shared test helpers

use hostpulse::models::SystemSnapshot;

pub fn snapshot(timestamp: i64, cpu: f64, mem: f64, swap: f64, huge: f64) -> SystemSnapshot {
    SystemSnapshot {
        timestamp,
        hostname: "node1".into(),
        uptime: 3600,
        virtualization: "kvm".into(),
        platform: "linux".into(),
        cpu_cores: 4,
        mem_total: 16384,
        swap_total: 4096,
        huge_total: 0,
        processes: 120,
        cpu_usage: cpu,
        mem_usage: mem,
        swap_usage: swap,
        huge_usage: huge,
    }
}
