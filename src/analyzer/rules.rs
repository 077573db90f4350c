//! Deterministic rule set. A pure function of the snapshot: no I/O, and process
//! age comes from the snapshot's own capture time.

use chrono::TimeDelta;

use super::Finding;
use crate::format::format_bytes;
use crate::system::snapshot::{CombinedSnapshot, ProcessStatus};

const PROCESS_CPU_HIGH: f64 = 80.0;
const PROCESS_CPU_MODERATE: f64 = 50.0;
const SYSTEM_CPU_CRITICAL: f64 = 90.0;
const SYSTEM_CPU_HIGH: f64 = 75.0;
const PROCESS_MEMORY_HIGH: f64 = 10.0;
const VIRTUAL_TO_RESIDENT_RATIO: u64 = 3;
const SYSTEM_MEMORY_CRITICAL: f64 = 90.0;
const SYSTEM_MEMORY_HIGH: f64 = 80.0;
const RECENT_START_SECS: i64 = 60;
const OPEN_FILES_MAX: u64 = 1000;
const CONNECTIONS_MAX: u64 = 100;
const CHILDREN_MAX: u64 = 50;
const SMALL_HOST_CORES: usize = 2;
const SMALL_HOST_CPU: f64 = 60.0;
const FREE_MEMORY_MIN: f64 = 10.0;

/// Evaluate every rule group in priority order: CPU, memory, process
/// behaviour, host health. All matching rules fire.
pub fn evaluate(snapshot: &CombinedSnapshot) -> Vec<Finding> {
    let mut findings = Vec::new();
    cpu_rules(snapshot, &mut findings);
    memory_rules(snapshot, &mut findings);
    process_rules(snapshot, &mut findings);
    system_rules(snapshot, &mut findings);
    findings
}

fn cpu_rules(snapshot: &CombinedSnapshot, findings: &mut Vec<Finding>) {
    let process_cpu = snapshot.process.cpu_percent;
    if process_cpu > PROCESS_CPU_HIGH {
        findings.push(Finding::warning(format!(
            "High CPU usage detected: Process consuming {process_cpu:.2}% CPU - investigate for performance bottlenecks"
        )));
    } else if process_cpu > PROCESS_CPU_MODERATE {
        findings.push(Finding::warning(format!(
            "Moderate CPU usage: Process using {process_cpu:.2}% CPU - monitor for sustained high usage"
        )));
    }

    let system_cpu = snapshot.system.cpu_percent;
    if system_cpu > SYSTEM_CPU_CRITICAL {
        findings.push(Finding::warning(format!(
            "Critical system CPU load: {system_cpu:.2}% usage - immediate attention required"
        )));
    } else if system_cpu > SYSTEM_CPU_HIGH {
        findings.push(Finding::warning(format!(
            "High system CPU load: {system_cpu:.2}% usage - consider load balancing"
        )));
    }
}

fn memory_rules(snapshot: &CombinedSnapshot, findings: &mut Vec<Finding>) {
    let process = &snapshot.process;
    if process.memory_percent > PROCESS_MEMORY_HIGH {
        findings.push(Finding::warning(format!(
            "High memory usage: Process using {:.2}% of system memory ({} RSS)",
            process.memory_percent,
            format_bytes(process.memory_rss)
        )));
    }

    if process.memory_vms > process.memory_rss.saturating_mul(VIRTUAL_TO_RESIDENT_RATIO) {
        findings.push(Finding::warning(format!(
            "Potential memory leak: Virtual memory ({}) significantly exceeds RSS ({})",
            format_bytes(process.memory_vms),
            format_bytes(process.memory_rss)
        )));
    }

    let system_memory = snapshot.system.memory_percent;
    if system_memory > SYSTEM_MEMORY_CRITICAL {
        findings.push(Finding::warning(format!(
            "Critical memory pressure: System at {system_memory:.2}% - risk of OOM kills"
        )));
    } else if system_memory > SYSTEM_MEMORY_HIGH {
        findings.push(Finding::warning(format!(
            "High memory usage: System at {system_memory:.2}% - consider memory optimization"
        )));
    }
}

fn process_rules(snapshot: &CombinedSnapshot, findings: &mut Vec<Finding>) {
    let process = &snapshot.process;
    if snapshot.process_age() < TimeDelta::seconds(RECENT_START_SECS) {
        findings.push(Finding::warning(
            "Recently started process - monitor for stability during initialization",
        ));
    }

    match process.status {
        ProcessStatus::Zombie => findings.push(Finding::warning(
            "Zombie process detected - parent should reap this process",
        )),
        ProcessStatus::Stopped => findings.push(Finding::warning(
            "Process is currently stopped - may need manual intervention",
        )),
        _ => {}
    }

    if process.open_files > OPEN_FILES_MAX {
        findings.push(Finding::warning(format!(
            "High file descriptor usage: {} open files - check for file descriptor leaks",
            process.open_files
        )));
    }

    if process.connections > CONNECTIONS_MAX {
        findings.push(Finding::warning(format!(
            "High network connections: {} active connections - monitor for connection leaks",
            process.connections
        )));
    }

    if process.children > CHILDREN_MAX {
        findings.push(Finding::warning(format!(
            "Many child processes: {} children - ensure proper process management",
            process.children
        )));
    }
}

fn system_rules(snapshot: &CombinedSnapshot, findings: &mut Vec<Finding>) {
    let system = &snapshot.system;
    if system.cpu_cores <= SMALL_HOST_CORES && system.cpu_percent > SMALL_HOST_CPU {
        findings.push(Finding::warning(format!(
            "Limited CPU resources: Only {} cores with {:.2}% usage - consider scaling up",
            system.cpu_cores, system.cpu_percent
        )));
    }

    if let Some(free_percent) = system.free_memory_percent()
        && free_percent < FREE_MEMORY_MIN
    {
        findings.push(Finding::warning(format!(
            "Low free memory: Only {free_percent:.1}% free ({}) - system may become unstable",
            format_bytes(system.memory_free)
        )));
    }
}
