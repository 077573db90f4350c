use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::snapshot::{
    Attribute, CombinedSnapshot, ProcessSnapshot, ProcessStatus, SystemSnapshot,
};
use super::source::{MemoryUsage, MetricsSource, Probe, ProbeError};
use crate::error::{CollectionError, InspectError};

/// Window over which host CPU utilisation is averaged.
pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Every process read, kept as value-or-reason until the snapshot is assembled.
struct ProcessReadings {
    pid: u32,
    name: Probe<String>,
    executable: Probe<String>,
    command_line: Probe<String>,
    working_dir: Probe<String>,
    status: Probe<ProcessStatus>,
    cpu_percent: Probe<f64>,
    memory: Probe<MemoryUsage>,
    memory_percent: Probe<f64>,
    start_time: Probe<u64>,
    connections: Probe<u64>,
    open_files: Probe<u64>,
    children: Probe<u64>,
}

impl ProcessReadings {
    fn read<S: MetricsSource>(source: &mut S, pid: u32) -> Self {
        // CPU first: the existence check just took its first sample.
        let cpu_percent = source.cpu_percent(pid);
        ProcessReadings {
            pid,
            name: source.process_name(pid),
            executable: source.executable(pid),
            command_line: source.command_line(pid),
            working_dir: source.working_dir(pid),
            status: source.status(pid),
            cpu_percent,
            memory: source.memory(pid),
            memory_percent: source.memory_percent(pid),
            start_time: source.start_time(pid),
            connections: source.connection_count(pid),
            open_files: source.open_file_count(pid),
            children: source.child_count(pid),
        }
    }

    fn into_snapshot(self) -> ProcessSnapshot {
        let mut fields = Settled {
            pid: self.pid,
            unavailable: Vec::new(),
        };
        let name = fields.take(Attribute::Name, self.name);
        let executable = fields.take(Attribute::Executable, self.executable);
        let command_line = fields.take(Attribute::CommandLine, self.command_line);
        let working_dir = fields.take(Attribute::WorkingDir, self.working_dir);
        let status = fields.take(Attribute::Status, self.status);
        let cpu_percent = fields.take(Attribute::CpuPercent, self.cpu_percent);
        let memory = fields.take(Attribute::Memory, self.memory);
        let memory_percent = fields.take(Attribute::MemoryPercent, self.memory_percent);
        let started_at = fields.take(Attribute::StartTime, self.start_time.and_then(unix_time));
        let connections = fields.take(Attribute::Connections, self.connections);
        let open_files = fields.take(Attribute::OpenFiles, self.open_files);
        let children = fields.take(Attribute::Children, self.children);

        ProcessSnapshot {
            pid: self.pid,
            name,
            executable,
            command_line,
            working_dir,
            status,
            cpu_percent,
            memory_rss: memory.resident,
            memory_vms: memory.virtual_,
            memory_percent,
            started_at,
            connections,
            open_files,
            children,
            unavailable: fields.unavailable,
        }
    }
}

/// Collapses probes to zero values, remembering which ones failed.
struct Settled {
    pid: u32,
    unavailable: Vec<Attribute>,
}

impl Settled {
    fn take<T: Default>(&mut self, attribute: Attribute, probe: Probe<T>) -> T {
        match probe {
            Ok(value) => value,
            Err(err) => {
                debug!(pid = self.pid, attribute = attribute.label(), %err, "attribute unavailable");
                self.unavailable.push(attribute);
                T::default()
            }
        }
    }
}

fn unix_time(secs: u64) -> Probe<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| ProbeError::Unavailable(format!("start time {secs} out of range")))
}

/// Capture one process. Only the initial existence lookup is fatal.
pub fn build_process<S: MetricsSource>(
    source: &mut S,
    pid: u32,
) -> Result<ProcessSnapshot, InspectError> {
    let _span = tracing::debug_span!("builder.build_process", pid).entered();
    if !source.process_exists(pid) {
        return Err(InspectError::ProcessNotFound(pid));
    }
    Ok(ProcessReadings::read(source, pid).into_snapshot())
}

/// Capture host-wide CPU and memory. Any failure here is fatal.
pub fn build_system<S: MetricsSource>(
    source: &mut S,
    cpu_window: Duration,
) -> Result<SystemSnapshot, CollectionError> {
    let _span = tracing::debug_span!("builder.build_system").entered();
    let cpu = source
        .cpu_info()
        .map_err(|err| CollectionError::new("CPU info", err))?;
    let cpu_percent = source
        .system_cpu_percent(cpu_window)
        .map_err(|err| CollectionError::new("CPU usage", err))?;
    let memory = source
        .host_memory()
        .map_err(|err| CollectionError::new("memory stats", err))?;
    if memory.total == 0 {
        return Err(CollectionError::new(
            "memory stats",
            ProbeError::Unavailable("host memory total is zero".into()),
        ));
    }

    Ok(SystemSnapshot {
        cpu_cores: cpu.cores,
        cpu_model: cpu.model,
        cpu_percent,
        memory_total: memory.total,
        memory_used: memory.used,
        memory_percent: memory.used as f64 / memory.total as f64 * 100.0,
        memory_free: memory.free,
    })
}

/// Process first, then host, so the two reads sit as close together as the
/// CPU sampling allows.
pub fn build_combined<S: MetricsSource>(
    source: &mut S,
    pid: u32,
    cpu_window: Duration,
) -> Result<CombinedSnapshot, InspectError> {
    let process = build_process(source, pid)?;
    let system = build_system(source, cpu_window)?;
    Ok(CombinedSnapshot::new(process, system))
}
