#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use inspektor::system::snapshot::{CombinedSnapshot, ProcessSnapshot, ProcessStatus, SystemSnapshot};
use inspektor::system::source::{
    CpuInfo, HostMemory, MemoryUsage, MetricsSource, Probe, ProbeError, Protocol, SocketEntry,
    SocketState,
};

pub const MB: u64 = 1024 * 1024;
pub const GB: u64 = 1024 * MB;

/// Which reads a [`FakeSource`] should refuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Read {
    Name,
    Executable,
    CommandLine,
    WorkingDir,
    Status,
    Cpu,
    Memory,
    MemoryPercent,
    StartTime,
    Connections,
    OpenFiles,
    Children,
    CpuInfo,
    SystemCpu,
    HostMemory,
    SocketTable,
}

/// In-memory [`MetricsSource`] with one well-behaved process per pid.
#[derive(Debug, Default)]
pub struct FakeSource {
    pub live: HashSet<u32>,
    pub sockets: Vec<SocketEntry>,
    pub denied: HashSet<Read>,
    pub host_total: u64,
    pub existence_checks: Vec<u32>,
    pub cpu_windows: Vec<Duration>,
    pub start_times: HashMap<u32, u64>,
}

impl FakeSource {
    pub fn new() -> Self {
        FakeSource {
            host_total: 16 * GB,
            ..Default::default()
        }
    }

    pub fn with_process(mut self, pid: u32) -> Self {
        self.live.insert(pid);
        self
    }

    pub fn with_listener(mut self, protocol: Protocol, port: u16, pid: u32) -> Self {
        self.sockets.push(SocketEntry {
            protocol,
            local_port: port,
            state: SocketState::Listen,
            pid,
        });
        self
    }

    pub fn with_socket(mut self, port: u16, state: SocketState, pid: u32) -> Self {
        self.sockets.push(SocketEntry {
            protocol: Protocol::Tcp,
            local_port: port,
            state,
            pid,
        });
        self
    }

    pub fn deny(mut self, read: Read) -> Self {
        self.denied.insert(read);
        self
    }

    fn check(&self, read: Read) -> Probe<()> {
        if self.denied.contains(&read) {
            Err(ProbeError::PermissionDenied)
        } else {
            Ok(())
        }
    }

    fn live(&self, pid: u32, read: Read) -> Probe<()> {
        if !self.live.contains(&pid) {
            return Err(ProbeError::ProcessGone(pid));
        }
        self.check(read)
    }
}

impl MetricsSource for FakeSource {
    fn process_exists(&mut self, pid: u32) -> bool {
        self.existence_checks.push(pid);
        self.live.contains(&pid)
    }

    fn process_name(&mut self, pid: u32) -> Probe<String> {
        self.live(pid, Read::Name)?;
        Ok(format!("proc-{pid}"))
    }

    fn executable(&mut self, pid: u32) -> Probe<String> {
        self.live(pid, Read::Executable)?;
        Ok(format!("/usr/bin/proc-{pid}"))
    }

    fn command_line(&mut self, pid: u32) -> Probe<String> {
        self.live(pid, Read::CommandLine)?;
        Ok(format!("proc-{pid} --serve"))
    }

    fn working_dir(&mut self, pid: u32) -> Probe<String> {
        self.live(pid, Read::WorkingDir)?;
        Ok("/srv".to_string())
    }

    fn status(&mut self, pid: u32) -> Probe<ProcessStatus> {
        self.live(pid, Read::Status)?;
        Ok(ProcessStatus::Sleeping)
    }

    fn cpu_percent(&mut self, pid: u32) -> Probe<f64> {
        self.live(pid, Read::Cpu)?;
        Ok(12.5)
    }

    fn memory(&mut self, pid: u32) -> Probe<MemoryUsage> {
        self.live(pid, Read::Memory)?;
        Ok(MemoryUsage {
            resident: 256 * MB,
            virtual_: 512 * MB,
        })
    }

    fn memory_percent(&mut self, pid: u32) -> Probe<f64> {
        self.live(pid, Read::MemoryPercent)?;
        Ok(256.0 * MB as f64 / self.host_total as f64 * 100.0)
    }

    fn start_time(&mut self, pid: u32) -> Probe<u64> {
        self.live(pid, Read::StartTime)?;
        Ok(self.start_times.get(&pid).copied().unwrap_or(1_600_000_000))
    }

    fn connection_count(&mut self, pid: u32) -> Probe<u64> {
        self.live(pid, Read::Connections)?;
        Ok(3)
    }

    fn open_file_count(&mut self, pid: u32) -> Probe<u64> {
        self.live(pid, Read::OpenFiles)?;
        Ok(24)
    }

    fn child_count(&mut self, pid: u32) -> Probe<u64> {
        self.live(pid, Read::Children)?;
        Ok(2)
    }

    fn cpu_info(&mut self) -> Probe<CpuInfo> {
        self.check(Read::CpuInfo)?;
        Ok(CpuInfo {
            cores: 8,
            model: "Fake CPU @ 3.00GHz".to_string(),
        })
    }

    fn system_cpu_percent(&mut self, window: Duration) -> Probe<f64> {
        self.check(Read::SystemCpu)?;
        self.cpu_windows.push(window);
        Ok(20.0)
    }

    fn host_memory(&mut self) -> Probe<HostMemory> {
        self.check(Read::HostMemory)?;
        Ok(HostMemory {
            total: self.host_total,
            used: self.host_total / 4,
            free: self.host_total / 2,
        })
    }

    fn socket_table(&mut self) -> Probe<Vec<SocketEntry>> {
        self.check(Read::SocketTable)?;
        Ok(self.sockets.clone())
    }
}

/// A snapshot no rule fires on, captured at a fixed instant.
pub fn quiet_snapshot() -> CombinedSnapshot {
    let captured_at = fixed_instant();
    let mut process = ProcessSnapshot::empty(4242);
    process.name = "api-server".into();
    process.executable = "/usr/local/bin/api-server".into();
    process.command_line = "api-server --port 8080".into();
    process.working_dir = "/srv/api".into();
    process.status = ProcessStatus::Running;
    process.cpu_percent = 3.2;
    process.memory_rss = 128 * MB;
    process.memory_vms = 300 * MB;
    process.memory_percent = 0.8;
    process.started_at = captured_at - TimeDelta::hours(6);
    process.open_files = 40;
    process.connections = 12;
    process.children = 1;
    CombinedSnapshot {
        process,
        system: SystemSnapshot {
            cpu_cores: 8,
            cpu_model: "Fake CPU @ 3.00GHz".into(),
            cpu_percent: 18.0,
            memory_total: 16 * GB,
            memory_used: 6 * GB,
            memory_percent: 37.5,
            memory_free: 8 * GB,
        },
        captured_at,
    }
}

pub fn fixed_instant() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}
