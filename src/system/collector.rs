use std::time::Duration;

use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, System};

use super::platform;
use super::snapshot::ProcessStatus;
use super::source::{
    CpuInfo, HostMemory, MemoryUsage, MetricsSource, Probe, ProbeError, SocketEntry,
};

/// [`MetricsSource`] backed by `sysinfo`, with the platform layer filling in
/// sockets and descriptors.
pub struct Collector {
    sys: System,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        Collector { sys }
    }

    fn process(&self, pid: u32) -> Probe<&Process> {
        self.sys
            .process(Pid::from_u32(pid))
            .ok_or(ProbeError::ProcessGone(pid))
    }

    fn refresh_process(&mut self, pid: u32, kind: ProcessRefreshKind) {
        let pids = [Pid::from_u32(pid)];
        self.sys
            .refresh_processes_specifics(ProcessesToUpdate::Some(&pids), true, kind);
    }
}

impl MetricsSource for Collector {
    fn process_exists(&mut self, pid: u32) -> bool {
        let _span = tracing::debug_span!("collector.process_exists", pid).entered();
        self.refresh_process(pid, ProcessRefreshKind::everything());
        self.sys.process(Pid::from_u32(pid)).is_some()
    }

    fn process_name(&mut self, pid: u32) -> Probe<String> {
        Ok(self.process(pid)?.name().to_string_lossy().into_owned())
    }

    fn executable(&mut self, pid: u32) -> Probe<String> {
        self.process(pid)?
            .exe()
            .map(|path| path.display().to_string())
            .ok_or_else(|| ProbeError::Unavailable("executable path not reported".into()))
    }

    fn command_line(&mut self, pid: u32) -> Probe<String> {
        Ok(self
            .process(pid)?
            .cmd()
            .iter()
            .map(|s| s.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn working_dir(&mut self, pid: u32) -> Probe<String> {
        self.process(pid)?
            .cwd()
            .map(|path| path.display().to_string())
            .ok_or_else(|| ProbeError::Unavailable("working directory not reported".into()))
    }

    fn status(&mut self, pid: u32) -> Probe<ProcessStatus> {
        Ok(map_status(self.process(pid)?.status()))
    }

    fn cpu_percent(&mut self, pid: u32) -> Probe<f64> {
        let _span = tracing::debug_span!("collector.cpu_percent", pid).entered();
        // sysinfo reports a rate between two refreshes; the first came from process_exists.
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        self.refresh_process(pid, ProcessRefreshKind::nothing().with_cpu());
        Ok(f64::from(self.process(pid)?.cpu_usage()).max(0.0))
    }

    fn memory(&mut self, pid: u32) -> Probe<MemoryUsage> {
        let process = self.process(pid)?;
        Ok(MemoryUsage {
            resident: process.memory(),
            virtual_: process.virtual_memory(),
        })
    }

    fn memory_percent(&mut self, pid: u32) -> Probe<f64> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(ProbeError::Unavailable("host memory total not reported".into()));
        }
        let resident = self.process(pid)?.memory();
        Ok(resident as f64 / total as f64 * 100.0)
    }

    fn start_time(&mut self, pid: u32) -> Probe<u64> {
        match self.process(pid)?.start_time() {
            0 => Err(ProbeError::Unavailable("start time not reported".into())),
            secs => Ok(secs),
        }
    }

    fn connection_count(&mut self, pid: u32) -> Probe<u64> {
        platform::connection_count(pid)
    }

    fn open_file_count(&mut self, pid: u32) -> Probe<u64> {
        platform::open_file_count(pid)
    }

    fn child_count(&mut self, pid: u32) -> Probe<u64> {
        let _span = tracing::debug_span!("collector.child_count", pid).entered();
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );
        let parent = Pid::from_u32(pid);
        let count = self
            .sys
            .processes()
            .values()
            .filter(|process| {
                // Linux reports tasks as processes parented to their owner.
                process.parent() == Some(parent) && process.thread_kind().is_none()
            })
            .count();
        Ok(count as u64)
    }

    fn cpu_info(&mut self) -> Probe<CpuInfo> {
        self.sys.refresh_cpu_all();
        let cpus = self.sys.cpus();
        let Some(first) = cpus.first() else {
            return Err(ProbeError::Unavailable("no CPUs reported".into()));
        };
        Ok(CpuInfo {
            cores: cpus.len(),
            model: first.brand().trim().to_string(),
        })
    }

    fn system_cpu_percent(&mut self, window: Duration) -> Probe<f64> {
        let _span = tracing::debug_span!("collector.system_cpu_percent").entered();
        self.sys.refresh_cpu_usage();
        std::thread::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        self.sys.refresh_cpu_usage();
        if self.sys.cpus().is_empty() {
            return Err(ProbeError::Unavailable("no CPUs reported".into()));
        }
        Ok(f64::from(self.sys.global_cpu_usage()).clamp(0.0, 100.0))
    }

    fn host_memory(&mut self) -> Probe<HostMemory> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(ProbeError::Unavailable("host memory total not reported".into()));
        }
        Ok(HostMemory {
            total,
            used: self.sys.used_memory(),
            free: self.sys.free_memory(),
        })
    }

    fn socket_table(&mut self) -> Probe<Vec<SocketEntry>> {
        let _span = tracing::debug_span!("collector.socket_table").entered();
        platform::socket_table()
    }
}

fn map_status(status: sysinfo::ProcessStatus) -> ProcessStatus {
    use sysinfo::ProcessStatus as Os;
    match status {
        Os::Run => ProcessStatus::Running,
        Os::Sleep | Os::Idle | Os::UninterruptibleDiskSleep => ProcessStatus::Sleeping,
        Os::Stop | Os::Tracing => ProcessStatus::Stopped,
        Os::Zombie => ProcessStatus::Zombie,
        _ => ProcessStatus::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_process_is_visible() {
        let mut collector = Collector::new();
        let pid = std::process::id();
        assert!(collector.process_exists(pid));
        assert!(!collector.process_name(pid).unwrap().is_empty());
    }

    #[test]
    fn missing_process_reports_gone() {
        let mut collector = Collector::new();
        assert!(!collector.process_exists(u32::MAX));
        assert!(matches!(
            collector.process_name(u32::MAX),
            Err(ProbeError::ProcessGone(_))
        ));
    }

    #[test]
    fn threads_are_not_counted_as_children() {
        let mut collector = Collector::new();
        let pid = std::process::id();
        let before = collector.child_count(pid).unwrap();

        let (release, wait) = std::sync::mpsc::channel::<()>();
        let wait = std::sync::Arc::new(std::sync::Mutex::new(wait));
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let wait = std::sync::Arc::clone(&wait);
                std::thread::spawn(move || {
                    let _ = wait.lock().unwrap().recv_timeout(Duration::from_secs(5));
                })
            })
            .collect();
        std::thread::sleep(Duration::from_millis(50));

        let during = collector.child_count(pid).unwrap();
        drop(release);
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(during, before);
    }

    #[test]
    fn status_mapping_collapses_os_states() {
        assert_eq!(map_status(sysinfo::ProcessStatus::Run), ProcessStatus::Running);
        assert_eq!(map_status(sysinfo::ProcessStatus::Idle), ProcessStatus::Sleeping);
        assert_eq!(map_status(sysinfo::ProcessStatus::Tracing), ProcessStatus::Stopped);
        assert_eq!(map_status(sysinfo::ProcessStatus::Zombie), ProcessStatus::Zombie);
        assert_eq!(map_status(sysinfo::ProcessStatus::Dead), ProcessStatus::Unknown);
    }
}
