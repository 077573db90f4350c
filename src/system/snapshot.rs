use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Running,
    Sleeping,
    Zombie,
    Stopped,
    #[default]
    Unknown,
}

impl ProcessStatus {
    pub fn label(self) -> &'static str {
        match self {
            ProcessStatus::Running => "Running",
            ProcessStatus::Sleeping => "Sleeping",
            ProcessStatus::Zombie => "Zombie",
            ProcessStatus::Stopped => "Stopped",
            ProcessStatus::Unknown => "Unknown",
        }
    }
}

/// Process attributes that are read independently and may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Name,
    Executable,
    CommandLine,
    WorkingDir,
    Status,
    CpuPercent,
    Memory,
    MemoryPercent,
    StartTime,
    Connections,
    OpenFiles,
    Children,
}

impl Attribute {
    pub fn label(self) -> &'static str {
        match self {
            Attribute::Name => "name",
            Attribute::Executable => "executable",
            Attribute::CommandLine => "command line",
            Attribute::WorkingDir => "working directory",
            Attribute::Status => "status",
            Attribute::CpuPercent => "cpu percent",
            Attribute::Memory => "memory",
            Attribute::MemoryPercent => "memory percent",
            Attribute::StartTime => "start time",
            Attribute::Connections => "connections",
            Attribute::OpenFiles => "open files",
            Attribute::Children => "children",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub name: String,
    pub executable: String,
    pub command_line: String,
    pub working_dir: String,
    pub status: ProcessStatus,
    pub cpu_percent: f64,
    pub memory_rss: u64,
    pub memory_vms: u64,
    pub memory_percent: f64,
    #[serde(rename = "create_time")]
    pub started_at: DateTime<Utc>,
    pub connections: u64,
    pub open_files: u64,
    pub children: u64,
    /// Attributes the OS refused or could not report; their fields hold zero values.
    #[serde(skip)]
    pub unavailable: Vec<Attribute>,
}

impl ProcessSnapshot {
    /// An all-zero snapshot for `pid`, the shape a fully unreadable process collapses to.
    pub fn empty(pid: u32) -> Self {
        ProcessSnapshot {
            pid,
            name: String::new(),
            executable: String::new(),
            command_line: String::new(),
            working_dir: String::new(),
            status: ProcessStatus::Unknown,
            cpu_percent: 0.0,
            memory_rss: 0,
            memory_vms: 0,
            memory_percent: 0.0,
            started_at: DateTime::<Utc>::UNIX_EPOCH,
            connections: 0,
            open_files: 0,
            children: 0,
            unavailable: Vec::new(),
        }
    }

    pub fn is_available(&self, attribute: Attribute) -> bool {
        !self.unavailable.contains(&attribute)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub cpu_cores: usize,
    pub cpu_model: String,
    #[serde(rename = "cpu_usage")]
    pub cpu_percent: f64,
    pub memory_total: u64,
    pub memory_used: u64,
    pub memory_percent: f64,
    pub memory_free: u64,
}

impl SystemSnapshot {
    /// Free memory as a percentage of total; `None` when the total is unknown.
    pub fn free_memory_percent(&self) -> Option<f64> {
        if self.memory_total == 0 {
            return None;
        }
        Some(self.memory_free as f64 / self.memory_total as f64 * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedSnapshot {
    pub process: ProcessSnapshot,
    pub system: SystemSnapshot,
    #[serde(skip)]
    pub captured_at: DateTime<Utc>,
}

impl CombinedSnapshot {
    pub fn new(process: ProcessSnapshot, system: SystemSnapshot) -> Self {
        CombinedSnapshot {
            process,
            system,
            captured_at: Utc::now(),
        }
    }

    /// Time between process start and capture. Negative if the clocks disagree.
    pub fn process_age(&self) -> TimeDelta {
        self.captured_at - self.process.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_memory_percent_handles_zero_total() {
        let system = SystemSnapshot {
            cpu_cores: 4,
            cpu_model: String::new(),
            cpu_percent: 0.0,
            memory_total: 0,
            memory_used: 0,
            memory_percent: 0.0,
            memory_free: 0,
        };
        assert_eq!(system.free_memory_percent(), None);
    }

    #[test]
    fn process_age_is_relative_to_capture_time() {
        let mut process = ProcessSnapshot::empty(42);
        process.started_at = DateTime::from_timestamp(1_000, 0).unwrap();
        let snapshot = CombinedSnapshot {
            process,
            system: SystemSnapshot {
                cpu_cores: 1,
                cpu_model: String::new(),
                cpu_percent: 0.0,
                memory_total: 1,
                memory_used: 0,
                memory_percent: 0.0,
                memory_free: 1,
            },
            captured_at: DateTime::from_timestamp(1_090, 0).unwrap(),
        };
        assert_eq!(snapshot.process_age(), TimeDelta::seconds(90));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ProcessStatus::Zombie).unwrap();
        assert_eq!(json, "\"zombie\"");
    }
}
