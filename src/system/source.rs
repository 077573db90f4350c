use std::time::Duration;

use thiserror::Error;

use super::snapshot::ProcessStatus;

/// Why a single OS read produced no value.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("process {0} is gone")]
    ProcessGone(u32),
    #[error("not supported on this platform")]
    Unsupported,
    #[error("{0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Classify an io error so permission problems stay recognisable.
    pub fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => ProbeError::PermissionDenied,
            _ => ProbeError::Io(err),
        }
    }
}

/// Result of one OS read: the value, or the reason it is absent.
pub type Probe<T> = Result<T, ProbeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    Listen,
    Other,
}

/// One row of the host connection table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketEntry {
    pub protocol: Protocol,
    pub local_port: u16,
    pub state: SocketState,
    /// Owning process; 0 when the OS did not attribute the socket.
    pub pid: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryUsage {
    pub resident: u64,
    pub virtual_: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuInfo {
    pub cores: usize,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostMemory {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

/// Host OS interfaces the engine reads from.
///
/// Every process attribute is its own call so that one refused read never
/// hides the others.
pub trait MetricsSource {
    /// Lightweight existence check; also refreshes any cached view of `pid`.
    fn process_exists(&mut self, pid: u32) -> bool;

    fn process_name(&mut self, pid: u32) -> Probe<String>;
    fn executable(&mut self, pid: u32) -> Probe<String>;
    fn command_line(&mut self, pid: u32) -> Probe<String>;
    fn working_dir(&mut self, pid: u32) -> Probe<String>;
    fn status(&mut self, pid: u32) -> Probe<ProcessStatus>;
    /// Instantaneous CPU rate; implementations take two samples.
    fn cpu_percent(&mut self, pid: u32) -> Probe<f64>;
    fn memory(&mut self, pid: u32) -> Probe<MemoryUsage>;
    fn memory_percent(&mut self, pid: u32) -> Probe<f64>;
    /// Start time in seconds since the Unix epoch.
    fn start_time(&mut self, pid: u32) -> Probe<u64>;
    fn connection_count(&mut self, pid: u32) -> Probe<u64>;
    fn open_file_count(&mut self, pid: u32) -> Probe<u64>;
    fn child_count(&mut self, pid: u32) -> Probe<u64>;

    fn cpu_info(&mut self) -> Probe<CpuInfo>;
    /// Host CPU utilisation averaged over `window`.
    fn system_cpu_percent(&mut self, window: Duration) -> Probe<f64>;
    fn host_memory(&mut self) -> Probe<HostMemory>;

    /// Every TCP and UDP socket on the host, all address families, in OS order.
    fn socket_table(&mut self) -> Probe<Vec<SocketEntry>>;
}
