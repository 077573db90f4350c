use super::source::{Probe, SocketEntry};

pub mod parse;

pub trait PlatformExtensions {
    fn socket_table() -> Probe<Vec<SocketEntry>>;
    fn connection_count(pid: u32) -> Probe<u64>;
    fn open_file_count(pid: u32) -> Probe<u64>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
mod platform_impl {
    use super::PlatformExtensions;
    use crate::system::source::{Probe, ProbeError, SocketEntry};

    pub struct Platform;

    impl PlatformExtensions for Platform {
        fn socket_table() -> Probe<Vec<SocketEntry>> {
            Err(ProbeError::Unsupported)
        }

        fn connection_count(_pid: u32) -> Probe<u64> {
            Err(ProbeError::Unsupported)
        }

        fn open_file_count(_pid: u32) -> Probe<u64> {
            Err(ProbeError::Unsupported)
        }
    }
}

pub fn socket_table() -> Probe<Vec<SocketEntry>> {
    platform_impl::Platform::socket_table()
}

pub fn connection_count(pid: u32) -> Probe<u64> {
    platform_impl::Platform::connection_count(pid)
}

pub fn open_file_count(pid: u32) -> Probe<u64> {
    platform_impl::Platform::open_file_count(pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrappers_do_not_panic_for_current_pid() {
        let pid = std::process::id();
        let _ = socket_table();
        let _ = connection_count(pid);
        let _ = open_file_count(pid);
    }
}
