use std::process::Command;

use super::PlatformExtensions;
use super::parse::parse_netstat;
use crate::system::source::{Probe, ProbeError, SocketEntry};

#[cfg(target_os = "windows")]
use windows_sys::Win32::{
    Foundation::CloseHandle,
    System::Threading::{GetProcessHandleCount, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION},
};

pub struct Platform;

impl PlatformExtensions for Platform {
    fn socket_table() -> Probe<Vec<SocketEntry>> {
        let output = Command::new("netstat")
            .arg("-ano")
            .output()
            .map_err(ProbeError::from_io)?;
        if !output.status.success() {
            return Err(ProbeError::Unavailable(format!(
                "netstat exited with {}",
                output.status
            )));
        }
        Ok(parse_netstat(&String::from_utf8_lossy(&output.stdout)))
    }

    fn connection_count(pid: u32) -> Probe<u64> {
        let count = Self::socket_table()?
            .iter()
            .filter(|entry| entry.pid == pid)
            .count();
        Ok(count as u64)
    }

    #[cfg(target_os = "windows")]
    fn open_file_count(pid: u32) -> Probe<u64> {
        unsafe {
            let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
            if handle.is_null() {
                return Err(ProbeError::PermissionDenied);
            }
            let mut count = 0u32;
            let ok = GetProcessHandleCount(handle, &mut count);
            let err = (ok == 0).then(std::io::Error::last_os_error);
            CloseHandle(handle);
            if let Some(err) = err {
                return Err(ProbeError::from_io(err));
            }
            Ok(u64::from(count))
        }
    }

    #[cfg(not(target_os = "windows"))]
    fn open_file_count(_pid: u32) -> Probe<u64> {
        Err(ProbeError::Unsupported)
    }
}
