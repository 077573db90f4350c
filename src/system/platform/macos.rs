use std::process::Command;

use libproc::libproc::bsd_info::BSDInfo;
use libproc::libproc::file_info::{ListFDs, ProcFDType};
use libproc::libproc::proc_pid::{listpidinfo, pidinfo};

use super::PlatformExtensions;
use super::parse::parse_lsof;
use crate::system::source::{Probe, ProbeError, SocketEntry};

pub struct Platform;

impl PlatformExtensions for Platform {
    fn socket_table() -> Probe<Vec<SocketEntry>> {
        run_lsof(&["-nP", "-i", "-FpPnT"])
    }

    fn connection_count(pid: u32) -> Probe<u64> {
        let pid_arg = pid.to_string();
        let entries = run_lsof(&["-nP", "-i", "-a", "-p", &pid_arg, "-FpPnT"])?;
        Ok(entries.iter().filter(|e| e.pid == pid).count() as u64)
    }

    fn open_file_count(pid: u32) -> Probe<u64> {
        let info = pidinfo::<BSDInfo>(pid as i32, 0).map_err(ProbeError::Unavailable)?;
        let fds = listpidinfo::<ListFDs>(pid as i32, info.pbi_nfiles as usize)
            .map_err(ProbeError::Unavailable)?;
        let count = fds
            .iter()
            .filter(|fd| matches!(ProcFDType::from(fd.proc_fdtype), ProcFDType::VNode))
            .count();
        Ok(count as u64)
    }
}

fn run_lsof(args: &[&str]) -> Probe<Vec<SocketEntry>> {
    let output = Command::new("lsof")
        .args(args)
        .output()
        .map_err(ProbeError::from_io)?;
    // lsof exits 1 when nothing matched; an empty table is still an answer.
    if !output.status.success() && !output.stderr.is_empty() && output.stdout.is_empty() {
        return Err(ProbeError::Unavailable(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(parse_lsof(&String::from_utf8_lossy(&output.stdout)))
}
