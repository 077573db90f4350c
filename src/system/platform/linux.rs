use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;

use super::PlatformExtensions;
use super::parse::{ProcNetRow, parse_proc_net, parse_socket_inode};
use crate::system::source::{Probe, ProbeError, Protocol, SocketEntry};

const NET_TABLES: [(&str, Protocol); 4] = [
    ("/proc/net/tcp", Protocol::Tcp),
    ("/proc/net/tcp6", Protocol::Tcp),
    ("/proc/net/udp", Protocol::Udp),
    ("/proc/net/udp6", Protocol::Udp),
];

pub struct Platform;

impl PlatformExtensions for Platform {
    fn socket_table() -> Probe<Vec<SocketEntry>> {
        let rows = read_net_tables()?;
        Ok(socket_entries(rows, &socket_owners()))
    }

    fn connection_count(pid: u32) -> Probe<u64> {
        let inodes = socket_inodes(pid)?;
        if inodes.is_empty() {
            return Ok(0);
        }
        let count = read_net_tables()?
            .iter()
            .filter(|(_, row)| inodes.contains(&row.inode))
            .count();
        Ok(count as u64)
    }

    fn open_file_count(pid: u32) -> Probe<u64> {
        let count = fd_targets(pid)?
            .iter()
            .filter(|target| target.starts_with('/'))
            .count();
        Ok(count as u64)
    }
}

/// One entry per owning pid, so a socket shared by a master and its workers
/// yields every holder. Sockets nobody we can see holds keep pid 0.
fn socket_entries(
    rows: Vec<(Protocol, ProcNetRow)>,
    owners: &HashMap<u64, Vec<u32>>,
) -> Vec<SocketEntry> {
    let mut entries = Vec::with_capacity(rows.len());
    for (protocol, row) in rows {
        let state = row.socket_state(protocol);
        let pids = owners.get(&row.inode).map(Vec::as_slice).unwrap_or(&[0]);
        entries.extend(pids.iter().map(|&pid| SocketEntry {
            protocol,
            local_port: row.local_port,
            state,
            pid,
        }));
    }
    entries
}

fn read_net_tables() -> Probe<Vec<(Protocol, ProcNetRow)>> {
    let mut rows = Vec::new();
    for (path, protocol) in NET_TABLES {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            // IPv6 tables are absent when the stack is disabled.
            Err(err) if err.kind() == ErrorKind::NotFound && path.ends_with('6') => continue,
            Err(err) => return Err(ProbeError::from_io(err)),
        };
        rows.extend(parse_proc_net(&contents).into_iter().map(|row| (protocol, row)));
    }
    Ok(rows)
}

fn fd_targets(pid: u32) -> Probe<Vec<String>> {
    let entries = fs::read_dir(format!("/proc/{pid}/fd")).map_err(|err| match err.kind() {
        ErrorKind::NotFound => ProbeError::ProcessGone(pid),
        _ => ProbeError::from_io(err),
    })?;
    Ok(entries
        .flatten()
        .filter_map(|entry| fs::read_link(entry.path()).ok())
        .map(|target| target.to_string_lossy().into_owned())
        .collect())
}

fn socket_inodes(pid: u32) -> Probe<HashSet<u64>> {
    Ok(fd_targets(pid)?
        .iter()
        .filter_map(|target| parse_socket_inode(target))
        .collect())
}

/// Map socket inodes to every pid holding them, in `/proc` order. Processes we
/// may not inspect are skipped.
fn socket_owners() -> HashMap<u64, Vec<u32>> {
    let mut owners = HashMap::new();
    let Ok(entries) = fs::read_dir("/proc") else {
        return owners;
    };
    for entry in entries.flatten() {
        let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) else {
            continue;
        };
        let Ok(inodes) = socket_inodes(pid) else {
            continue;
        };
        for inode in inodes {
            owners.entry(inode).or_default().push(pid);
        }
    }
    owners
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::source::SocketState;

    fn listen_row(port: u16, inode: u64) -> (Protocol, ProcNetRow) {
        let row = ProcNetRow {
            local_port: port,
            remote_port: 0,
            state: 0x0A,
            inode,
        };
        (Protocol::Tcp, row)
    }

    #[test]
    fn shared_socket_yields_every_owner() {
        let owners = HashMap::from([(77, vec![10, 11, 12])]);
        let entries = socket_entries(vec![listen_row(80, 77)], &owners);
        let pids: Vec<u32> = entries.iter().map(|e| e.pid).collect();
        assert_eq!(pids, vec![10, 11, 12]);
        assert!(entries.iter().all(|e| e.local_port == 80 && e.state == SocketState::Listen));
    }

    #[test]
    fn unowned_socket_keeps_pid_zero() {
        let owners = HashMap::from([(77, vec![10])]);
        let entries = socket_entries(vec![listen_row(80, 77), listen_row(8080, 99)], &owners);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].local_port, 8080);
        assert_eq!(entries[1].pid, 0);
    }

    #[test]
    fn own_listener_is_attributed() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let entries = Platform::socket_table().unwrap();
        assert!(entries.iter().any(|e| e.local_port == port
            && e.state == SocketState::Listen
            && e.pid == std::process::id()));
    }
}
