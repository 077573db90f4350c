//! Text parsers for the connection tables each OS exposes.
//!
//! Kept free of OS-specific cfg so they can be tested on any host.

use crate::system::source::{Protocol, SocketEntry, SocketState};

const TCP_LISTEN: u8 = 0x0A;
const UDP_UNCONNECTED: u8 = 0x07;

/// A row of `/proc/net/{tcp,tcp6,udp,udp6}` before its inode is attributed to a pid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcNetRow {
    pub local_port: u16,
    pub remote_port: u16,
    pub state: u8,
    pub inode: u64,
}

impl ProcNetRow {
    pub fn socket_state(&self, protocol: Protocol) -> SocketState {
        let listening = match protocol {
            Protocol::Tcp => self.state == TCP_LISTEN,
            Protocol::Udp => self.state == UDP_UNCONNECTED && self.remote_port == 0,
        };
        if listening {
            SocketState::Listen
        } else {
            SocketState::Other
        }
    }
}

pub fn parse_proc_net(contents: &str) -> Vec<ProcNetRow> {
    let mut rows = Vec::new();
    // First line is the column header.
    for line in contents.lines().skip(1) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 10 {
            continue;
        }
        let (Some(local_port), Some(remote_port)) =
            (hex_port(parts[1]), hex_port(parts[2]))
        else {
            continue;
        };
        let Ok(state) = u8::from_str_radix(parts[3], 16) else {
            continue;
        };
        rows.push(ProcNetRow {
            local_port,
            remote_port,
            state,
            inode: parts[9].parse().unwrap_or(0),
        });
    }
    rows
}

fn hex_port(addr: &str) -> Option<u16> {
    let (_, port) = addr.rsplit_once(':')?;
    u16::from_str_radix(port, 16).ok()
}

/// Extract the inode from an fd link target such as `socket:[12345]`.
pub fn parse_socket_inode(link: &str) -> Option<u64> {
    let rest = link.strip_prefix("socket:[")?;
    let end = rest.find(']')?;
    rest[..end].parse().ok()
}

/// Parse `lsof -nP -i -FpPnT` field output.
pub fn parse_lsof(output: &str) -> Vec<SocketEntry> {
    let mut entries = Vec::new();
    let mut pid = 0u32;
    let mut file = LsofFile::default();

    for line in output.lines() {
        let Some(tag) = line.chars().next() else {
            continue;
        };
        let value = &line[tag.len_utf8()..];
        match tag {
            'p' => {
                file.flush(pid, &mut entries);
                pid = value.parse().unwrap_or(0);
            }
            'f' => file.flush(pid, &mut entries),
            'P' => file.protocol = protocol_from_name(value),
            'n' => file.name = Some(value.to_string()),
            'T' => {
                if let Some(state) = value.strip_prefix("ST=") {
                    file.tcp_state = Some(state.to_string());
                }
            }
            _ => {}
        }
    }
    file.flush(pid, &mut entries);
    entries
}

#[derive(Default)]
struct LsofFile {
    protocol: Option<Protocol>,
    name: Option<String>,
    tcp_state: Option<String>,
}

impl LsofFile {
    fn flush(&mut self, pid: u32, entries: &mut Vec<SocketEntry>) {
        let file = std::mem::take(self);
        let (Some(protocol), Some(name)) = (file.protocol, file.name) else {
            return;
        };
        let (local, remote) = match name.split_once("->") {
            Some((local, remote)) => (local, Some(remote)),
            None => (name.as_str(), None),
        };
        let Some(local_port) = endpoint_port(local) else {
            return;
        };
        let state = match protocol {
            Protocol::Tcp if file.tcp_state.as_deref() == Some("LISTEN") => SocketState::Listen,
            Protocol::Udp if remote.is_none() => SocketState::Listen,
            _ => SocketState::Other,
        };
        entries.push(SocketEntry {
            protocol,
            local_port,
            state,
            pid,
        });
    }
}

/// Parse `netstat -ano` output.
pub fn parse_netstat(output: &str) -> Vec<SocketEntry> {
    let mut entries = Vec::new();
    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(protocol) = parts.first().and_then(|p| protocol_from_name(p)) else {
            continue;
        };
        let (local, state, pid) = match (protocol, parts.len()) {
            (Protocol::Tcp, 5) => {
                let state = if parts[3].eq_ignore_ascii_case("LISTENING") {
                    SocketState::Listen
                } else {
                    SocketState::Other
                };
                (parts[1], state, parts[4])
            }
            (Protocol::Udp, 4) => {
                let state = if parts[2] == "*:*" {
                    SocketState::Listen
                } else {
                    SocketState::Other
                };
                (parts[1], state, parts[3])
            }
            _ => continue,
        };
        let Some(local_port) = endpoint_port(local) else {
            continue;
        };
        entries.push(SocketEntry {
            protocol,
            local_port,
            state,
            pid: pid.parse().unwrap_or(0),
        });
    }
    entries
}

fn protocol_from_name(name: &str) -> Option<Protocol> {
    let upper = name.to_ascii_uppercase();
    if upper.starts_with("TCP") {
        Some(Protocol::Tcp)
    } else if upper.starts_with("UDP") {
        Some(Protocol::Udp)
    } else {
        None
    }
}

fn endpoint_port(endpoint: &str) -> Option<u16> {
    let (_, port) = endpoint.rsplit_once(':')?;
    port.parse().ok()
}
