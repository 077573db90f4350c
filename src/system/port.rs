use tracing::debug;

use super::source::{MetricsSource, SocketState};
use crate::error::{CollectionError, InspectError};

/// Find the process listening on `port` (TCP or UDP, any address family).
///
/// Candidates are tried in the order the OS reported them. When several
/// processes listen on the same port the answer is whichever comes first,
/// which may differ between runs.
pub fn resolve_port<S: MetricsSource>(source: &mut S, port: u16) -> Result<u32, InspectError> {
    let _span = tracing::debug_span!("port.resolve", port).entered();
    let table = source
        .socket_table()
        .map_err(|err| CollectionError::new("network connections", err))?;

    let candidates: Vec<u32> = table
        .iter()
        .filter(|entry| entry.local_port == port && entry.state == SocketState::Listen)
        .map(|entry| entry.pid)
        .collect();

    if candidates.is_empty() {
        return Err(InspectError::NoListener(port));
    }

    for pid in candidates.into_iter().filter(|&pid| pid > 0) {
        if source.process_exists(pid) {
            debug!(pid, "listener confirmed");
            return Ok(pid);
        }
        debug!(pid, "listener exited before confirmation");
    }

    Err(InspectError::NoValidProcess(port))
}
