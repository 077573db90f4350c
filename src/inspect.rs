//! The collection half of one inspection: target resolution and snapshot.

use std::time::Duration;

use crate::error::InspectError;
use crate::system::builder::{self, CPU_SAMPLE_WINDOW};
use crate::system::collector::Collector;
use crate::system::port::resolve_port;
use crate::system::snapshot::CombinedSnapshot;
use crate::system::source::MetricsSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Pid(u32),
    Port(u16),
}

/// Owns a [`MetricsSource`] for the length of one inspection.
pub struct Inspector<S = Collector> {
    source: S,
    cpu_window: Duration,
}

impl Inspector<Collector> {
    pub fn new() -> Self {
        Inspector::with_source(Collector::new())
    }
}

impl Default for Inspector<Collector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MetricsSource> Inspector<S> {
    pub fn with_source(source: S) -> Self {
        Inspector {
            source,
            cpu_window: CPU_SAMPLE_WINDOW,
        }
    }

    /// Shorten the host CPU window; tests use this to avoid sleeping.
    pub fn cpu_window(mut self, window: Duration) -> Self {
        self.cpu_window = window;
        self
    }

    pub fn resolve(&mut self, target: Target) -> Result<u32, InspectError> {
        match target {
            Target::Pid(pid) => Ok(pid),
            Target::Port(port) => resolve_port(&mut self.source, port),
        }
    }

    pub fn collect(&mut self, pid: u32) -> Result<CombinedSnapshot, InspectError> {
        let _span = tracing::info_span!("inspect.collect", pid).entered();
        builder::build_combined(&mut self.source, pid, self.cpu_window)
    }

    /// Resolve `target` and capture it; returns the pid actually inspected.
    pub fn run(&mut self, target: Target) -> Result<(u32, CombinedSnapshot), InspectError> {
        let pid = self.resolve(target)?;
        let snapshot = self.collect(pid)?;
        Ok((pid, snapshot))
    }
}
