use thiserror::Error;

use crate::system::source::ProbeError;

/// Fatal failures of a single inspection. Everything else degrades in place.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("process {0} not found")]
    ProcessNotFound(u32),
    #[error("no process found listening on port {0}")]
    NoListener(u16),
    #[error("no valid process found listening on port {0}")]
    NoValidProcess(u16),
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// Host-wide data needed for analysis could not be read.
#[derive(Debug, Error)]
#[error("failed to collect {what}: {source}")]
pub struct CollectionError {
    pub what: &'static str,
    #[source]
    pub source: ProbeError,
}

impl CollectionError {
    pub fn new(what: &'static str, source: ProbeError) -> Self {
        CollectionError { what, source }
    }
}
