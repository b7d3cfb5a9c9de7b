// Bandmap Event Errors
// Failures that stop the service

use std::io;
use std::path::PathBuf;

use crate::output::SinkError;

/// Result type for event loop operations
pub type EventLoopResult<T> = Result<T, EventLoopError>;

/// Errors that can occur in event loop
#[derive(Debug, thiserror::Error)]
pub enum EventLoopError {
    #[error("Permission denied opening {0}")]
    PermissionDenied(PathBuf),

    #[error("Failed to create virtual device for {node}: {source}")]
    VirtualDevice {
        node: PathBuf,
        #[source]
        source: SinkError,
    },

    #[error("Hotplug monitor error: {0}")]
    Monitor(#[source] io::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl EventLoopError {
    /// Whether the process lacks the privileges to run at all
    pub fn is_privilege_failure(&self) -> bool {
        match self {
            EventLoopError::PermissionDenied(_) => true,
            EventLoopError::VirtualDevice { source, .. } => source.is_permission_denied(),
            EventLoopError::Monitor(e) | EventLoopError::Io(e) => {
                e.kind() == io::ErrorKind::PermissionDenied
            }
        }
    }
}
