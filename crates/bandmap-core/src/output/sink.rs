// Bandmap Output Sink
// Boundary between the emission tracker and the virtual device

use crate::control::Control;

/// Error types for virtual device operations
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to create virtual device: {0}")]
    DeviceCreation(#[source] std::io::Error),

    #[error("Failed to write event: {0}")]
    Write(#[source] std::io::Error),
}

impl SinkError {
    /// Whether this failure is a missing-permission condition
    pub fn is_permission_denied(&self) -> bool {
        let err = match self {
            SinkError::DeviceCreation(e) | SinkError::Write(e) => e,
        };
        err.kind() == std::io::ErrorKind::PermissionDenied
    }
}

/// Something control values can be written to.
///
/// `write` stages a single control value; `sync` publishes everything staged
/// since the previous `sync` as one frame.
pub trait ControlSink {
    fn write(&mut self, control: Control, value: i32) -> Result<(), SinkError>;

    fn sync(&mut self) -> Result<(), SinkError>;
}

impl<S: ControlSink + ?Sized> ControlSink for &mut S {
    fn write(&mut self, control: Control, value: i32) -> Result<(), SinkError> {
        (**self).write(control, value)
    }

    fn sync(&mut self) -> Result<(), SinkError> {
        (**self).sync()
    }
}
