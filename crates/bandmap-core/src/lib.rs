// Bandmap Core Library
// Rock Band 4 Bluetooth peripheral to virtual gamepad translation

pub mod control;
pub mod event;
pub mod input;
pub mod output;
pub mod protocol;
pub mod session;

pub use control::{AxisRange, Control, EventKind};
pub use event::{
    DeviceManager, EventLoopError, EventLoopResult, ExclusiveNode, GrabRegistry, HotplugAction,
    HotplugEvent, HotplugRoute, LoopState, NodeBackend, SessionRegistry,
};
pub use input::{DeviceIdentity, NodeClass, PeripheralKind};
pub use output::{ControlSink, EmissionState, EmissionTracker, MemorySink, SinkError};
pub use protocol::{decode, ControlSnapshot, DecodeError, DecodeResult};
pub use session::{DeviceSession, RawSource, SessionStatus, TerminationReason};

#[cfg(feature = "linux")]
pub use event::{EventLoop, LinuxBackend};
#[cfg(feature = "linux")]
pub use input::RawHidNode;
#[cfg(feature = "linux")]
pub use output::VirtualDevice;
