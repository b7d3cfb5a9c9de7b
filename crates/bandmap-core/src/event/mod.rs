// Bandmap Event Handling
// Hotplug routing, session and grab bookkeeping, and the poll loop

pub mod devices;
pub mod error;
pub mod hotplug;
#[cfg(feature = "linux")]
pub mod r#loop;
pub mod registry;

pub use devices::{DeviceManager, LoopState, NodeBackend};
pub use error::{EventLoopError, EventLoopResult};
pub use hotplug::{HotplugAction, HotplugEvent, HotplugRoute};
#[cfg(feature = "linux")]
pub use r#loop::{DeviceInfo, EventLoop, LinuxBackend};
pub use registry::{ExclusiveNode, GrabRegistry, SessionRegistry};
