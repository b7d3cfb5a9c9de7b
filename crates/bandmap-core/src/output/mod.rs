// Bandmap Output Layer
// Emission tracking and virtual device output

mod batch;
mod memory;
mod sink;
mod state;
mod tracker;

#[cfg(feature = "linux")]
mod uinput;

pub use batch::{batch_config, EventBatch};
pub use memory::MemorySink;
pub use sink::{ControlSink, SinkError};
pub use state::EmissionState;
pub use tracker::EmissionTracker;

#[cfg(feature = "linux")]
pub use uinput::VirtualDevice;
