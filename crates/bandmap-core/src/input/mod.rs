// Bandmap Input Layer
// Peripheral identification and raw node access

mod device;
mod filter;
#[cfg(feature = "linux")]
mod probe;

pub use device::{
    DeviceIdentity, PeripheralKind, DRUMS_PRODUCT_ID, GUITAR_PRODUCT_ID, MAD_CATZ_VENDOR_ID,
};
pub use filter::{matches_node_class, NodeClass};
#[cfg(feature = "linux")]
pub use probe::{
    classify_input_node, classify_raw_node, probe_input_node, probe_raw_node, RawHidNode,
};
