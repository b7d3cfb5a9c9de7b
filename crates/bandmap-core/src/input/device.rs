// Bandmap Input Layer - Peripheral Identification
// Vendor/product matching and per-kind virtual device layout

use crate::control::Control;

/// Mad Catz USB vendor id
pub const MAD_CATZ_VENDOR_ID: u16 = 0x0738;
/// Rock Band 4 Fender Stratocaster (Bluetooth)
pub const GUITAR_PRODUCT_ID: u16 = 0x8261;
/// Rock Band 4 drum kit (Bluetooth)
pub const DRUMS_PRODUCT_ID: u16 = 0x8262;

/// Controls shared by both peripherals, in emission order
const SHARED_CONTROLS: &[Control] = &[
    Control::HatX,
    Control::HatY,
    Control::ButtonB,
    Control::ButtonC,
    Control::ButtonX,
    Control::ButtonA,
    Control::TriggerLeft2,
    Control::TriggerRight2,
    Control::ButtonY,
    Control::Mode,
];

const DRUM_CONTROLS: &[Control] = &[
    Control::TriggerLeft,
    Control::TriggerRight,
    Control::Select,
    Control::ButtonZ,
];

const GUITAR_CONTROLS: &[Control] = &[
    Control::Tilt,
    Control::Whammy,
    Control::Pickup,
    Control::Select,
];

/// Keys declared on the virtual device that no report ever sets.
/// Gamepad heuristics (SDL among them) look for Start, and the guitar
/// keeps the drum kit's shoulder layout.
const GUITAR_DECLARED_ONLY: &[Control] = &[
    Control::ButtonZ,
    Control::TriggerLeft,
    Control::TriggerRight,
    Control::Start,
];

const DRUM_DECLARED_ONLY: &[Control] = &[Control::Start];

/// Supported peripheral type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeripheralKind {
    Guitar,
    Drums,
}

impl PeripheralKind {
    /// Match a vendor/product pair against the supported peripherals
    pub fn from_ids(vendor_id: u16, product_id: u16) -> Option<Self> {
        if vendor_id != MAD_CATZ_VENDOR_ID {
            return None;
        }
        match product_id {
            GUITAR_PRODUCT_ID => Some(PeripheralKind::Guitar),
            DRUMS_PRODUCT_ID => Some(PeripheralKind::Drums),
            _ => None,
        }
    }

    /// Name the virtual device is registered under
    pub fn virtual_device_name(self) -> &'static str {
        match self {
            PeripheralKind::Guitar => "Mapped Rock Band 4 Fender Stratocaster",
            PeripheralKind::Drums => "Mapped Rock Band 4 Drum Set",
        }
    }

    /// Controls the decoder produces for this kind, in emission order
    pub fn controls(self) -> impl Iterator<Item = Control> {
        let extras = match self {
            PeripheralKind::Guitar => GUITAR_CONTROLS,
            PeripheralKind::Drums => DRUM_CONTROLS,
        };
        SHARED_CONTROLS.iter().chain(extras.iter()).copied()
    }

    /// Full capability set of the virtual device: every decoded control,
    /// then the keys that are declared but stay released.
    pub fn capabilities(self) -> impl Iterator<Item = Control> {
        let declared_only = match self {
            PeripheralKind::Guitar => GUITAR_DECLARED_ONLY,
            PeripheralKind::Drums => DRUM_DECLARED_ONLY,
        };
        self.controls().chain(declared_only.iter().copied())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PeripheralKind::Guitar => "guitar",
            PeripheralKind::Drums => "drums",
        }
    }
}

impl std::fmt::Display for PeripheralKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity returned by a node's control query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub bus_type: u32,
    pub vendor_id: u16,
    pub product_id: u16,
    /// Only generic-input nodes report a version
    pub version: Option<u16>,
}

impl DeviceIdentity {
    pub fn new(bus_type: u32, vendor_id: u16, product_id: u16) -> Self {
        Self {
            bus_type,
            vendor_id,
            product_id,
            version: None,
        }
    }

    pub fn with_version(mut self, version: u16) -> Self {
        self.version = Some(version);
        self
    }

    /// Classify this identity
    pub fn kind(&self) -> Option<PeripheralKind> {
        PeripheralKind::from_ids(self.vendor_id, self.product_id)
    }
}
