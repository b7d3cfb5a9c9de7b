// Bandmap Control Identifiers
// Semantic controls and their Linux input-event-codes.h mapping

use strum_macros::{AsRefStr, Display, EnumIter};

/// EV_KEY event type code
pub const EV_KEY: u16 = 0x01;
/// EV_ABS event type code
pub const EV_ABS: u16 = 0x03;

/// Event type a control is written as on the virtual device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Digital button (EV_KEY), values 0/1
    Key,
    /// Absolute axis (EV_ABS)
    Absolute,
}

impl EventKind {
    /// Raw event type code
    pub fn event_type(self) -> u16 {
        match self {
            EventKind::Key => EV_KEY,
            EventKind::Absolute => EV_ABS,
        }
    }
}

/// Declared range of an absolute axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

const HAT_RANGE: AxisRange = AxisRange::new(-1, 1);
const BYTE_RANGE: AxisRange = AxisRange::new(0, 255);
const PICKUP_RANGE: AxisRange = AxisRange::new(0, 4);

/// A control exposed by the virtual device.
///
/// The display name of each variant is the Linux event code name it is
/// written as, so log lines read the same as `evtest` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, AsRefStr, Display)]
pub enum Control {
    #[strum(serialize = "ABS_HAT0X")]
    HatX,
    #[strum(serialize = "ABS_HAT0Y")]
    HatY,
    #[strum(serialize = "BTN_A")]
    ButtonA,
    #[strum(serialize = "BTN_B")]
    ButtonB,
    #[strum(serialize = "BTN_C")]
    ButtonC,
    #[strum(serialize = "BTN_X")]
    ButtonX,
    #[strum(serialize = "BTN_Y")]
    ButtonY,
    #[strum(serialize = "BTN_Z")]
    ButtonZ,
    #[strum(serialize = "BTN_TL")]
    TriggerLeft,
    #[strum(serialize = "BTN_TR")]
    TriggerRight,
    #[strum(serialize = "BTN_TL2")]
    TriggerLeft2,
    #[strum(serialize = "BTN_TR2")]
    TriggerRight2,
    #[strum(serialize = "BTN_SELECT")]
    Select,
    #[strum(serialize = "BTN_START")]
    Start,
    #[strum(serialize = "BTN_MODE")]
    Mode,
    /// Guitar neck tilt sensor
    #[strum(serialize = "ABS_X")]
    Tilt,
    /// Guitar whammy bar
    #[strum(serialize = "ABS_Y")]
    Whammy,
    /// Guitar five-way pickup selector
    #[strum(serialize = "ABS_Z")]
    Pickup,
}

impl Control {
    /// Event type this control is written as
    pub fn event_kind(self) -> EventKind {
        match self {
            Control::HatX | Control::HatY | Control::Tilt | Control::Whammy | Control::Pickup => {
                EventKind::Absolute
            }
            _ => EventKind::Key,
        }
    }

    /// Event code from input-event-codes.h
    pub fn code(self) -> u16 {
        match self {
            Control::Tilt => 0x00,
            Control::Whammy => 0x01,
            Control::Pickup => 0x02,
            Control::HatX => 0x10,
            Control::HatY => 0x11,
            Control::ButtonA => 0x130,
            Control::ButtonB => 0x131,
            Control::ButtonC => 0x132,
            Control::ButtonX => 0x133,
            Control::ButtonY => 0x134,
            Control::ButtonZ => 0x135,
            Control::TriggerLeft => 0x136,
            Control::TriggerRight => 0x137,
            Control::TriggerLeft2 => 0x138,
            Control::TriggerRight2 => 0x139,
            Control::Select => 0x13a,
            Control::Start => 0x13b,
            Control::Mode => 0x13c,
        }
    }

    /// Declared axis range, `None` for buttons
    pub fn axis_range(self) -> Option<AxisRange> {
        match self {
            Control::HatX | Control::HatY => Some(HAT_RANGE),
            Control::Tilt | Control::Whammy => Some(BYTE_RANGE),
            // The selector reports raw bytes; the range is what consumers expect.
            Control::Pickup => Some(PICKUP_RANGE),
            _ => None,
        }
    }

    pub fn is_button(self) -> bool {
        self.event_kind() == EventKind::Key
    }
}
