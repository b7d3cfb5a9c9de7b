// Bandmap uinput Output Layer
// Virtual gamepad creation and frame emission

use evdev::uinput::VirtualDeviceBuilder;
use evdev::{
    AbsInfo, AbsoluteAxisType, AttributeSet, BusType, EventType, InputEvent, InputId, Key,
    UinputAbsSetup,
};

use super::batch::EventBatch;
use super::sink::{ControlSink, SinkError};
use crate::control::{Control, EventKind};
use crate::input::PeripheralKind;

/// Virtual uinput device mirroring one peripheral
pub struct VirtualDevice {
    device: evdev::uinput::VirtualDevice,
    pending: EventBatch<InputEvent>,
    kind: PeripheralKind,
}

impl VirtualDevice {
    /// Create a virtual device declaring the capability set of `kind`
    pub fn new(kind: PeripheralKind) -> Result<Self, SinkError> {
        let mut keys = AttributeSet::<Key>::new();
        let mut builder = VirtualDeviceBuilder::new()
            .map_err(SinkError::DeviceCreation)?
            .name(kind.virtual_device_name())
            .input_id(InputId::new(BusType::BUS_USB, 0, 0, 0));

        for control in kind.capabilities() {
            match control.axis_range() {
                Some(range) => {
                    let setup = UinputAbsSetup::new(
                        AbsoluteAxisType(control.code()),
                        AbsInfo::new(0, range.min, range.max, 0, 0, 0),
                    );
                    builder = builder
                        .with_absolute_axis(&setup)
                        .map_err(SinkError::DeviceCreation)?;
                }
                None => keys.insert(Key::new(control.code())),
            }
        }

        let device = builder
            .with_keys(&keys)
            .map_err(SinkError::DeviceCreation)?
            .build()
            .map_err(SinkError::DeviceCreation)?;

        Ok(Self {
            device,
            pending: EventBatch::new(),
            kind,
        })
    }

    pub fn kind(&self) -> PeripheralKind {
        self.kind
    }
}

fn event_type(control: Control) -> EventType {
    match control.event_kind() {
        EventKind::Key => EventType::KEY,
        EventKind::Absolute => EventType::ABSOLUTE,
    }
}

impl ControlSink for VirtualDevice {
    fn write(&mut self, control: Control, value: i32) -> Result<(), SinkError> {
        log::trace!("{} {} = {}", self.kind, control, value);
        self.pending
            .push(InputEvent::new(event_type(control), control.code(), value));
        Ok(())
    }

    /// Post the staged events; evdev appends the SYN_REPORT.
    fn sync(&mut self) -> Result<(), SinkError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let result = self.device.emit(self.pending.as_slice());
        self.pending.clear();
        result.map_err(SinkError::Write)
    }
}
