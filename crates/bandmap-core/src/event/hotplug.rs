// Bandmap Hotplug Records
// udev monitor records and routing of attach notifications

use std::path::PathBuf;

use crate::input::NodeClass;

/// Hotplug action reported by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotplugAction {
    Add,
    Remove,
    Other,
}

/// One record drained from the hotplug monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotplugEvent {
    pub action: HotplugAction,
    pub subsystem: String,
    pub sysname: String,
    pub devnode: Option<PathBuf>,
}

/// What the event loop should do with a hotplug record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotplugRoute {
    /// Classify the raw node and start a session on match
    Session(PathBuf),
    /// Classify the input node and grab it on match
    Grab(PathBuf),
}

impl HotplugEvent {
    pub fn new(
        action: HotplugAction,
        subsystem: impl Into<String>,
        sysname: impl Into<String>,
        devnode: Option<PathBuf>,
    ) -> Self {
        Self {
            action,
            subsystem: subsystem.into(),
            sysname: sysname.into(),
            devnode,
        }
    }

    /// Route an attach record to the matching handler.
    ///
    /// Removals are ignored: a session ends when its next read fails.
    /// Records without a device node (the parent `inputN` device of an
    /// `eventN` node, for example) are ignored too.
    pub fn route(&self) -> Option<HotplugRoute> {
        if self.action != HotplugAction::Add {
            return None;
        }
        let class = NodeClass::from_sysname(&self.sysname)?;
        if class.subsystem() != self.subsystem {
            return None;
        }
        let node = self
            .devnode
            .clone()
            .unwrap_or_else(|| class.node_path(&self.sysname));
        match class {
            NodeClass::RawHid => Some(HotplugRoute::Session(node)),
            NodeClass::GenericInput if self.devnode.is_some() => Some(HotplugRoute::Grab(node)),
            NodeClass::GenericInput => None,
        }
    }
}

#[cfg(feature = "linux")]
impl From<&udev::Event> for HotplugEvent {
    fn from(event: &udev::Event) -> Self {
        let action = match event.event_type() {
            udev::EventType::Add => HotplugAction::Add,
            udev::EventType::Remove => HotplugAction::Remove,
            _ => HotplugAction::Other,
        };
        let device = event.device();
        Self {
            action,
            subsystem: device
                .subsystem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            sysname: device.sysname().to_string_lossy().into_owned(),
            devnode: device.devnode().map(|p| p.to_path_buf()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_hidraw_add() {
        let event = HotplugEvent::new(
            HotplugAction::Add,
            "hidraw",
            "hidraw4",
            Some(PathBuf::from("/dev/hidraw4")),
        );
        assert_eq!(
            event.route(),
            Some(HotplugRoute::Session(PathBuf::from("/dev/hidraw4")))
        );
    }

    #[test]
    fn test_route_hidraw_without_devnode_uses_default_path() {
        let event = HotplugEvent::new(HotplugAction::Add, "hidraw", "hidraw1", None);
        assert_eq!(
            event.route(),
            Some(HotplugRoute::Session(PathBuf::from("/dev/hidraw1")))
        );
    }

    #[test]
    fn test_route_input_add() {
        let event = HotplugEvent::new(
            HotplugAction::Add,
            "input",
            "event9",
            Some(PathBuf::from("/dev/input/event9")),
        );
        assert_eq!(
            event.route(),
            Some(HotplugRoute::Grab(PathBuf::from("/dev/input/event9")))
        );
    }

    #[test]
    fn test_route_ignores_parent_input_device() {
        let event = HotplugEvent::new(HotplugAction::Add, "input", "input27", None);
        assert_eq!(event.route(), None);
    }

    #[test]
    fn test_route_ignores_remove() {
        let event = HotplugEvent::new(
            HotplugAction::Remove,
            "hidraw",
            "hidraw4",
            Some(PathBuf::from("/dev/hidraw4")),
        );
        assert_eq!(event.route(), None);
    }

    #[test]
    fn test_route_ignores_subsystem_mismatch() {
        let event = HotplugEvent::new(HotplugAction::Add, "input", "hidraw4", None);
        assert_eq!(event.route(), None);
    }
}
