// Bandmap Input Layer - Node Filtering
// Decides which device nodes are candidates for classification

use std::path::{Path, PathBuf};

/// Namespace a device node lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    /// `/dev/hidraw*`, unprocessed HID reports
    RawHid,
    /// `/dev/input/event*`, evdev events for the same peripheral
    GenericInput,
}

impl NodeClass {
    /// Classify a node by its sysname (e.g. "hidraw3", "event12").
    pub fn from_sysname(sysname: &str) -> Option<Self> {
        if has_numbered_suffix(sysname, "hidraw") {
            Some(NodeClass::RawHid)
        } else if has_numbered_suffix(sysname, "event") {
            Some(NodeClass::GenericInput)
        } else {
            None
        }
    }

    /// udev subsystem that announces nodes of this class
    pub fn subsystem(self) -> &'static str {
        match self {
            NodeClass::RawHid => "hidraw",
            NodeClass::GenericInput => "input",
        }
    }

    /// Directory the nodes are created in
    pub fn directory(self) -> &'static Path {
        match self {
            NodeClass::RawHid => Path::new("/dev"),
            NodeClass::GenericInput => Path::new("/dev/input"),
        }
    }

    /// Full node path for a sysname
    pub fn node_path(self, sysname: &str) -> PathBuf {
        self.directory().join(sysname)
    }
}

fn has_numbered_suffix(sysname: &str, prefix: &str) -> bool {
    match sysname.strip_prefix(prefix) {
        Some(rest) => !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Check if a sysname belongs to the given class.
///
/// Used while scanning a directory, where unrelated entries
/// (`/dev/input/mice`, `/dev/hidg0`, ...) must be skipped.
pub fn matches_node_class(sysname: &str, class: NodeClass) -> bool {
    NodeClass::from_sysname(sysname) == Some(class)
}
