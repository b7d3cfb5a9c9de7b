// Bandmap Emission State
// Last value written to the virtual device, per control

use indexmap::IndexMap;

use crate::control::Control;

/// Tracks the last emitted value of every control with O(1) lookup.
///
/// Entries are kept in first-emission order so debug dumps read in the same
/// order the device was initialised.
#[derive(Debug, Clone, Default)]
pub struct EmissionState {
    last: IndexMap<Control, i32>,
}

impl EmissionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value as written
    pub fn record(&mut self, control: Control, value: i32) {
        self.last.insert(control, value);
    }

    /// Last value written for a control, `None` if never written
    pub fn last_emitted(&self, control: Control) -> Option<i32> {
        self.last.get(&control).copied()
    }

    /// Whether writing `value` would change what the device last saw
    pub fn differs(&self, control: Control, value: i32) -> bool {
        self.last_emitted(control) != Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Control, i32)> + '_ {
        self.last.iter().map(|(c, v)| (*c, *v))
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }
}
