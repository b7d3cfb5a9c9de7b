// Bandmap Control Snapshot
// Decoded state of every control for one report

use smallvec::SmallVec;

use crate::control::Control;

/// Inline capacity: hat (2) + shared buttons (8) + kind extras (4)
const SNAPSHOT_CAPACITY: usize = 14;

/// Ordered (control, value) pairs decoded from one report.
///
/// The order is the order the values are written to the virtual device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControlSnapshot {
    values: SmallVec<[(Control, i32); SNAPSHOT_CAPACITY]>,
}

impl ControlSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a control, replacing any earlier value in place
    pub fn set(&mut self, control: Control, value: i32) {
        match self.values.iter_mut().find(|(c, _)| *c == control) {
            Some(entry) => entry.1 = value,
            None => self.values.push((control, value)),
        }
    }

    pub fn set_button(&mut self, control: Control, pressed: bool) {
        self.set(control, i32::from(pressed));
    }

    pub fn get(&self, control: Control) -> Option<i32> {
        self.values
            .iter()
            .find(|(c, _)| *c == control)
            .map(|(_, v)| *v)
    }

    /// Whether a button is reported as pressed
    pub fn is_pressed(&self, control: Control) -> bool {
        self.get(control).is_some_and(|v| v != 0)
    }

    /// Hat position as (x, y)
    pub fn hat(&self) -> Option<(i32, i32)> {
        Some((self.get(Control::HatX)?, self.get(Control::HatY)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Control, i32)> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Controls whose value differs from `other` (or that `other` lacks)
    pub fn diff_count(&self, other: &ControlSnapshot) -> usize {
        self.iter()
            .filter(|(control, value)| other.get(*control) != Some(*value))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut snapshot = ControlSnapshot::new();
        snapshot.set(Control::Tilt, 200);
        snapshot.set_button(Control::ButtonA, true);
        assert_eq!(snapshot.get(Control::Tilt), Some(200));
        assert!(snapshot.is_pressed(Control::ButtonA));
        assert!(!snapshot.is_pressed(Control::ButtonB));
        assert_eq!(snapshot.get(Control::ButtonB), None);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut snapshot = ControlSnapshot::new();
        snapshot.set(Control::HatX, 0);
        snapshot.set(Control::HatY, -1);
        snapshot.set(Control::HatX, 1);
        assert_eq!(snapshot.len(), 2);
        let order: Vec<Control> = snapshot.iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec![Control::HatX, Control::HatY]);
        assert_eq!(snapshot.hat(), Some((1, -1)));
    }

    #[test]
    fn test_diff_count() {
        let mut first = ControlSnapshot::new();
        first.set(Control::HatX, 0);
        first.set(Control::HatY, -1);
        first.set_button(Control::ButtonA, false);

        let mut second = first.clone();
        assert_eq!(second.diff_count(&first), 0);

        second.set(Control::HatX, 1);
        second.set(Control::HatY, 0);
        assert_eq!(second.diff_count(&first), 2);
        assert_eq!(second.diff_count(&ControlSnapshot::new()), 3);
    }

    #[test]
    fn test_empty() {
        let snapshot = ControlSnapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.hat(), None);
    }
}
