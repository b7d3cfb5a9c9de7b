// Bandmap Emission Tracker
// Diff-based emission with one sync per changed frame

use super::sink::{ControlSink, SinkError};
use super::state::EmissionState;
use crate::protocol::ControlSnapshot;

/// Writes only changed controls and batches them into one sync.
///
/// `apply` may be called any number of times between flushes; `flush`
/// publishes everything written since the last flush as a single frame.
#[derive(Debug, Default)]
pub struct EmissionTracker {
    state: EmissionState,
    dirty: bool,
}

impl EmissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every control of `snapshot` whose value differs from the last
    /// emitted one.
    ///
    /// Returns the number of writes issued. A failed write leaves that
    /// control's recorded value untouched.
    pub fn apply<S: ControlSink>(
        &mut self,
        sink: &mut S,
        snapshot: &ControlSnapshot,
    ) -> Result<usize, SinkError> {
        let mut written = 0;
        for (control, value) in snapshot.iter() {
            if !self.state.differs(control, value) {
                continue;
            }
            sink.write(control, value)?;
            self.state.record(control, value);
            self.dirty = true;
            written += 1;
        }
        Ok(written)
    }

    /// Issue one sync iff anything was written since the last flush.
    ///
    /// Returns whether a sync was issued.
    pub fn flush<S: ControlSink>(&mut self, sink: &mut S) -> Result<bool, SinkError> {
        if !self.dirty {
            return Ok(false);
        }
        sink.sync()?;
        self.dirty = false;
        Ok(true)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn state(&self) -> &EmissionState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Control;
    use crate::output::MemorySink;

    fn hat_snapshot(x: i32, y: i32) -> ControlSnapshot {
        let mut snapshot = ControlSnapshot::new();
        snapshot.set(Control::HatX, x);
        snapshot.set(Control::HatY, y);
        snapshot.set_button(Control::ButtonA, false);
        snapshot
    }

    #[test]
    fn test_first_apply_writes_everything() {
        let mut tracker = EmissionTracker::new();
        let mut sink = MemorySink::new();
        let written = tracker.apply(&mut sink, &hat_snapshot(0, 0)).unwrap();
        assert_eq!(written, 3);
        assert!(tracker.is_dirty());
    }

    #[test]
    fn test_second_apply_writes_only_changes() {
        let mut tracker = EmissionTracker::new();
        let mut sink = MemorySink::new();
        tracker.apply(&mut sink, &hat_snapshot(0, -1)).unwrap();
        tracker.flush(&mut sink).unwrap();

        let written = tracker.apply(&mut sink, &hat_snapshot(1, -1)).unwrap();
        assert_eq!(written, 1);
        assert_eq!(sink.write_count(), 4);
        assert_eq!(sink.pending(), &[(Control::HatX, 1)]);
    }

    #[test]
    fn test_flush_without_changes_is_silent() {
        let mut tracker = EmissionTracker::new();
        let mut sink = MemorySink::new();
        assert!(!tracker.flush(&mut sink).unwrap());

        tracker.apply(&mut sink, &hat_snapshot(0, 0)).unwrap();
        assert!(tracker.flush(&mut sink).unwrap());
        tracker.apply(&mut sink, &hat_snapshot(0, 0)).unwrap();
        assert!(!tracker.flush(&mut sink).unwrap());
        assert_eq!(sink.sync_count(), 1);
    }

    #[test]
    fn test_multiple_applies_share_one_sync() {
        let mut tracker = EmissionTracker::new();
        let mut sink = MemorySink::new();
        tracker.apply(&mut sink, &hat_snapshot(0, 0)).unwrap();
        tracker.apply(&mut sink, &hat_snapshot(1, 1)).unwrap();
        tracker.flush(&mut sink).unwrap();
        assert_eq!(sink.sync_count(), 1);
        assert_eq!(sink.frames()[0].len(), 5);
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_state_tracks_written_values() {
        let mut tracker = EmissionTracker::new();
        let mut sink = MemorySink::new();
        tracker.apply(&mut sink, &hat_snapshot(-1, 1)).unwrap();
        assert_eq!(tracker.state().last_emitted(Control::HatX), Some(-1));
        assert_eq!(tracker.state().last_emitted(Control::HatY), Some(1));
    }
}
