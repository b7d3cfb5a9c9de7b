// Bandmap In-Memory Sink
// Records written values and sync frames instead of touching uinput

use super::sink::{ControlSink, SinkError};
use crate::control::Control;

/// Sink that records every write and groups them into frames on `sync`.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pending: Vec<(Control, i32)>,
    frames: Vec<Vec<(Control, i32)>>,
    writes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of `write` calls
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Total number of `sync` calls
    pub fn sync_count(&self) -> usize {
        self.frames.len()
    }

    /// Published frames, oldest first
    pub fn frames(&self) -> &[Vec<(Control, i32)>] {
        &self.frames
    }

    /// Writes staged since the last sync
    pub fn pending(&self) -> &[(Control, i32)] {
        &self.pending
    }

    /// Current value of a control as a consumer would see it,
    /// i.e. only counting synced frames.
    pub fn value(&self, control: Control) -> Option<i32> {
        self.frames
            .iter()
            .flatten()
            .rev()
            .find(|(c, _)| *c == control)
            .map(|(_, v)| *v)
    }
}

impl ControlSink for MemorySink {
    fn write(&mut self, control: Control, value: i32) -> Result<(), SinkError> {
        self.pending.push((control, value));
        self.writes += 1;
        Ok(())
    }

    fn sync(&mut self) -> Result<(), SinkError> {
        self.frames.push(std::mem::take(&mut self.pending));
        Ok(())
    }
}
