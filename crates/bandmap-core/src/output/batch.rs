// Bandmap Event Batching
// Stage events so a frame reaches uinput in a single write

/// Batch of staged output events
///
/// Events are collected between syncs and handed to the device in one
/// call, so readers never observe half a frame.
#[derive(Debug, Clone)]
pub struct EventBatch<T> {
    events: Vec<T>,
}

impl<T> EventBatch<T> {
    /// Create a new empty batch
    pub fn new() -> Self {
        Self::with_capacity(batch_config::DEFAULT_WRITE_BATCH)
    }

    /// Create a batch with a pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, event: T) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.events
    }
}

impl<T> Default for EventBatch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AsRef<[T]> for EventBatch<T> {
    fn as_ref(&self) -> &[T] {
        &self.events
    }
}

/// Batch size configuration
pub mod batch_config {
    /// One frame holds at most every control of a peripheral
    pub const DEFAULT_WRITE_BATCH: usize = 16;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_batch_new() {
        let batch: EventBatch<u32> = EventBatch::new();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn test_event_batch_push_and_slice() {
        let mut batch = EventBatch::new();
        batch.push(1);
        batch.push(2);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_event_batch_clear() {
        let mut batch = EventBatch::new();
        batch.push(1);
        batch.clear();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_batch_capacity_covers_a_frame() {
        use crate::input::PeripheralKind;
        for kind in [PeripheralKind::Guitar, PeripheralKind::Drums] {
            assert!(kind.controls().count() <= batch_config::DEFAULT_WRITE_BATCH);
        }
    }
}
