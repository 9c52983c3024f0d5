//! Single-slot handoff from the scheduler thread to the frame loop.
//!
//! The writer overwrites, the reader takes; only the latest message survives.

use parking_lot::Mutex;
use std::sync::Arc;

use super::Message;

#[derive(Debug, Clone, Default)]
pub struct MessageSlot {
    inner: Arc<Mutex<Option<Arc<Message>>>>,
}

impl MessageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is pending with `message`.
    pub fn publish(&self, message: Arc<Message>) {
        *self.inner.lock() = Some(message);
    }

    /// Take the pending message, leaving the slot empty.
    pub fn take(&self) -> Option<Arc<Message>> {
        self.inner.lock().take()
    }

    pub fn is_pending(&self) -> bool {
        self.inner.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_wins() {
        let slot = MessageSlot::new();
        slot.publish(Arc::new(Message::new("first")));
        slot.publish(Arc::new(Message::new("second")));

        assert!(slot.is_pending());
        assert_eq!(slot.take().map(|m| m.text()), Some("second".to_string()));
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_clones_share_the_slot() {
        let writer = MessageSlot::new();
        let reader = writer.clone();

        let handle = std::thread::spawn(move || writer.publish(Arc::new(Message::new("x"))));
        handle.join().unwrap();

        assert!(reader.take().is_some());
    }
}
