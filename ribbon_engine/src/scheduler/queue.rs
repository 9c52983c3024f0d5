//! Max-priority message queue, first-in-first-out among equal priorities.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::Message;

#[derive(Debug)]
struct QueuedMessage {
    sequence: u64,
    message: Message,
}

impl PartialEq for QueuedMessage {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedMessage {}

impl PartialOrd for QueuedMessage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedMessage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.message
            .priority
            .cmp(&other.message.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Debug, Default)]
pub struct MessageQueue {
    heap: BinaryHeap<QueuedMessage>,
    next_sequence: u64,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(QueuedMessage { sequence, message });
    }

    /// Remove the highest-priority message, oldest first on ties.
    pub fn pop(&mut self) -> Option<Message> {
        self.heap.pop().map(|q| q.message)
    }

    pub fn peek_priority(&self) -> Option<u32> {
        self.heap.peek().map(|q| q.message.priority)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
