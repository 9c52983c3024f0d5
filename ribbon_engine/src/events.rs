//! Scheduler events and the observers that receive them.
//!
//! Observers are called from the scheduler thread, outside any scheduler
//! lock, so an observer may call back into the scheduler.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::scheduler::{Message, MessageId};

#[derive(Debug, Clone)]
pub enum ScheduleEvent {
    /// A message became current and should be displayed.
    MessageScheduled(Arc<Message>),

    /// A message was put back in the queue because a higher priority arrived.
    MessagePreempted { id: MessageId },

    /// The queue ran dry after at least one message was shown.
    QueueProcessed,
}

/// Receiver of scheduler events.
pub trait ScheduleObserver: Send + Sync {
    fn on_event(&self, event: &ScheduleEvent);
}

/// Closure-based observer.
pub struct FnObserver<F: Fn(&ScheduleEvent) + Send + Sync>(pub F);

impl<F: Fn(&ScheduleEvent) + Send + Sync> ScheduleObserver for FnObserver<F> {
    fn on_event(&self, event: &ScheduleEvent) {
        (self.0)(event);
    }
}

/// Forwards every event into a channel.
pub struct ChannelObserver {
    sender: parking_lot::Mutex<Sender<ScheduleEvent>>,
}

impl ChannelObserver {
    pub fn new(sender: Sender<ScheduleEvent>) -> Self {
        Self {
            sender: parking_lot::Mutex::new(sender),
        }
    }
}

impl ScheduleObserver for ChannelObserver {
    fn on_event(&self, event: &ScheduleEvent) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.sender.lock().send(event.clone());
    }
}
