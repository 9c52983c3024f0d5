//! Message Scheduler - decides which message holds the display.
//!
//! The decision logic lives in [`SchedulerCore`], which takes the current
//! time as a parameter. [`MessageScheduler`] runs the core on a background
//! thread that polls at a fixed interval, hands promoted messages to the
//! frame loop through a [`MessageSlot`] and notifies observers.

mod message;
mod queue;
mod slot;

pub use message::*;
pub use queue::*;
pub use slot::*;

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::events::{ScheduleEvent, ScheduleObserver};

/// Queue, history and current message, without any threading.
#[derive(Debug)]
pub struct SchedulerCore {
    config: SchedulerConfig,
    queue: MessageQueue,
    recent: VecDeque<Message>,
    current: Option<Arc<Message>>,
    processing: bool,
}

impl SchedulerCore {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            queue: MessageQueue::new(),
            recent: VecDeque::new(),
            current: None,
            processing: true,
        }
    }

    /// Queue a message at its own priority and remember it for replay.
    pub fn submit(&mut self, mut message: Message) -> MessageId {
        message.activated_at = None;
        let id = message.id;
        self.remember(message.clone());
        self.queue.push(message);
        id
    }

    /// Make `message` current right away, bypassing the queue.
    pub fn set_default_message(&mut self, mut message: Message, now: Instant) -> Vec<ScheduleEvent> {
        message.activated_at = None;
        self.remember(message.clone());
        vec![self.activate(message, now)]
    }

    /// Re-queue every remembered message one priority lower (floored at 0).
    pub fn replay_recent(&mut self) -> usize {
        for message in self.recent.iter_mut() {
            message.priority = message.priority.saturating_sub(1);
            self.queue.push(message.clone());
        }
        self.recent.len()
    }

    /// Pause or resume promotion. The current message stays current.
    pub fn set_processing(&mut self, enabled: bool) {
        self.processing = enabled;
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Advance the schedule to `now`.
    ///
    /// Promotes the next message when the current one has expired, or
    /// preempts it when a strictly higher priority is waiting. Reports
    /// `QueueProcessed` once when the last message expires with nothing queued.
    pub fn poll(&mut self, now: Instant) -> Vec<ScheduleEvent> {
        let mut events = Vec::new();
        if !self.processing {
            return events;
        }

        match self.current.clone() {
            Some(current) if !current.is_expired(now) => {
                let outranked = self
                    .queue
                    .peek_priority()
                    .is_some_and(|p| p > current.priority);
                if !outranked {
                    return events;
                }
                let mut requeued = (*current).clone();
                requeued.activated_at = None;
                self.queue.push(requeued);
                events.push(ScheduleEvent::MessagePreempted { id: current.id });
            }
            Some(_) => {
                if self.queue.is_empty() {
                    self.current = None;
                    events.push(ScheduleEvent::QueueProcessed);
                    return events;
                }
            }
            None => {}
        }

        if let Some(next) = self.queue.pop() {
            events.push(self.activate(next, now));
        }
        events
    }

    fn activate(&mut self, mut message: Message, now: Instant) -> ScheduleEvent {
        message.activated_at = Some(now);
        let message = Arc::new(message);
        self.current = Some(Arc::clone(&message));
        ScheduleEvent::MessageScheduled(message)
    }

    fn remember(&mut self, message: Message) {
        self.recent.push_back(message);
        while self.recent.len() > self.config.max_recent {
            self.recent.pop_front();
        }
    }

    pub fn current(&self) -> Option<Arc<Message>> {
        self.current.clone()
    }

    /// Snapshot of the replay buffer, oldest first.
    pub fn recent_messages(&self) -> Vec<Message> {
        self.recent.iter().cloned().collect()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

struct Shared {
    core: Mutex<SchedulerCore>,
    observers: Mutex<Vec<Arc<dyn ScheduleObserver>>>,
    slot: MessageSlot,
    running: AtomicBool,
}

impl Shared {
    fn tick(&self, now: Instant) {
        let events = self.core.lock().poll(now);
        self.dispatch(events);
    }

    fn dispatch(&self, events: Vec<ScheduleEvent>) {
        if events.is_empty() {
            return;
        }
        let observers = self.observers.lock().clone();
        for event in events {
            match &event {
                ScheduleEvent::MessageScheduled(message) => {
                    tracing::info!(message = %message.id, priority = message.priority, "message scheduled");
                    self.slot.publish(Arc::clone(message));
                }
                ScheduleEvent::MessagePreempted { id } => {
                    tracing::debug!(message = %id, "message preempted");
                }
                ScheduleEvent::QueueProcessed => {
                    tracing::info!("message queue processed");
                }
            }
            for observer in &observers {
                observer.on_event(&event);
            }
        }
    }
}

/// Background scheduler feeding the frame loop.
pub struct MessageScheduler {
    shared: Arc<Shared>,
    config: SchedulerConfig,
    handle: Option<JoinHandle<()>>,
}

impl MessageScheduler {
    /// Create a stopped scheduler.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(SchedulerCore::new(config.clone())),
                observers: Mutex::new(Vec::new()),
                slot: MessageSlot::new(),
                running: AtomicBool::new(false),
            }),
            config,
            handle: None,
        }
    }

    /// Start the polling thread. Does nothing if already running.
    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        self.shared.running.store(true, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        let handle = thread::Builder::new()
            .name("message-scheduler".into())
            .spawn(move || {
                while shared.running.load(Ordering::SeqCst) {
                    shared.tick(Instant::now());
                    thread::park_timeout(interval);
                }
            });

        match handle {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(interval_ms = self.config.poll_interval_ms, "scheduler started");
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Stop the polling thread and wait for it to exit.
    pub fn shutdown(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                tracing::warn!("scheduler thread panicked");
            }
            tracing::info!("scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn add_observer(&self, observer: Arc<dyn ScheduleObserver>) {
        self.shared.observers.lock().push(observer);
    }

    /// Queue a message and wake the polling thread.
    pub fn submit(&self, message: Message) -> MessageId {
        let id = self.shared.core.lock().submit(message);
        self.wake();
        id
    }

    /// Queue laid-out text with the default submission priority and TTL.
    pub fn submit_lines(&self, lines: Vec<MessageLine>) -> MessageId {
        let message = Message::new("")
            .with_lines(lines)
            .with_priority(self.config.submit_priority)
            .with_ttl(Duration::from_millis(self.config.default_ttl_ms));
        self.submit(message)
    }

    pub fn set_default_message(&self, message: Message) {
        let events = self.shared.core.lock().set_default_message(message, Instant::now());
        self.shared.dispatch(events);
    }

    pub fn replay_recent(&self) -> usize {
        let count = self.shared.core.lock().replay_recent();
        tracing::info!(count, "replaying recent messages");
        self.wake();
        count
    }

    pub fn enable_process_queue(&self, enabled: bool) {
        self.shared.core.lock().set_processing(enabled);
        tracing::info!(enabled, "message processing toggled");
        if enabled {
            self.wake();
        }
    }

    /// Run one poll on the calling thread.
    pub fn poll_now(&self) {
        self.shared.tick(Instant::now());
    }

    /// Handle for the frame loop to take promoted messages from.
    pub fn slot(&self) -> MessageSlot {
        self.shared.slot.clone()
    }

    pub fn current(&self) -> Option<Arc<Message>> {
        self.shared.core.lock().current()
    }

    pub fn recent_messages(&self) -> Vec<Message> {
        self.shared.core.lock().recent_messages()
    }

    fn wake(&self) {
        if let Some(handle) = &self.handle {
            handle.thread().unpark();
        }
    }
}

impl Drop for MessageScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
