//! Message definitions - text to display with its pre-computed line layout.

use pole_field::Vec3;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Unique identifier for messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Create a new random message ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One laid-out line of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageLine {
    pub text: String,

    /// World position of the line's left edge.
    pub offset: Vec3,

    /// Glyph scale for this line.
    pub scale: f32,
}

impl MessageLine {
    pub fn new(text: impl Into<String>, offset: Vec3, scale: f32) -> Self {
        Self {
            text: text.into(),
            offset,
            scale,
        }
    }
}

/// A message waiting for or holding the display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,

    /// Line placements; word wrapping happens before submission.
    pub lines: Vec<MessageLine>,

    /// How long the message holds the display once promoted.
    pub ttl: Duration,

    /// Higher is served first.
    pub priority: u32,

    /// Set when the message becomes current.
    #[serde(skip)]
    pub activated_at: Option<Instant>,
}

impl Message {
    /// Create a message with a single line at the origin.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            lines: vec![MessageLine::new(text, Vec3::ZERO, 1.0)],
            ttl: Duration::from_secs(10),
            priority: 0,
            activated_at: None,
        }
    }

    /// Replace the line layout.
    pub fn with_lines(mut self, lines: Vec<MessageLine>) -> Self {
        self.lines = lines;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Full text of all lines joined by newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether the display time has run out at `now`. Inactive messages never expire.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.activated_at
            .is_some_and(|at| now.saturating_duration_since(at) >= self.ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_builder() {
        let msg = Message::new("hello")
            .with_priority(3)
            .with_ttl(Duration::from_millis(500));

        assert_eq!(msg.priority, 3);
        assert_eq!(msg.ttl, Duration::from_millis(500));
        assert_eq!(msg.text(), "hello");
        assert!(msg.activated_at.is_none());
    }

    #[test]
    fn test_multi_line_text() {
        let msg = Message::new("").with_lines(vec![
            MessageLine::new("top", Vec3::new(0.0, 0.0, 50.0), 1.0),
            MessageLine::new("bottom", Vec3::ZERO, 0.5),
        ]);
        assert_eq!(msg.text(), "top\nbottom");
    }

    #[test]
    fn test_expiry() {
        let start = Instant::now();
        let mut msg = Message::new("x").with_ttl(Duration::from_secs(2));
        assert!(!msg.is_expired(start + Duration::from_secs(100)));

        msg.activated_at = Some(start);
        assert!(!msg.is_expired(start + Duration::from_secs(1)));
        assert!(msg.is_expired(start + Duration::from_secs(2)));
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(MessageId::new(), MessageId::new());
    }
}
