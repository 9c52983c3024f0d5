//! # Ribbon Engine
//!
//! The dynamic half of ribbon synthesis. This crate builds a pole
//! constellation from `pole_field` glyph data, threads animated ribbons
//! through the letters of the current message, and schedules which message
//! is on display.
//!
//! ## Core Components
//!
//! - **constellation**: Pole ownership, letter instances and flow lookups
//! - **ribbon**: Path construction, the ribbon animator and render frames
//! - **scheduler**: Priority message queue on a background thread
//! - **scene**: Per-frame driver, spawning and stimulus handling
//! - **events**: Scheduler events and observers
//!
//! ## Design Philosophy
//!
//! - **Handles, not references**: Ribbons refer to poles by generation-tagged handles
//! - **Commit on success**: A failed path attempt leaves no trace in the hit counts
//! - **Single-threaded core**: Only the scheduler runs off the frame thread

pub mod config;
pub mod constellation;
pub mod error;
pub mod events;
pub mod ribbon;
pub mod scene;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use config::*;
pub use constellation::*;
pub use error::*;
pub use events::*;
pub use ribbon::*;
pub use scene::*;
pub use scheduler::*;
