//! # Pole Field
//!
//! The static and numeric substrate for ribbon synthesis: charged poles in 3D
//! space, glyph definitions with flow hints, external pole placement, and the
//! point charge field line tracer. This crate holds no animation or
//! scheduling logic.

pub mod error;
pub mod field;
pub mod geometry;
pub mod glyph;
pub mod poles;

pub use error::*;
pub use field::*;
pub use geometry::*;
pub use glyph::*;
pub use poles::*;
