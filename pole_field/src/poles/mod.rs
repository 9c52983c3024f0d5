//! Pole definitions - the charged anchors field lines run between.

mod placement;

pub use placement::*;

use serde::{Deserialize, Serialize};

use crate::geometry::{Vec2, Vec3};

/// Stable handle for a pole inside one constellation.
///
/// The generation changes on every rebuild so handles held across a rebuild
/// never alias poles of the new constellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoleId {
    pub generation: u32,
    pub index: u32,
}

impl PoleId {
    pub fn new(generation: u32, index: u32) -> Self {
        Self { generation, index }
    }

    /// Position of the pole in its arena.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl std::fmt::Display for PoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.generation, self.index)
    }
}

/// Role a pole plays in the constellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoleClass {
    /// Anchor outside any letter, used as ribbon endpoints.
    External,
    /// Part of a letter's outer silhouette.
    Outline,
    /// Part of a letter's inner counter-shape.
    Inline,
    /// Not part of the current constellation.
    Unknown,
}

/// A point charge in 3D space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pole {
    pub id: PoleId,
    pub position: Vec3,
    /// Normalized XZ projection of the position, used for turn angles.
    pub bearing: Vec2,
    pub charge: f32,
    pub class: PoleClass,
    /// Number of live ribbons currently claiming this pole.
    pub hit_count: u32,
    /// Hit clock value of the most recent claim (0 = never hit).
    pub last_hit: u64,
}

impl Pole {
    /// Create a new pole at the given position and charge.
    pub fn new(id: PoleId, position: Vec3, charge: f32, class: PoleClass) -> Self {
        Self {
            id,
            position,
            bearing: position.to_2d_xz().normalize(),
            charge,
            class,
            hit_count: 0,
            last_hit: 0,
        }
    }

    /// Sign of the charge as `-1.0`, `0.0` or `1.0`.
    pub fn sign(&self) -> f32 {
        if self.charge > 0.0 {
            1.0
        } else if self.charge < 0.0 {
            -1.0
        } else {
            0.0
        }
    }

    /// Register a new claim stamped with the given hit clock value.
    pub fn record_hit(&mut self, clock: u64) {
        self.hit_count += 1;
        self.last_hit = clock;
    }

    /// Drop one claim. Never goes below zero.
    pub fn release_hit(&mut self) {
        self.hit_count = self.hit_count.saturating_sub(1);
    }

    /// Check if the pole is still below a hit-count ceiling.
    pub fn is_available(&self, max_hit_count: u32) -> bool {
        self.hit_count < max_hit_count
    }
}
