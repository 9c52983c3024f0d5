//! Ribbon animator - one animated path with its scroll cursor and claims.
//!
//! Lifecycle:
//! ```text
//! Growing --(trail fully on the path)--> Steady
//!    |                                     |
//!    +--------------(retire)--------------> Retiring
//!
//! any --(cursor - trail_length > total_length)--> Done
//! ```
//! A `Done` ribbon still owns its claims until `cleanup` releases them.

mod frame;
mod oscillator;
mod path;

pub use frame::*;
pub use oscillator::*;
pub use path::*;

use pole_field::{PoleId, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f32::consts::FRAC_PI_2;
use uuid::Uuid;

use crate::config::{RibbonConfig, StimulusConfig};
use crate::constellation::{LetterId, PoleRegistry};

/// Unique identifier for ribbons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RibbonId(pub Uuid);

impl RibbonId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RibbonId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RibbonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RibbonState {
    Growing,
    Steady,
    Retiring,
    Done,
}

impl RibbonState {
    pub fn is_done(&self) -> bool {
        matches!(self, RibbonState::Done)
    }
}

/// What a ribbon displays along its length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RibbonContent {
    pub label: String,
    /// RGBA, each channel in `[0, 1]`.
    pub color: [f32; 4],
}

impl RibbonContent {
    pub fn new(label: impl Into<String>, color: [f32; 4]) -> Self {
        Self {
            label: label.into(),
            color,
        }
    }
}

impl Default for RibbonContent {
    fn default() -> Self {
        Self::new("", [1.0, 1.0, 1.0, 1.0])
    }
}

/// Per-ribbon randomized start parameters.
#[derive(Debug, Clone)]
pub struct RibbonLaunch {
    pub speed: f32,
    pub spawn_delay: u32,
    pub start_frame: u64,
    pub phase: f32,
    pub content: RibbonContent,
}

/// One animated ribbon.
#[derive(Debug, Clone)]
pub struct Ribbon {
    pub id: RibbonId,
    path: RibbonPath,
    claims: HashSet<PoleId>,
    anchor: Vec3,
    entry: PoleId,
    letter: Option<LetterId>,
    content: RibbonContent,

    state: RibbonState,
    cursor: f32,
    speed: f32,
    target_speed: f32,
    start_frame: u64,
    spawn_delay: u32,

    trail_length: f32,
    speed_smoothing: f32,
    retire_speed_factor: f32,

    oscillator: Oscillator,
    shake_dir: Vec3,
    displacement: Vec3,
}

impl Ribbon {
    /// Wrap a committed path. The ribbon takes over the path's claims.
    pub fn new(built: BuiltPath, launch: RibbonLaunch, config: &RibbonConfig) -> Self {
        Self {
            id: RibbonId::new(),
            path: built.path,
            claims: built.claims,
            anchor: built.anchor,
            entry: built.entry,
            letter: None,
            content: launch.content,
            state: RibbonState::Growing,
            cursor: 0.0,
            speed: launch.speed,
            target_speed: launch.speed,
            start_frame: launch.start_frame,
            spawn_delay: launch.spawn_delay,
            trail_length: config.trail_length,
            speed_smoothing: config.speed_smoothing,
            retire_speed_factor: config.retire_speed_factor,
            oscillator: Oscillator::new(0.0, 0.0, launch.phase),
            shake_dir: Vec3::Y_AXIS,
            displacement: Vec3::ZERO,
        }
    }

    /// Record the letter this ribbon threads.
    pub fn with_letter(mut self, letter: LetterId) -> Self {
        self.letter = Some(letter);
        self
    }

    /// Advance one frame and return the resulting state.
    ///
    /// `decay` is the oscillator amplitude factor for this frame.
    pub fn update(&mut self, frame: u64, animate: bool, decay: f32) -> RibbonState {
        if self.state.is_done() {
            return self.state;
        }

        if animate {
            self.speed += (self.target_speed - self.speed) * self.speed_smoothing;
            if frame > self.start_frame + self.spawn_delay as u64 {
                self.cursor += self.speed;
            }
        }

        self.displacement = self.shake_dir * self.oscillator.update();
        self.oscillator.decay(decay);

        if self.cursor - self.trail_length > self.path.total_length() {
            self.state = RibbonState::Done;
        } else if self.state == RibbonState::Growing && self.cursor >= self.trail_length {
            self.state = RibbonState::Steady;
        }
        self.state
    }

    /// Speed the ribbon out. It keeps animating until it completes on its own.
    pub fn retire(&mut self) {
        if self.state.is_done() || self.state == RibbonState::Retiring {
            return;
        }
        self.state = RibbonState::Retiring;
        self.target_speed *= self.retire_speed_factor;
        self.start_frame = 0;
        self.spawn_delay = 0;
    }

    /// Release every claim exactly once. Later calls release nothing.
    pub fn cleanup(&mut self, registry: &mut PoleRegistry) -> usize {
        let released = self.claims.len();
        for id in self.claims.drain() {
            registry.release(id);
        }
        released
    }

    /// Push the oscillator toward the shake energy and turn toward `direction`.
    pub fn apply_shake(&mut self, direction: Vec3, energy: f32, config: &StimulusConfig) {
        let target = energy * config.shake_amplitude;
        if target > self.oscillator.amplitude {
            self.oscillator.approach_amplitude(target, config.response);
            self.oscillator
                .approach_frequency(energy * config.shake_frequency, config.response);
        }
        self.shake_dir = self
            .shake_dir
            .interpolate_to(direction.normalize(), config.response)
            .normalize();
    }

    /// Push the ribbon away from a touch point within `radius` of its anchor.
    ///
    /// Returns whether the touch reached this ribbon.
    pub fn apply_touch(&mut self, point: Vec3, radius: f32, config: &StimulusConfig) -> bool {
        let away = self.anchor - point;
        if away.mag_squared() > radius * radius {
            return false;
        }
        self.shake_dir = self
            .shake_dir
            .interpolate_to(away.normalize(), config.response)
            .normalize();
        self.oscillator.approach_amplitude(radius, config.response);
        self.oscillator.pin(FRAC_PI_2);
        true
    }

    /// Restart the oscillator at a new phase.
    pub fn init_shake(&mut self, phase: f32) {
        self.oscillator.phase = phase.rem_euclid(std::f32::consts::TAU);
    }

    pub fn state(&self) -> RibbonState {
        self.state
    }

    pub fn path(&self) -> &RibbonPath {
        &self.path
    }

    pub fn claims(&self) -> &HashSet<PoleId> {
        &self.claims
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn entry(&self) -> PoleId {
        self.entry
    }

    pub fn letter(&self) -> Option<LetterId> {
        self.letter
    }

    pub fn content(&self) -> &RibbonContent {
        &self.content
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn target_speed(&self) -> f32 {
        self.target_speed
    }

    pub fn displacement(&self) -> Vec3 {
        self.displacement
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    pub fn shake_dir(&self) -> Vec3 {
        self.shake_dir
    }
}
