//! External stimuli: shake and touch input, and their global state.

use parking_lot::Mutex;
use pole_field::Vec3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::StimulusConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionMode {
    #[default]
    Idle,
    Shake,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stimulus {
    /// Raw shake reading; `strength` is in device units.
    Shake { direction: Vec3, strength: f32 },
    TouchTarget(Vec3),
    Touching(bool),
    Mode(InteractionMode),
}

/// Inbox for stimuli arriving off the frame thread, drained once per frame.
#[derive(Debug, Clone, Default)]
pub struct StimulusQueue {
    inbox: Arc<Mutex<Vec<Stimulus>>>,
}

impl StimulusQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, stimulus: Stimulus) {
        self.inbox.lock().push(stimulus);
    }

    pub fn shake(&self, direction: Vec3, strength: f32) {
        self.push(Stimulus::Shake {
            direction,
            strength,
        });
    }

    pub fn drain(&self) -> Vec<Stimulus> {
        std::mem::take(&mut *self.inbox.lock())
    }
}

/// Global shake energy and direction shared by every ribbon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeState {
    pub energy: f32,
    pub direction: Vec3,
}

impl Default for ShakeState {
    fn default() -> Self {
        Self {
            energy: 0.0,
            direction: Vec3::Y_AXIS,
        }
    }
}

impl ShakeState {
    /// Fold a raw reading into the global state.
    pub fn apply(&mut self, direction: Vec3, strength: f32, config: &StimulusConfig) {
        let energy = (strength / config.shake_max_energy).clamp(0.0, 1.0);
        if energy > self.energy {
            self.energy = energy;
            self.direction = self
                .direction
                .interpolate_to(direction.normalize(), config.shake_dir_smoothing)
                .normalize();
        } else {
            self.direction = self
                .direction
                .interpolate_to(Vec3::Y_AXIS, config.idle_dir_drift)
                .normalize();
        }
    }

    pub fn decay(&mut self, config: &StimulusConfig) {
        self.energy *= config.shake_energy_decay;
    }
}

/// Smoothed touch focus.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TouchState {
    pub target: Vec3,
    pub focus: Vec3,
    pub touching: bool,
}

impl TouchState {
    /// Move the focus toward the target by one frame.
    pub fn update(&mut self, config: &StimulusConfig) {
        self.focus = self.focus.interpolate_to(self.target, config.touch_smoothing);
    }
}
