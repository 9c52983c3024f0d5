//! Engine configuration.
//!
//! Every section has production defaults and can be overridden from TOML.
//! A configuration is validated once and then shared immutably.

use pole_field::{FieldConfig, PlacementKind, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::RibbonError;

/// Pole constellation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoleConfig {
    /// Number of strategy-placed external poles.
    pub count: usize,

    /// Charge magnitude of letter poles.
    pub max_charge: f32,

    /// External charge is `-max_charge * |position| / charge_falloff`.
    pub charge_falloff: f32,

    /// Hit-count ceiling for letter poles.
    pub max_letter_hits: u32,

    /// Hit-count ceiling for external poles.
    pub max_external_hits: u32,

    /// Normalized minimum |y| and |z| for external poles.
    pub exclusion: Vec3,

    pub placement: PlacementKind,

    /// Additional fixed external pole positions (world space).
    pub custom: Vec<Vec3>,

    /// Seed for all scene randomness. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for PoleConfig {
    fn default() -> Self {
        Self {
            count: 60,
            max_charge: 20.0,
            charge_falloff: 200.0,
            max_letter_hits: 30,
            max_external_hits: 60,
            exclusion: Vec3::new(0.0, 0.33, 0.5),
            placement: PlacementKind::RandomX,
            custom: Vec::new(),
            seed: None,
        }
    }
}

/// Ribbon geometry, spawning and animation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RibbonConfig {
    pub width: f32,

    /// Width multiplier for vertices inside the letter.
    pub letter_scale: f32,

    /// Scroll speed bounds in arc-length units per frame.
    pub min_scroll_speed: f32,
    pub max_scroll_speed: f32,

    /// Fraction of the speed gap closed each frame.
    pub speed_smoothing: f32,

    /// Length of the visible text window in arc-length units.
    pub trail_length: f32,

    pub max_count: usize,
    pub spawn_per_frame: u32,
    pub spawn_chance: f32,

    /// Spawn delay bounds in frames.
    pub min_spawn_delay: u32,
    pub max_spawn_delay: u32,

    /// Extra passes through the letter after the first.
    pub loop_count: u32,

    /// Number of vertices over which alpha ramps at each end of the window.
    pub fade_vertices: usize,

    /// Target speed multiplier applied on retirement.
    pub retire_speed_factor: f32,

    /// Safety cap on letter walk hops.
    pub max_walk_steps: usize,
}

impl Default for RibbonConfig {
    fn default() -> Self {
        Self {
            width: 12.0,
            letter_scale: 1.75,
            min_scroll_speed: 2.0,
            max_scroll_speed: 8.0,
            speed_smoothing: 0.02,
            trail_length: 600.0,
            max_count: 500,
            spawn_per_frame: 1,
            spawn_chance: 0.5,
            min_spawn_delay: 0,
            max_spawn_delay: 60,
            loop_count: 2,
            fade_vertices: 10,
            retire_speed_factor: 5.0,
            max_walk_steps: 256,
        }
    }
}

/// Shake and touch response settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StimulusConfig {
    /// Raw shake strength mapped to energy 1.0.
    pub shake_max_energy: f32,

    /// Per-frame decay of the global shake energy.
    pub shake_energy_decay: f32,

    /// Oscillator amplitude at full shake energy.
    pub shake_amplitude: f32,

    /// Oscillator frequency (radians per frame) at full shake energy.
    pub shake_frequency: f32,

    /// Fraction of the gap closed per stimulus for amplitude, frequency and direction.
    pub response: f32,

    pub shake_dir_smoothing: f32,
    pub idle_dir_drift: f32,

    pub touch_radius: f32,
    pub touch_smoothing: f32,

    /// Per-frame oscillator decay outside and inside shake mode.
    pub idle_decay: f32,
    pub shake_decay: f32,
}

impl Default for StimulusConfig {
    fn default() -> Self {
        Self {
            shake_max_energy: 1200.0,
            shake_energy_decay: 0.95,
            shake_amplitude: 500.0,
            shake_frequency: std::f32::consts::PI * 0.03,
            response: 0.15,
            shake_dir_smoothing: 0.25,
            idle_dir_drift: 0.05,
            touch_radius: 200.0,
            touch_smoothing: 0.05,
            idle_decay: 0.9,
            shake_decay: 0.99,
        }
    }
}

/// Message scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub poll_interval_ms: u64,

    /// Size of the recent-message ring buffer.
    pub max_recent: usize,

    pub default_ttl_ms: u64,

    /// Priority given to newly submitted messages.
    pub submit_priority: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            max_recent: 20,
            default_ttl_ms: 10_000,
            submit_priority: 10,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub field: FieldConfig,
    pub poles: PoleConfig,
    pub ribbon: RibbonConfig,
    pub stimulus: StimulusConfig,
    pub scheduler: SchedulerConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML configuration. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, RibbonError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), RibbonError> {
        let invalid = |msg: &str| Err(RibbonError::invalid_config(msg));

        if self.field.step_length <= 0.0 {
            return invalid("field.step_length must be > 0");
        }
        if self.field.seed_radius <= 0.0 {
            return invalid("field.seed_radius must be > 0");
        }
        if self.field.capture_radius <= 0.0 {
            return invalid("field.capture_radius must be > 0");
        }
        if self.field.max_iterations == 0 {
            return invalid("field.max_iterations must be > 0");
        }
        if self.poles.max_letter_hits == 0 || self.poles.max_external_hits == 0 {
            return invalid("pole hit ceilings must be > 0");
        }
        if self.poles.charge_falloff <= 0.0 {
            return invalid("poles.charge_falloff must be > 0");
        }
        if self.ribbon.min_scroll_speed > self.ribbon.max_scroll_speed {
            return invalid("ribbon.min_scroll_speed exceeds max_scroll_speed");
        }
        if self.ribbon.min_spawn_delay > self.ribbon.max_spawn_delay {
            return invalid("ribbon.min_spawn_delay exceeds max_spawn_delay");
        }
        if self.ribbon.trail_length <= 0.0 {
            return invalid("ribbon.trail_length must be > 0");
        }
        if self.stimulus.shake_max_energy <= 0.0 {
            return invalid("stimulus.shake_max_energy must be > 0");
        }
        for (name, value) in [
            ("stimulus.idle_decay", self.stimulus.idle_decay),
            ("stimulus.shake_decay", self.stimulus.shake_decay),
            ("stimulus.shake_energy_decay", self.stimulus.shake_energy_decay),
            ("ribbon.spawn_chance", self.ribbon.spawn_chance),
            ("ribbon.speed_smoothing", self.ribbon.speed_smoothing),
            ("stimulus.response", self.stimulus.response),
            ("stimulus.touch_smoothing", self.stimulus.touch_smoothing),
            ("stimulus.shake_dir_smoothing", self.stimulus.shake_dir_smoothing),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(&format!("{} must be in [0, 1]", name));
            }
        }
        Ok(())
    }
}
