//! Flow Scene - the per-frame driver tying constellation, builder and ribbons together.
//!
//! Each call to [`FlowScene::step`] runs one frame:
//! 1. **Handoff**: take a newly scheduled message from the slot and rebuild
//! 2. **Stimuli**: drain queued shake/touch input
//! 3. **Spawn**: try to start new ribbons on the least-used letter
//! 4. **Animate**: advance every live and retiring ribbon
//! 5. **Reap**: release the claims of completed ribbons and drop them
//!
//! All ribbon collections are touched only from the frame thread.

mod stimulus;

pub use stimulus::*;

use pole_field::{Alphabet, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::constellation::{ConstellationSummary, PoleRegistry};
use crate::error::{Result, RibbonError};
use crate::ribbon::{Ribbon, RibbonContent, RibbonFrame, RibbonLaunch, RibbonPathBuilder};
use crate::scheduler::{Message, MessageLine, MessageSlot};

/// What happened during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    pub rebuilt: bool,
    pub spawned: usize,
    pub completed: usize,
    pub live: usize,
    pub retiring: usize,
}

pub struct FlowScene {
    config: EngineConfig,
    registry: PoleRegistry,
    builder: RibbonPathBuilder,
    rng: SmallRng,

    live: Vec<Ribbon>,
    retiring: Vec<Ribbon>,
    frame: u64,
    animate: bool,
    starving: bool,

    contents: Vec<RibbonContent>,
    next_content: usize,

    message: Option<Arc<Message>>,
    slot: Option<MessageSlot>,

    stimuli: StimulusQueue,
    mode: InteractionMode,
    shake: ShakeState,
    touch: TouchState,
}

impl FlowScene {
    /// Create a scene with an empty constellation.
    pub fn new(config: EngineConfig, alphabet: Arc<Alphabet>) -> Result<Self> {
        config.validate()?;

        let rng = match config.poles.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let registry = PoleRegistry::new(alphabet, config.poles.clone(), config.field.bounds);
        let builder = RibbonPathBuilder::new(config.field.clone(), &config.ribbon);

        Ok(Self {
            config,
            registry,
            builder,
            rng,
            live: Vec::new(),
            retiring: Vec::new(),
            frame: 0,
            animate: true,
            starving: false,
            contents: Vec::new(),
            next_content: 0,
            message: None,
            slot: None,
            stimuli: StimulusQueue::new(),
            mode: InteractionMode::Idle,
            shake: ShakeState::default(),
            touch: TouchState::default(),
        })
    }

    /// Take scheduled messages from `slot` at the start of every frame.
    pub fn attach_slot(&mut self, slot: MessageSlot) {
        self.slot = Some(slot);
    }

    /// Contents handed to new ribbons in rotation.
    pub fn set_contents(&mut self, contents: Vec<RibbonContent>) {
        self.contents = contents;
        self.next_content = 0;
    }

    /// Handle for delivering stimuli from other threads.
    pub fn stimuli(&self) -> StimulusQueue {
        self.stimuli.clone()
    }

    pub fn set_animate(&mut self, animate: bool) {
        self.animate = animate;
    }

    /// Display a message, rebuilding the constellation for it.
    pub fn show_message(&mut self, message: Arc<Message>) -> ConstellationSummary {
        let summary = self.rebuild(&message.lines);
        self.message = Some(message);
        summary
    }

    /// Retire every live ribbon, then lay out a new constellation.
    pub fn rebuild(&mut self, lines: &[MessageLine]) -> ConstellationSummary {
        let retired = self.live.len();
        for mut ribbon in self.live.drain(..) {
            ribbon.retire();
            self.retiring.push(ribbon);
        }
        tracing::debug!(retired, retiring = self.retiring.len(), "ribbons retired for rebuild");

        self.frame = 0;
        self.starving = false;
        self.registry.build_constellation(lines, &mut self.rng)
    }

    /// Run one frame.
    pub fn step(&mut self) -> FrameReport {
        let mut report = FrameReport::default();

        if let Some(message) = self.slot.as_ref().and_then(|s| s.take()) {
            self.show_message(message);
            report.rebuilt = true;
        }

        for stimulus in self.stimuli.drain() {
            self.apply_stimulus(stimulus);
        }

        self.frame += 1;
        report.frame = self.frame;

        self.shake.decay(&self.config.stimulus);
        self.touch.update(&self.config.stimulus);
        if self.touch.touching {
            let (focus, radius) = (self.touch.focus, self.config.stimulus.touch_radius);
            for ribbon in self.live.iter_mut().chain(self.retiring.iter_mut()) {
                ribbon.apply_touch(focus, radius, &self.config.stimulus);
            }
        }

        report.spawned = self.spawn();

        let decay = match self.mode {
            InteractionMode::Shake => self.config.stimulus.shake_decay,
            _ => self.config.stimulus.idle_decay,
        };
        let frame = self.frame;
        let animate = self.animate;
        for ribbon in self.live.iter_mut().chain(self.retiring.iter_mut()) {
            ribbon.update(frame, animate, decay);
        }

        report.completed = self.reap();
        report.live = self.live.len();
        report.retiring = self.retiring.len();
        report
    }

    fn spawn(&mut self) -> usize {
        if !self.animate {
            return 0;
        }

        let mut spawned = 0;
        for _ in 0..self.config.ribbon.spawn_per_frame {
            if self.live.len() >= self.config.ribbon.max_count {
                break;
            }
            if !self.rng.gen_bool(self.config.ribbon.spawn_chance as f64) {
                continue;
            }
            match self.try_spawn() {
                Ok(()) => {
                    spawned += 1;
                    self.starving = false;
                }
                Err(RibbonError::Starvation) => {
                    if !self.starving {
                        tracing::debug!(live = self.live.len(), "pole starvation, holding spawns");
                        self.starving = true;
                    }
                    break;
                }
                Err(RibbonError::EmptyGlyph { letter }) => self.registry.disable_letter(letter),
                Err(e) => tracing::trace!(error = %e, "ribbon spawn failed"),
            }
        }
        spawned
    }

    fn try_spawn(&mut self) -> Result<()> {
        let letter = self
            .registry
            .select_least_used_letter()
            .ok_or(RibbonError::Starvation)?;
        let built = self
            .builder
            .create_for_letter(&mut self.registry, letter, Vec3::Y_AXIS)?;

        let content = self.next_content();
        let ribbon_config = &self.config.ribbon;
        let launch = RibbonLaunch {
            speed: self
                .rng
                .gen_range(ribbon_config.min_scroll_speed..=ribbon_config.max_scroll_speed),
            spawn_delay: self
                .rng
                .gen_range(ribbon_config.min_spawn_delay..=ribbon_config.max_spawn_delay),
            start_frame: self.frame,
            phase: self.rng.gen_range(0.0..TAU),
            content,
        };

        let ribbon = Ribbon::new(built, launch, ribbon_config).with_letter(letter);
        tracing::trace!(ribbon = %ribbon.id, letter = %letter, "ribbon spawned");
        self.live.push(ribbon);
        Ok(())
    }

    fn next_content(&mut self) -> RibbonContent {
        if self.contents.is_empty() {
            return RibbonContent::default();
        }
        let content = self.contents[self.next_content % self.contents.len()].clone();
        self.next_content = self.next_content.wrapping_add(1);
        content
    }

    fn reap(&mut self) -> usize {
        let registry = &mut self.registry;
        let mut completed = 0;
        for ribbons in [&mut self.live, &mut self.retiring] {
            ribbons.retain_mut(|ribbon| {
                if ribbon.state().is_done() {
                    ribbon.cleanup(registry);
                    completed += 1;
                    false
                } else {
                    true
                }
            });
        }
        completed
    }

    // =========================================================================
    // STIMULI
    // =========================================================================

    pub fn apply_stimulus(&mut self, stimulus: Stimulus) {
        match stimulus {
            Stimulus::Shake {
                direction,
                strength,
            } => self.shake(direction, strength),
            Stimulus::TouchTarget(point) => self.touch.target = point,
            Stimulus::Touching(touching) => self.set_touching(touching),
            Stimulus::Mode(mode) => self.set_mode(mode),
        }
    }

    /// Feed a raw shake reading and push it to every ribbon.
    pub fn shake(&mut self, direction: Vec3, strength: f32) {
        self.shake.apply(direction, strength, &self.config.stimulus);
        let ShakeState { energy, direction } = self.shake;
        for ribbon in self.live.iter_mut().chain(self.retiring.iter_mut()) {
            ribbon.apply_shake(direction, energy, &self.config.stimulus);
        }
    }

    pub fn set_touch_target(&mut self, point: Vec3) {
        self.touch.target = point;
    }

    pub fn set_touching(&mut self, touching: bool) {
        self.touch.touching = touching;
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        if mode == InteractionMode::Shake && self.mode != InteractionMode::Shake {
            let rng = &mut self.rng;
            for ribbon in self.live.iter_mut().chain(self.retiring.iter_mut()) {
                ribbon.init_shake(rng.gen_range(0.0..TAU));
            }
        }
        self.mode = mode;
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Render data for every live and retiring ribbon.
    pub fn frames(&self) -> Vec<RibbonFrame<'_>> {
        self.live
            .iter()
            .chain(self.retiring.iter())
            .map(|r| r.frame(&self.config.ribbon))
            .collect()
    }

    pub fn live_ribbons(&self) -> &[Ribbon] {
        &self.live
    }

    pub fn retiring_ribbons(&self) -> &[Ribbon] {
        &self.retiring
    }

    pub fn registry(&self) -> &PoleRegistry {
        &self.registry
    }

    pub fn current_message(&self) -> Option<&Arc<Message>> {
        self.message.as_ref()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn shake_state(&self) -> ShakeState {
        self.shake
    }

    pub fn touch_state(&self) -> TouchState {
        self.touch
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixed_pole_config, line, test_alphabet, test_field_config};
    use pole_field::PoleId;
    use std::collections::HashMap;

    fn scene_config() -> EngineConfig {
        let mut config = EngineConfig {
            field: test_field_config(),
            poles: fixed_pole_config(vec![Vec3::new(0.0, 100.0, 0.0), Vec3::new(0.0, -80.0, -80.0)]),
            ..EngineConfig::default()
        };
        config.ribbon.spawn_chance = 1.0;
        config.ribbon.spawn_per_frame = 2;
        config.ribbon.trail_length = 50.0;
        config.ribbon.min_scroll_speed = 20.0;
        config.ribbon.max_scroll_speed = 40.0;
        config.ribbon.max_spawn_delay = 3;
        config
    }

    fn scene_with(text: &str, config: EngineConfig) -> FlowScene {
        let mut scene = FlowScene::new(config, Arc::new(test_alphabet())).unwrap();
        scene.rebuild(&[line(text, Vec3::ZERO, 1.0)]);
        scene
    }

    /// Every resolvable pole's hit count equals the number of ribbons claiming it.
    fn assert_hit_invariant(scene: &FlowScene) {
        let mut expected: HashMap<PoleId, u32> = HashMap::new();
        for ribbon in scene.live_ribbons().iter().chain(scene.retiring_ribbons()) {
            for &id in ribbon.claims() {
                if scene.registry().pole(id).is_some() {
                    *expected.entry(id).or_default() += 1;
                }
            }
        }
        for pole in scene.registry().poles() {
            assert_eq!(
                pole.hit_count,
                expected.get(&pole.id).copied().unwrap_or(0),
                "pole {}",
                pole.id
            );
        }
    }

    #[test]
    fn test_spawns_and_completes_ribbons() {
        let mut scene = scene_with("o", scene_config());

        let mut spawned = 0;
        let mut completed = 0;
        for _ in 0..200 {
            let report = scene.step();
            spawned += report.spawned;
            completed += report.completed;
            assert!(report.live <= scene.config().ribbon.max_count);
        }

        assert!(spawned > 0);
        assert!(completed > 0);
        assert_hit_invariant(&scene);
    }

    #[test]
    fn test_hit_invariant_across_rebuilds() {
        let mut scene = scene_with("o", scene_config());

        for frame in 0..300 {
            if frame == 40 || frame == 150 {
                scene.rebuild(&[line("oo", Vec3::new(-20.0, 0.0, 0.0), 1.0)]);
            }
            scene.step();
            assert_hit_invariant(&scene);
        }
    }

    #[test]
    fn test_rebuild_retires_live_ribbons() {
        let mut scene = scene_with("o", scene_config());
        for _ in 0..5 {
            scene.step();
        }
        let live = scene.live_ribbons().len();
        assert!(live > 0);

        let summary = scene.rebuild(&[line("o", Vec3::ZERO, 1.0)]);
        assert_eq!(summary.generation, 2);
        assert!(scene.live_ribbons().is_empty());
        assert_eq!(scene.retiring_ribbons().len(), live);
        assert!(scene.registry().poles().iter().all(|p| p.hit_count == 0));

        // Retiring ribbons run to completion and release nothing in the new set
        for _ in 0..100 {
            scene.step();
        }
        assert!(scene.retiring_ribbons().is_empty());
        assert_hit_invariant(&scene);
    }

    #[test]
    fn test_starvation_caps_live_ribbons() {
        let mut config = scene_config();
        config.poles.max_letter_hits = 3;
        config.ribbon.trail_length = 1e6;
        let mut scene = scene_with("o", config);

        for _ in 0..20 {
            scene.step();
        }
        assert_eq!(scene.live_ribbons().len(), 3);
        assert!(scene.registry().poles().iter().all(|p| p.hit_count <= 3));
    }

    #[test]
    fn test_saturated_externals_hold_spawns() {
        let mut config = scene_config();
        config.poles.max_external_hits = 2;
        let mut scene = scene_with("o", config);
        let externals = scene.registry.poles_of_class(pole_field::PoleClass::External);
        for _ in 0..2 {
            scene.registry.commit_claims(&externals).unwrap();
        }

        let report = scene.step();

        assert_eq!(report.spawned, 0);
        assert!(scene.starving);
    }

    #[test]
    fn test_empty_glyph_disables_letter() {
        let mut scene = scene_with("e", scene_config());
        let report = scene.step();

        assert_eq!(report.spawned, 0);
        assert!(scene
            .registry()
            .is_letter_disabled(crate::constellation::LetterId(0)));
    }

    #[test]
    fn test_paused_scene_spawns_nothing() {
        let mut scene = scene_with("o", scene_config());
        scene.set_animate(false);
        for _ in 0..10 {
            assert_eq!(scene.step().spawned, 0);
        }
    }

    #[test]
    fn test_slot_message_triggers_rebuild() {
        let mut scene = scene_with("o", scene_config());
        let slot = MessageSlot::new();
        scene.attach_slot(slot.clone());

        slot.publish(Arc::new(
            Message::new("").with_lines(vec![line("vo", Vec3::ZERO, 1.0)]),
        ));
        let report = scene.step();

        assert!(report.rebuilt);
        assert_eq!(scene.registry().letters().len(), 2);
        assert_eq!(scene.current_message().map(|m| m.text()).as_deref(), Some("vo"));
        assert!(!scene.step().rebuilt);
    }

    #[test]
    fn test_shake_reaches_ribbons_and_decays() {
        let mut scene = scene_with("o", scene_config());
        for _ in 0..3 {
            scene.step();
        }

        // No new (unshaken) ribbons this frame
        scene.set_animate(false);
        scene.stimuli().shake(Vec3::X_AXIS, 1200.0);
        scene.step();

        assert!((scene.shake_state().energy - 0.95).abs() < 1e-5);
        assert!(scene
            .live_ribbons()
            .iter()
            .all(|r| r.oscillator().amplitude > 0.0 && r.shake_dir().x > 0.0));
    }

    #[test]
    fn test_entering_shake_mode_randomizes_phase() {
        let mut scene = scene_with("o", scene_config());
        for _ in 0..3 {
            scene.step();
        }
        let before: Vec<f32> = scene.live_ribbons().iter().map(|r| r.oscillator().phase).collect();

        scene.apply_stimulus(Stimulus::Mode(InteractionMode::Shake));
        let after: Vec<f32> = scene.live_ribbons().iter().map(|r| r.oscillator().phase).collect();

        assert_eq!(scene.mode(), InteractionMode::Shake);
        assert_ne!(before, after);
    }

    #[test]
    fn test_touch_pushes_nearby_ribbons() {
        let mut scene = scene_with("o", scene_config());
        for _ in 0..3 {
            scene.step();
        }

        scene.set_animate(false);
        scene.set_touch_target(Vec3::new(0.0, 0.0, -50.0));
        scene.set_touching(true);
        scene.step();

        assert!(scene
            .live_ribbons()
            .iter()
            .all(|r| r.oscillator().frequency == 0.0 && r.oscillator().amplitude > 0.0));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = scene_config();
        config.ribbon.spawn_chance = 2.0;
        assert!(FlowScene::new(config, Arc::new(test_alphabet())).is_err());
    }
}
