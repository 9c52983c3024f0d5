//! Pole Registry - owns every pole and letter instance of the current message.
//!
//! A constellation is built in one destructive pass:
//! 1. **Reset**: drop all poles and letters, bump the handle generation
//! 2. **External poles**: place them with the configured strategy, then add
//!    the fixed custom positions
//! 3. **Letters**: lay out each message line glyph by glyph, creating outline
//!    and inline poles and recording a handle -> letter lookup for each
//!
//! Ribbons refer to poles only through [`PoleId`] handles. Handles from an
//! older generation never resolve, so ribbons that outlive a rebuild can
//! still release their claims without touching the new pole set.

mod letter;

pub use letter::*;

use pole_field::{Aabb, Alphabet, Glyph, PlacementStrategy, Pole, PoleClass, PoleId, Vec3};
use rand::RngCore;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::PoleConfig;
use crate::error::{Result, RibbonError};
use crate::scheduler::MessageLine;

/// Back-reference from a pole handle to its place in a letter.
#[derive(Debug, Clone, Copy)]
struct LetterSlot {
    letter: LetterId,
    kind: PathKind,
    index: usize,
}

/// Counts reported after a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConstellationSummary {
    pub generation: u32,
    pub external: usize,
    pub outline: usize,
    pub inline: usize,
    pub letters: usize,
}

/// Owner of the pole arena and the letter instances built on it.
pub struct PoleRegistry {
    config: PoleConfig,
    bounds: Aabb,
    alphabet: Arc<Alphabet>,
    strategy: Box<dyn PlacementStrategy>,

    generation: u32,
    poles: Vec<Pole>,
    slots: Vec<Option<LetterSlot>>,
    letters: Vec<LetterInstance>,
    disabled: HashSet<LetterId>,

    /// Monotonic stamp for `Pole::last_hit`.
    hit_clock: u64,
}

impl PoleRegistry {
    /// Create an empty registry using the configured placement strategy.
    pub fn new(alphabet: Arc<Alphabet>, config: PoleConfig, bounds: Aabb) -> Self {
        let strategy = config.placement.strategy();
        Self {
            config,
            bounds,
            alphabet,
            strategy,
            generation: 0,
            poles: Vec::new(),
            slots: Vec::new(),
            letters: Vec::new(),
            disabled: HashSet::new(),
            hit_clock: 0,
        }
    }

    /// Replace the external pole placement strategy.
    pub fn with_strategy(mut self, strategy: Box<dyn PlacementStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Rebuild the whole constellation for a message.
    ///
    /// Every ribbon holding claims on the previous pole set must already have
    /// been retired; its handles stop resolving once this returns.
    pub fn build_constellation(
        &mut self,
        lines: &[MessageLine],
        rng: &mut dyn RngCore,
    ) -> ConstellationSummary {
        self.generation = self.generation.wrapping_add(1);
        self.poles.clear();
        self.slots.clear();
        self.letters.clear();
        self.disabled.clear();

        let count = self.config.count;
        let placed: Vec<Vec3> = (0..count)
            .map(|i| {
                self.strategy
                    .create_position(i, count, self.config.exclusion, rng)
                    .scale_by(self.bounds.extent)
            })
            .collect();
        for position in placed.into_iter().chain(self.config.custom.clone()) {
            self.add_external(position);
        }

        let alphabet = Arc::clone(&self.alphabet);
        let mut unknown = HashSet::new();
        for line in lines {
            let mut offset = line.offset;
            let mut prev: Option<&Arc<Glyph>> = None;
            for c in line.text.chars() {
                let Some(glyph) = alphabet.get(c) else {
                    if !c.is_whitespace() && unknown.insert(c) {
                        tracing::warn!(character = %c, "no glyph for character, skipping");
                    }
                    continue;
                };
                offset.x += glyph.kerning(prev.map(|g| g.as_ref())) * line.scale;
                self.place_letter(glyph, offset, line.scale);
                offset.x += glyph.width * line.scale;
                prev = Some(glyph);
            }
        }

        let summary = self.summary();
        tracing::info!(
            generation = summary.generation,
            external = summary.external,
            outline = summary.outline,
            inline = summary.inline,
            letters = summary.letters,
            "constellation rebuilt"
        );
        summary
    }

    fn add_external(&mut self, position: Vec3) -> PoleId {
        let charge = -self.config.max_charge * position.magnitude() / self.config.charge_falloff;
        self.push_pole(position, charge, PoleClass::External, None)
    }

    fn place_letter(&mut self, glyph: &Arc<Glyph>, offset: Vec3, scale: f32) {
        if glyph.outline.is_empty() && !glyph.has_inline() {
            // Spacing glyph: advances the layout only.
            return;
        }

        let id = LetterId(self.letters.len());
        let mut letter = LetterInstance::new(id, Arc::clone(glyph), offset);
        let charge = self.config.max_charge;

        for (kind, class) in [
            (PathKind::Outline, PoleClass::Outline),
            (PathKind::Inline, PoleClass::Inline),
        ] {
            let path = match kind {
                PathKind::Outline => &glyph.outline,
                PathKind::Inline => &glyph.inline,
            };
            for (index, point) in path.points.iter().enumerate() {
                let position = point.to_3d_xz() * scale + offset;
                let slot = LetterSlot {
                    letter: id,
                    kind,
                    index,
                };
                let pole = self.push_pole(position, charge, class, Some(slot));
                match kind {
                    PathKind::Outline => letter.outline.push(pole),
                    PathKind::Inline => letter.inline.push(pole),
                }
            }
        }

        self.letters.push(letter);
    }

    fn push_pole(
        &mut self,
        position: Vec3,
        charge: f32,
        class: PoleClass,
        slot: Option<LetterSlot>,
    ) -> PoleId {
        let id = PoleId::new(self.generation, self.poles.len() as u32);
        self.poles.push(Pole::new(id, position, charge, class));
        self.slots.push(slot);
        id
    }

    fn summary(&self) -> ConstellationSummary {
        let count = |class| self.poles.iter().filter(|p| p.class == class).count();
        ConstellationSummary {
            generation: self.generation,
            external: count(PoleClass::External),
            outline: count(PoleClass::Outline),
            inline: count(PoleClass::Inline),
            letters: self.letters.len(),
        }
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    /// Resolve a handle against the current generation.
    pub fn pole(&self, id: PoleId) -> Option<&Pole> {
        self.poles.get(id.index()).filter(|p| p.id == id)
    }

    /// The pole arena. Handles index into it.
    pub fn poles(&self) -> &[Pole] {
        &self.poles
    }

    /// Class of a pole, or `Unknown` for handles outside this constellation.
    pub fn classify(&self, id: PoleId) -> PoleClass {
        self.pole(id).map(|p| p.class).unwrap_or(PoleClass::Unknown)
    }

    /// Handles of every pole of a class.
    pub fn poles_of_class(&self, class: PoleClass) -> Vec<PoleId> {
        self.poles
            .iter()
            .filter(|p| p.class == class)
            .map(|p| p.id)
            .collect()
    }

    pub fn letter(&self, id: LetterId) -> Option<&LetterInstance> {
        self.letters.get(id.0)
    }

    pub fn letters(&self) -> &[LetterInstance] {
        &self.letters
    }

    /// The letter a pole belongs to, if any.
    pub fn letter_for_pole(&self, id: PoleId) -> Option<&LetterInstance> {
        self.pole(id)?;
        let slot = self.slots.get(id.index()).copied().flatten()?;
        self.letters.get(slot.letter.0)
    }

    /// Admissible next poles for a letter pole, in adjacency order.
    ///
    /// Empty for external poles and stale handles.
    pub fn next_options(&self, id: PoleId) -> Vec<PoleId> {
        if self.pole(id).is_none() {
            return Vec::new();
        }
        match self.slots.get(id.index()).copied().flatten() {
            Some(slot) => self
                .letters
                .get(slot.letter.0)
                .map(|l| l.flow_options(slot.kind, slot.index))
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn max_letter_hits(&self) -> u32 {
        self.config.max_letter_hits
    }

    pub fn max_external_hits(&self) -> u32 {
        self.config.max_external_hits
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// The enabled letter with the lowest combined usage.
    ///
    /// Usage is refreshed lazily while scanning; the scan stops at the first
    /// letter with zero usage.
    pub fn select_least_used_letter(&mut self) -> Option<LetterId> {
        let max = self.config.max_letter_hits;
        let poles = &self.poles;
        let disabled = &self.disabled;
        let usages = self
            .letters
            .iter_mut()
            .filter(|l| !disabled.contains(&l.id))
            .map(|l| (l.id, l.refresh_usage(poles, max).combined));
        pick_least_used(usages)
    }

    /// Exclude a letter from selection until the next rebuild.
    pub fn disable_letter(&mut self, id: LetterId) {
        if self.disabled.insert(id) {
            tracing::warn!(letter = %id, "letter disabled until next rebuild");
        }
    }

    pub fn is_letter_disabled(&self, id: LetterId) -> bool {
        self.disabled.contains(&id)
    }

    /// Poles of `set` still below `max_hit_count`.
    pub fn filter_by_hitcount(&self, set: &[PoleId], max_hit_count: u32) -> Vec<PoleId> {
        set.iter()
            .copied()
            .filter(|&id| self.pole(id).is_some_and(|p| p.is_available(max_hit_count)))
            .collect()
    }

    /// The pole of `set` with the oldest last hit. First wins on ties.
    pub fn select_oldest(&self, set: &[PoleId]) -> Option<PoleId> {
        self.select_min_by_key(set, |p| p.last_hit)
    }

    /// The pole of `set` with the lowest hit count. First wins on ties.
    pub fn select_least_used(&self, set: &[PoleId]) -> Option<PoleId> {
        self.select_min_by_key(set, |p| p.hit_count as u64)
    }

    fn select_min_by_key(&self, set: &[PoleId], key: impl Fn(&Pole) -> u64) -> Option<PoleId> {
        let mut best: Option<(PoleId, u64)> = None;
        for pole in set.iter().filter_map(|&id| self.pole(id)) {
            let k = key(pole);
            if best.map_or(true, |(_, b)| k < b) {
                best = Some((pole.id, k));
            }
        }
        best.map(|(id, _)| id)
    }

    // =========================================================================
    // HIT BOOKKEEPING
    // =========================================================================

    /// Record one claim on each pole. Either all handles apply or none do.
    pub fn commit_claims<'a>(&mut self, ids: impl IntoIterator<Item = &'a PoleId>) -> Result<()> {
        let ids: Vec<PoleId> = ids.into_iter().copied().collect();
        if let Some(&bad) = ids.iter().find(|&&id| self.pole(id).is_none()) {
            return Err(RibbonError::UnknownPole(bad));
        }
        for id in ids {
            self.hit_clock += 1;
            self.poles[id.index()].record_hit(self.hit_clock);
        }
        Ok(())
    }

    /// Drop one claim. Handles from older constellations are ignored.
    pub fn release(&mut self, id: PoleId) {
        if self.pole(id).is_some() {
            self.poles[id.index()].release_hit();
        }
    }
}

/// First letter with the strictly lowest usage, stopping at the first zero.
pub fn pick_least_used(usages: impl IntoIterator<Item = (LetterId, f32)>) -> Option<LetterId> {
    let mut best = None;
    let mut min_usage = f32::MAX;
    for (id, usage) in usages {
        if usage < min_usage {
            best = Some(id);
            if usage == 0.0 {
                break;
            }
            min_usage = usage;
        }
    }
    best
}
