//! Ribbon path construction.
//!
//! A path is assembled in five stages and only committed when all succeed:
//! 1. **Entry pick**: the least-used available pole of the entry pool
//! 2. **Entry trace**: a field line from the entry pole out to an external
//!    pole, reversed so it runs inward
//! 3. **Walk**: a smallest-turn walk over the letter's flow hints
//! 4. **Loop**: the walk vertices repeated `loop_count` extra times
//! 5. **Exit trace**: a downward field line from the last letter pole to an
//!    external pole
//!
//! Each pole the path touches is claimed once, whatever the number of visits.

use pole_field::{FieldConfig, FieldLine, PointChargeField, PoleClass, PoleId, Vec3};
use std::collections::HashSet;
use std::ops::Range;

use crate::config::RibbonConfig;
use crate::constellation::{LetterId, PoleRegistry};
use crate::error::{Result, RibbonError};

/// How the letter walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    /// The walk returned to its start pole after at least two hops.
    Closed,
    /// No unvisited successor remained.
    DeadEnd,
    /// The hop safety cap was reached.
    IterationCapped,
}

/// Ordered vertices of a ribbon with their cumulative arc lengths.
#[derive(Debug, Clone)]
pub struct RibbonPath {
    vertices: Vec<Vec3>,
    arc_lengths: Vec<f32>,
    letter_range: Range<usize>,
    total_length: f32,
}

impl RibbonPath {
    /// Build a path, rejecting fewer than two vertices or zero length.
    pub fn new(vertices: Vec<Vec3>, letter_range: Range<usize>) -> Result<Self> {
        if vertices.len() < 2 || letter_range.end > vertices.len() {
            return Err(RibbonError::DegeneratePath);
        }

        let mut arc_lengths = Vec::with_capacity(vertices.len());
        let mut total = 0.0;
        arc_lengths.push(total);
        for pair in vertices.windows(2) {
            total += pair[0].distance_to(pair[1]);
            arc_lengths.push(total);
        }

        if total <= 0.0 {
            return Err(RibbonError::DegeneratePath);
        }

        Ok(Self {
            vertices,
            arc_lengths,
            letter_range,
            total_length: total,
        })
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Cumulative distance from the first vertex, one entry per vertex.
    pub fn arc_lengths(&self) -> &[f32] {
        &self.arc_lengths
    }

    /// Contiguous range of vertices inside the letter, loops included.
    pub fn letter_range(&self) -> Range<usize> {
        self.letter_range.clone()
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_in_letter(&self, index: usize) -> bool {
        self.letter_range.contains(&index)
    }
}

/// A committed path plus the bookkeeping its ribbon has to carry.
#[derive(Debug, Clone)]
pub struct BuiltPath {
    pub path: RibbonPath,

    /// Every pole claimed by this path, each exactly once.
    pub claims: HashSet<PoleId>,

    /// Letter pole the path entered through.
    pub entry: PoleId,

    /// Position of the entry pole; touch stimuli are measured against it.
    pub anchor: Vec3,

    pub walk: WalkOutcome,
}

/// Letter walk result before anything is committed.
struct Walk {
    vertices: Vec<Vec3>,
    visited: Vec<PoleId>,
    /// Pole the walk ended on; the start pole after a closure.
    last: PoleId,
    outcome: WalkOutcome,
    last_segment: Option<Vec3>,
}

/// Builds ribbon paths over a pole registry.
#[derive(Debug, Clone)]
pub struct RibbonPathBuilder {
    field: PointChargeField,
    loop_count: u32,
    max_walk_steps: usize,
}

impl RibbonPathBuilder {
    pub fn new(field: FieldConfig, ribbon: &RibbonConfig) -> Self {
        Self {
            field: PointChargeField::new(field),
            loop_count: ribbon.loop_count,
            max_walk_steps: ribbon.max_walk_steps,
        }
    }

    /// Override the number of extra letter passes.
    pub fn with_loop_count(mut self, loop_count: u32) -> Self {
        self.loop_count = loop_count;
        self
    }

    pub fn field(&self) -> &PointChargeField {
        &self.field
    }

    /// Build a path through a letter, entering via its preferred pole set.
    pub fn create_for_letter(
        &self,
        registry: &mut PoleRegistry,
        letter: LetterId,
        hint: Vec3,
    ) -> Result<BuiltPath> {
        let pool = match registry.letter(letter) {
            Some(instance) if !instance.outline.is_empty() => {
                instance.poles(instance.preferred_entry()).to_vec()
            }
            _ => return Err(RibbonError::EmptyGlyph { letter }),
        };
        self.create(registry, &pool, hint)
    }

    /// Build a path entering through one of `pool`.
    ///
    /// On failure the registry is left untouched.
    pub fn create(&self, registry: &mut PoleRegistry, pool: &[PoleId], hint: Vec3) -> Result<BuiltPath> {
        let entry = Self::pick_entry(registry, pool)?;
        let externals = registry.filter_by_hitcount(
            &registry.poles_of_class(PoleClass::External),
            registry.max_external_hits(),
        );
        if externals.is_empty() {
            return Err(RibbonError::Starvation);
        }

        let inbound = self.trace_external(registry, entry, hint, &externals)?;
        let mut vertices = inbound.vertices;
        vertices.reverse();

        let walk = self.walk(registry, entry);

        let exit_from = walk.last;
        let exit_dir = walk
            .last_segment
            .or_else(|| entry_tangent(&vertices))
            .unwrap_or(-Vec3::Y_AXIS);
        let outbound = self.trace_external(registry, exit_from, downward(exit_dir), &externals)?;

        let letter_start = vertices.len();
        vertices.extend_from_slice(&walk.vertices);
        for _ in 0..self.loop_count {
            vertices.extend_from_slice(&walk.vertices);
        }
        let letter_range = letter_start..vertices.len();
        vertices.extend(outbound.vertices.iter().skip(1).copied());

        let path = RibbonPath::new(vertices, letter_range)?;

        let mut claims = HashSet::with_capacity(walk.visited.len() + 2);
        claims.insert(inbound.target);
        claims.extend(walk.visited.iter().copied());
        claims.insert(outbound.target);
        registry.commit_claims(&claims)?;

        let anchor = registry.pole(entry).map(|p| p.position).unwrap_or_default();
        tracing::trace!(
            entry = %entry,
            vertices = path.len(),
            length = path.total_length(),
            walk = ?walk.outcome,
            "ribbon path built"
        );

        Ok(BuiltPath {
            path,
            claims,
            entry,
            anchor,
            walk: walk.outcome,
        })
    }

    /// Entry pole of a pool: least used, unless the oldest has fewer hits.
    pub fn pick_entry(registry: &PoleRegistry, pool: &[PoleId]) -> Result<PoleId> {
        let available = registry.filter_by_hitcount(pool, registry.max_letter_hits());
        let least = registry
            .select_least_used(&available)
            .ok_or(RibbonError::Starvation)?;
        let oldest = registry.select_oldest(&available).unwrap_or(least);

        let hits = |id| registry.pole(id).map_or(u32::MAX, |p| p.hit_count);
        if hits(oldest) < hits(least) {
            Ok(oldest)
        } else {
            Ok(least)
        }
    }

    fn trace_external(
        &self,
        registry: &PoleRegistry,
        from: PoleId,
        direction: Vec3,
        externals: &[PoleId],
    ) -> Result<FieldLine> {
        self.field
            .trace(
                registry.poles(),
                from,
                direction,
                externals,
                registry.max_external_hits(),
            )
            .map_err(|failure| {
                tracing::trace!(from = %from, %failure, "field line failed");
                RibbonError::from(failure)
            })
    }

    /// Smallest-turn walk over the flow hints starting at `start`.
    fn walk(&self, registry: &PoleRegistry, start: PoleId) -> Walk {
        let step = self.field.config().step_length;
        let mut walk = Walk {
            vertices: Vec::new(),
            visited: vec![start],
            last: start,
            outcome: WalkOutcome::IterationCapped,
            last_segment: None,
        };
        let mut seen: HashSet<PoleId> = HashSet::from([start]);
        let mut current = start;

        for hops in 0..self.max_walk_steps {
            let options = registry.next_options(current);

            let next = if hops >= 2 && options.contains(&start) {
                Some(start)
            } else {
                Self::smallest_turn(registry, current, options.iter().filter(|id| !seen.contains(*id)))
            };

            let Some(next) = next else {
                walk.outcome = WalkOutcome::DeadEnd;
                break;
            };
            let (Some(from), Some(to)) = (registry.pole(current), registry.pole(next)) else {
                walk.outcome = WalkOutcome::DeadEnd;
                break;
            };

            from.position.split_into_segments(to.position, step, &mut walk.vertices);
            walk.last_segment = Some(to.position - from.position);
            walk.last = next;

            if next == start {
                walk.outcome = WalkOutcome::Closed;
                break;
            }
            seen.insert(next);
            walk.visited.push(next);
            current = next;
        }

        walk
    }

    /// Candidate whose bearing turns least from the current one. First wins on ties.
    fn smallest_turn<'a>(
        registry: &PoleRegistry,
        current: PoleId,
        candidates: impl Iterator<Item = &'a PoleId>,
    ) -> Option<PoleId> {
        let bearing = registry.pole(current)?.bearing;
        let mut best: Option<(PoleId, f32)> = None;
        for &id in candidates {
            let Some(pole) = registry.pole(id) else {
                continue;
            };
            let turn = bearing.angle_between(pole.bearing);
            if best.map_or(true, |(_, b)| turn < b) {
                best = Some((id, turn));
            }
        }
        best.map(|(id, _)| id)
    }
}

/// Direction of the last entry step, pointing into the entry pole.
fn entry_tangent(vertices: &[Vec3]) -> Option<Vec3> {
    match vertices {
        [.., a, b] => Some(*b - *a),
        _ => None,
    }
}

/// Keep the heading but force a downward component.
fn downward(direction: Vec3) -> Vec3 {
    let mut d = direction.normalize();
    d.y = -1.0;
    d.normalize()
}
