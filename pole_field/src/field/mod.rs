//! Point charge field - traces field lines through superposed inverse-square forces.
//!
//! A field line starts next to its origin pole and is integrated step by step:
//! 1. **Accumulate**: sum `d * charge / |d|²` over the origin and every
//!    available candidate (`d` = current position minus pole position)
//! 2. **Capture**: stop successfully once within the capture radius of a candidate
//! 3. **Advance**: move `step_length` along the accumulated direction
//! 4. **Bound**: give up once the position leaves the world bounds or the
//!    iteration cap is reached

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Aabb, Vec3};
use crate::poles::{Pole, PoleId};

/// Parameters for field line integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Distance advanced per integration step.
    pub step_length: f32,

    /// Distance from the origin pole at which tracing starts.
    pub seed_radius: f32,

    /// A candidate within this distance captures the line.
    pub capture_radius: f32,

    /// Hard cap on integration steps.
    pub max_iterations: u32,

    /// World space bounds; leaving them aborts the trace.
    pub bounds: Aabb,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            step_length: 10.0,
            seed_radius: 10.0,
            capture_radius: 9.0,
            max_iterations: 200,
            bounds: Aabb::default(),
        }
    }
}

/// Why a trace ended without a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TraceFailure {
    #[error("field line left the world bounds after {iterations} steps")]
    LeftBounds { iterations: u32 },

    #[error("field line found no target within {iterations} steps")]
    IterationCap { iterations: u32 },

    #[error("no candidate poles available")]
    NoCandidates,
}

/// A successfully traced field line.
#[derive(Debug, Clone)]
pub struct FieldLine {
    /// The pole that captured the line. Never the origin.
    pub target: PoleId,

    /// Polyline from the origin position to the target position.
    pub vertices: Vec<Vec3>,
}

/// Field line tracer over an arena of poles.
#[derive(Debug, Clone, Default)]
pub struct PointChargeField {
    config: FieldConfig,
}

impl PointChargeField {
    pub fn new(config: FieldConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Trace a field line from `origin` toward one of `candidates`.
    ///
    /// Only candidates with `hit_count < max_hit_count` take part, and the
    /// origin is never a candidate. `poles` is the arena the ids index into;
    /// ids that do not resolve are ignored.
    pub fn trace(
        &self,
        poles: &[Pole],
        origin: PoleId,
        direction: Vec3,
        candidates: &[PoleId],
        max_hit_count: u32,
    ) -> Result<FieldLine, TraceFailure> {
        let origin_pole = resolve(poles, origin).ok_or(TraceFailure::NoCandidates)?;

        let active: Vec<&Pole> = candidates
            .iter()
            .filter(|&&id| id != origin)
            .filter_map(|&id| resolve(poles, id))
            .filter(|p| p.is_available(max_hit_count))
            .collect();
        if active.is_empty() {
            return Err(TraceFailure::NoCandidates);
        }

        let capture_sq = self.config.capture_radius * self.config.capture_radius;
        let step = self.config.step_length * origin_pole.sign();

        let mut pos = origin_pole.position + direction.normalize() * self.config.seed_radius;
        let mut vertices = vec![origin_pole.position];
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            iterations += 1;

            let mut force = inverse_square(pos, origin_pole);
            for pole in &active {
                let d = pos - pole.position;
                if d.mag_squared() < capture_sq {
                    vertices.push(pole.position);
                    return Ok(FieldLine {
                        target: pole.id,
                        vertices,
                    });
                }
                force += d * (pole.charge / d.mag_squared());
            }

            vertices.push(pos);
            pos += force.normalize_to(step);
            if !self.config.bounds.contains(pos) {
                return Err(TraceFailure::LeftBounds { iterations });
            }
        }

        Err(TraceFailure::IterationCap { iterations })
    }
}

fn resolve(poles: &[Pole], id: PoleId) -> Option<&Pole> {
    poles.get(id.index()).filter(|p| p.id == id)
}

fn inverse_square(pos: Vec3, pole: &Pole) -> Vec3 {
    let d = pos - pole.position;
    let mag = d.mag_squared();
    if mag > 0.0 {
        d * (pole.charge / mag)
    } else {
        Vec3::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poles::PoleClass;

    fn pole(index: u32, position: Vec3, charge: f32) -> Pole {
        let class = if charge < 0.0 {
            PoleClass::External
        } else {
            PoleClass::Outline
        };
        Pole::new(PoleId::new(0, index), position, charge, class)
    }

    fn field() -> PointChargeField {
        PointChargeField::new(FieldConfig {
            step_length: 5.0,
            seed_radius: 10.0,
            capture_radius: 9.0,
            max_iterations: 200,
            bounds: Aabb::new(Vec3::ZERO, Vec3::new(500.0, 500.0, 500.0)),
        })
    }

    fn triangle() -> Vec<Pole> {
        vec![
            pole(0, Vec3::ZERO, 20.0),
            pole(1, Vec3::new(100.0, 0.0, 0.0), -20.0),
            pole(2, Vec3::new(50.0, 0.0, 86.6), 5.0),
        ]
    }

    #[test]
    fn test_triangle_trace_reaches_target() {
        let poles = triangle();
        let ids: Vec<PoleId> = poles.iter().map(|p| p.id).collect();

        let line = field()
            .trace(&poles, ids[0], Vec3::X_AXIS, &ids, 10)
            .expect("trace should capture");

        assert_eq!(line.target, ids[1]);
        assert_eq!(line.vertices.first(), Some(&poles[0].position));
        assert_eq!(line.vertices.last(), Some(&poles[1].position));
        assert!(line.vertices.len() < 200);
    }

    #[test]
    fn test_never_captures_origin() {
        let poles = triangle();
        let ids: Vec<PoleId> = poles.iter().map(|p| p.id).collect();

        // Aim back at the origin's own neighbourhood; the origin is still excluded.
        for dir in [Vec3::X_AXIS, -Vec3::X_AXIS, Vec3::Z_AXIS, Vec3::Y_AXIS] {
            if let Ok(line) = field().trace(&poles, ids[0], dir, &ids, 10) {
                assert_ne!(line.target, ids[0]);
            }
        }
    }

    #[test]
    fn test_saturated_candidates_are_ignored() {
        let mut poles = triangle();
        poles[1].hit_count = 3;
        let ids: Vec<PoleId> = poles.iter().map(|p| p.id).collect();

        let result = field().trace(&poles, ids[0], Vec3::X_AXIS, &[ids[1]], 3);
        assert_eq!(result.unwrap_err(), TraceFailure::NoCandidates);
    }

    #[test]
    fn test_leaving_bounds_fails() {
        // A lone positive pole pushes the line straight out of the box.
        let poles = vec![
            pole(0, Vec3::ZERO, 20.0),
            pole(1, Vec3::new(0.0, 0.0, 400.0), -1.0),
        ];
        let ids: Vec<PoleId> = poles.iter().map(|p| p.id).collect();

        let result = field().trace(&poles, ids[0], Vec3::X_AXIS, &ids, 10);
        assert!(matches!(result, Err(TraceFailure::LeftBounds { .. })));
    }

    #[test]
    fn test_iteration_cap() {
        let poles = triangle();
        let ids: Vec<PoleId> = poles.iter().map(|p| p.id).collect();
        let field = PointChargeField::new(FieldConfig {
            max_iterations: 3,
            ..field().config().clone()
        });

        let result = field.trace(&poles, ids[0], Vec3::X_AXIS, &ids, 10);
        assert_eq!(result.unwrap_err(), TraceFailure::IterationCap { iterations: 3 });
    }

    #[test]
    fn test_stale_handles_are_ignored() {
        let poles = triangle();
        let stale = PoleId::new(9, 1);
        let result = field().trace(&poles, poles[0].id, Vec3::X_AXIS, &[stale], 10);
        assert_eq!(result.unwrap_err(), TraceFailure::NoCandidates);
    }
}
