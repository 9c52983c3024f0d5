//! Placement strategies for external poles.
//!
//! Strategies produce normalized positions in `[-1, 1]` per axis. The caller
//! scales them to the world bounds. Both strategies keep `|y|` and `|z|` at or
//! above the exclusion vector so external poles stay clear of the letters in
//! the centre of the scene.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::geometry::Vec3;

/// Produces normalized positions for external poles.
pub trait PlacementStrategy: Send {
    /// Position for pole `index` of `total`.
    fn create_position(&self, index: usize, total: usize, exclusion: Vec3, rng: &mut dyn RngCore)
        -> Vec3;
}

/// Random X in `[-0.66, 0.66]`, Z side alternating by index, Y side random.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomXPlacement;

impl PlacementStrategy for RandomXPlacement {
    fn create_position(
        &self,
        index: usize,
        _total: usize,
        exclusion: Vec3,
        rng: &mut dyn RngCore,
    ) -> Vec3 {
        let x = rng.gen_range(-1.0f32..=1.0) * 0.66;
        let y = random_between(rng, exclusion.y, 1.0);
        let z = random_between(rng, exclusion.z, 1.0);
        let y = if rng.gen::<f32>() < 0.5 { y } else { -y };
        let z = if index % 2 == 0 { z } else { -z };
        Vec3::new(x, y, z)
    }
}

/// Evenly spaced X across `[-1, 1)`, Y and Z sides both random.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridXInterleavePlacement;

impl PlacementStrategy for GridXInterleavePlacement {
    fn create_position(
        &self,
        index: usize,
        total: usize,
        exclusion: Vec3,
        rng: &mut dyn RngCore,
    ) -> Vec3 {
        let x = if total > 0 {
            -1.0 + 2.0 * index as f32 / total as f32
        } else {
            0.0
        };
        let y = random_between(rng, exclusion.y, 1.0);
        let z = random_between(rng, exclusion.z, 1.0);
        let z = if rng.gen::<f32>() < 0.5 { z } else { -z };
        let y = if rng.gen::<f32>() < 0.5 { y } else { -y };
        Vec3::new(x, y, z)
    }
}

/// Configuration selector for the built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementKind {
    #[default]
    RandomX,
    GridInterleaveX,
}

impl PlacementKind {
    /// Build the strategy this kind names.
    pub fn strategy(&self) -> Box<dyn PlacementStrategy> {
        match self {
            PlacementKind::RandomX => Box::new(RandomXPlacement),
            PlacementKind::GridInterleaveX => Box::new(GridXInterleavePlacement),
        }
    }
}

fn random_between(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    if min < max {
        rng.gen_range(min..max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_x_respects_exclusion() {
        let mut rng = SmallRng::seed_from_u64(7);
        let exclusion = Vec3::new(0.0, 0.33, 0.5);

        for i in 0..100 {
            let p = RandomXPlacement.create_position(i, 100, exclusion, &mut rng);
            assert!(p.x.abs() <= 0.66 + 1e-6);
            assert!(p.y.abs() >= 0.33 && p.y.abs() <= 1.0);
            assert!(p.z.abs() >= 0.5 && p.z.abs() <= 1.0);
            // Z side alternates with the index
            assert_eq!(p.z > 0.0, i % 2 == 0);
        }
    }

    #[test]
    fn test_grid_interleave_spacing() {
        let mut rng = SmallRng::seed_from_u64(11);
        let exclusion = Vec3::new(0.0, 0.2, 0.2);

        let xs: Vec<f32> = (0..4)
            .map(|i| GridXInterleavePlacement.create_position(i, 4, exclusion, &mut rng).x)
            .collect();

        assert_eq!(xs, vec![-1.0, -0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_kind_selects_strategy() {
        let mut rng = SmallRng::seed_from_u64(3);
        let p = PlacementKind::GridInterleaveX
            .strategy()
            .create_position(0, 2, Vec3::ZERO, &mut rng);
        assert_eq!(p.x, -1.0);
    }
}
