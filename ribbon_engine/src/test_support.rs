//! Shared fixtures for unit tests.

use pole_field::{Aabb, Alphabet, FieldConfig, Glyph, GlyphPath, Vec2, Vec3};
use std::sync::Arc;

use crate::config::PoleConfig;
use crate::constellation::PoleRegistry;
use crate::scheduler::MessageLine;

fn path(points: &[(f32, f32)], flow: Vec<Vec<usize>>) -> GlyphPath {
    GlyphPath::new(points.iter().map(|&(x, y)| Vec2::new(x, y)).collect(), flow)
}

/// Small glyph set:
/// - `i`: vertical bar of two poles
/// - `-`: horizontal bar of two poles, 20 apart
/// - `o`: 20x20 square ring
/// - `v`: triangle, fully connected
/// - `e`: inline points only
/// - ` `: spacing only
pub fn test_alphabet() -> Alphabet {
    Alphabet::new(
        20.0,
        vec![
            Glyph::new('i', 10.0, path(&[(0.0, 0.0), (0.0, 20.0)], vec![vec![1], vec![0]]))
                .with_kerning(1.0, 1.0),
            Glyph::new('-', 20.0, path(&[(0.0, 0.0), (20.0, 0.0)], vec![vec![1], vec![0]])),
            Glyph::new(
                'o',
                20.0,
                path(
                    &[(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)],
                    vec![vec![1], vec![2], vec![3], vec![0]],
                ),
            ),
            Glyph::new(
                'v',
                20.0,
                path(
                    &[(0.0, 0.0), (20.0, 0.0), (10.0, 20.0)],
                    vec![vec![1, 2], vec![2, 0], vec![0, 1]],
                ),
            ),
            Glyph::new('e', 20.0, GlyphPath::default())
                .with_inline(path(&[(5.0, 5.0), (15.0, 5.0)], vec![vec![1], vec![0]])),
            Glyph::new(' ', 5.0, GlyphPath::default()).with_kerning(1.0, 1.0),
        ],
    )
}

/// Field settings with a finer step and a cubic world of half-size 500.
pub fn test_field_config() -> FieldConfig {
    FieldConfig {
        step_length: 5.0,
        seed_radius: 10.0,
        capture_radius: 9.0,
        max_iterations: 200,
        bounds: test_bounds(),
    }
}

pub fn test_bounds() -> Aabb {
    Aabb::new(Vec3::ZERO, Vec3::new(500.0, 500.0, 500.0))
}

/// Pole settings with no strategy-placed poles, only the given externals.
pub fn fixed_pole_config(externals: Vec<Vec3>) -> PoleConfig {
    PoleConfig {
        count: 0,
        custom: externals,
        seed: Some(1),
        ..PoleConfig::default()
    }
}

pub fn fixed_registry(alphabet: Alphabet, externals: Vec<Vec3>) -> PoleRegistry {
    PoleRegistry::new(Arc::new(alphabet), fixed_pole_config(externals), test_bounds())
}

pub fn line(text: &str, offset: Vec3, scale: f32) -> MessageLine {
    MessageLine::new(text, offset, scale)
}
