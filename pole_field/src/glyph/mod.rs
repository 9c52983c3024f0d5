//! Glyph definitions: outline/inline point sequences and their flow hints.
//!
//! A glyph is static, immutable input shared by every placed occurrence of
//! its character. Each point of a path carries a flow hint: the ordered list
//! of point indices a ribbon may move to next.

mod alphabet;

pub use alphabet::*;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::Vec2;

/// One point sequence of a glyph with its adjacency table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlyphPath {
    #[serde(default)]
    pub points: Vec<Vec2>,

    /// `flow[i]` lists the admissible successors of point `i`.
    #[serde(default)]
    pub flow: Vec<Vec<usize>>,
}

impl GlyphPath {
    pub fn new(points: Vec<Vec2>, flow: Vec<Vec<usize>>) -> Self {
        Self { points, flow }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Successor indices for a point, empty when out of range.
    pub fn successors(&self, index: usize) -> &[usize] {
        self.flow.get(index).map(|v| v.as_slice()).unwrap_or(&[])
    }

    fn validate(&self, glyph: char, label: &str) -> Result<(), ConfigError> {
        if self.flow.len() != self.points.len() {
            return Err(ConfigError::InvalidFlow {
                glyph,
                reason: format!(
                    "{} has {} points but {} flow entries",
                    label,
                    self.points.len(),
                    self.flow.len()
                ),
            });
        }
        for (i, successors) in self.flow.iter().enumerate() {
            if let Some(bad) = successors.iter().find(|&&j| j >= self.points.len()) {
                return Err(ConfigError::InvalidFlow {
                    glyph,
                    reason: format!("{} point {} routes to missing point {}", label, i, bad),
                });
            }
        }
        Ok(())
    }
}

/// Definition of a single character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub id: char,
    pub width: f32,

    /// Kerning applied after a regular predecessor.
    #[serde(default)]
    pub kern: f32,

    /// Kerning applied after a tall predecessor.
    #[serde(default)]
    pub kern_tall: f32,

    #[serde(default)]
    pub tall: bool,

    #[serde(default)]
    pub outline: GlyphPath,

    #[serde(default)]
    pub inline: GlyphPath,
}

impl Glyph {
    /// Create a glyph with an outline and no inline path.
    pub fn new(id: char, width: f32, outline: GlyphPath) -> Self {
        Self {
            id,
            width,
            kern: 0.0,
            kern_tall: 0.0,
            tall: false,
            outline,
            inline: GlyphPath::default(),
        }
    }

    /// Set the inline path.
    pub fn with_inline(mut self, inline: GlyphPath) -> Self {
        self.inline = inline;
        self
    }

    /// Set both kerning values.
    pub fn with_kerning(mut self, kern: f32, kern_tall: f32) -> Self {
        self.kern = kern;
        self.kern_tall = kern_tall;
        self
    }

    /// Mark the glyph as tall (affects the kerning of its successor).
    pub fn with_tall(mut self, tall: bool) -> Self {
        self.tall = tall;
        self
    }

    /// Kerning to apply when this glyph follows `prev`.
    ///
    /// In glyph units like `width`; layouts multiply both by the line scale.
    pub fn kerning(&self, prev: Option<&Glyph>) -> f32 {
        match prev {
            Some(p) if p.tall => self.kern_tall,
            _ => self.kern,
        }
    }

    pub fn has_inline(&self) -> bool {
        !self.inline.is_empty()
    }

    /// Check that both flow tables match their point sequences.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.outline.validate(self.id, "outline")?;
        self.inline.validate(self.id, "inline")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> GlyphPath {
        GlyphPath::new(
            vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)],
            vec![vec![1], vec![0]],
        )
    }

    #[test]
    fn test_kerning_after_tall_glyph() {
        let tall = Glyph::new('l', 5.0, pair()).with_tall(true);
        let short = Glyph::new('o', 8.0, pair());
        let glyph = Glyph::new('a', 8.0, pair()).with_kerning(1.5, -2.0);

        assert_eq!(glyph.kerning(None), 1.5);
        assert_eq!(glyph.kerning(Some(&short)), 1.5);
        assert_eq!(glyph.kerning(Some(&tall)), -2.0);
    }

    #[test]
    fn test_validate_flow_length() {
        let glyph = Glyph::new('x', 5.0, GlyphPath::new(vec![Vec2::default()], vec![]));
        assert!(matches!(glyph.validate(), Err(ConfigError::InvalidFlow { glyph: 'x', .. })));
    }

    #[test]
    fn test_validate_flow_range() {
        let path = GlyphPath::new(vec![Vec2::default(), Vec2::default()], vec![vec![1], vec![2]]);
        let glyph = Glyph::new('y', 5.0, pair()).with_inline(path);
        assert!(glyph.validate().is_err());
        assert!(Glyph::new('z', 5.0, pair()).validate().is_ok());
    }

    #[test]
    fn test_successors() {
        let path = pair();
        assert_eq!(path.successors(0), &[1]);
        assert!(path.successors(5).is_empty());
    }
}
