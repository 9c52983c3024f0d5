//! Letter instances - placed occurrences of a glyph and their flow lookups.

use pole_field::{Glyph, Pole, PoleId, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Index of a letter instance within the current constellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LetterId(pub usize);

impl std::fmt::Display for LetterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which of a glyph's point sequences a pole belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathKind {
    Outline,
    Inline,
}

/// Cached usage ratios of a letter (hits / capacity).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LetterUsage {
    pub outer: f32,
    pub inner: f32,
    pub combined: f32,
}

/// A glyph placed in the scene with handles to its poles.
#[derive(Debug, Clone)]
pub struct LetterInstance {
    pub id: LetterId,
    pub glyph: Arc<Glyph>,
    pub offset: Vec3,
    pub outline: Vec<PoleId>,
    pub inline: Vec<PoleId>,
    pub usage: LetterUsage,
}

impl LetterInstance {
    pub fn new(id: LetterId, glyph: Arc<Glyph>, offset: Vec3) -> Self {
        Self {
            id,
            glyph,
            offset,
            outline: Vec::new(),
            inline: Vec::new(),
            usage: LetterUsage::default(),
        }
    }

    pub fn has_inline(&self) -> bool {
        !self.inline.is_empty()
    }

    pub fn poles(&self, kind: PathKind) -> &[PoleId] {
        match kind {
            PathKind::Outline => &self.outline,
            PathKind::Inline => &self.inline,
        }
    }

    /// Admissible successors of the pole at `index` in the given sequence,
    /// in adjacency order.
    pub fn flow_options(&self, kind: PathKind, index: usize) -> Vec<PoleId> {
        let path = match kind {
            PathKind::Outline => &self.glyph.outline,
            PathKind::Inline => &self.glyph.inline,
        };
        let poles = self.poles(kind);
        path.successors(index)
            .iter()
            .filter_map(|&j| poles.get(j).copied())
            .collect()
    }

    /// Recompute the cached usage against the pole arena.
    ///
    /// Outer usage is mean outline hit count over `max_hit_count`; combined
    /// usage averages outer and inner only when inline poles exist.
    pub fn refresh_usage(&mut self, poles: &[Pole], max_hit_count: u32) -> LetterUsage {
        let outer = mean_usage(&self.outline, poles, max_hit_count);
        let (inner, combined) = if self.has_inline() {
            let inner = mean_usage(&self.inline, poles, max_hit_count);
            (inner, (outer + inner) * 0.5)
        } else {
            (0.0, outer)
        };

        self.usage = LetterUsage {
            outer,
            inner,
            combined,
        };
        self.usage
    }

    /// The pole sequence new ribbons should enter through: inline when it
    /// is less used than the outline, otherwise the outline.
    pub fn preferred_entry(&self) -> PathKind {
        if self.has_inline() && self.usage.inner < self.usage.outer {
            PathKind::Inline
        } else {
            PathKind::Outline
        }
    }
}

fn mean_usage(ids: &[PoleId], poles: &[Pole], max_hit_count: u32) -> f32 {
    if ids.is_empty() || max_hit_count == 0 {
        return 0.0;
    }
    let total: u32 = ids
        .iter()
        .filter_map(|id| poles.get(id.index()))
        .map(|p| p.hit_count)
        .sum();
    total as f32 / (ids.len() as f32 * max_hit_count as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pole_field::{GlyphPath, PoleClass, Vec2};

    fn instance_with_poles(hits_outer: &[u32], hits_inner: &[u32]) -> (LetterInstance, Vec<Pole>) {
        let outline = GlyphPath::new(
            hits_outer.iter().map(|_| Vec2::default()).collect(),
            hits_outer.iter().map(|_| Vec::new()).collect(),
        );
        let inline = GlyphPath::new(
            hits_inner.iter().map(|_| Vec2::default()).collect(),
            hits_inner.iter().map(|_| Vec::new()).collect(),
        );
        let glyph = Arc::new(Glyph::new('o', 10.0, outline).with_inline(inline));
        let mut letter = LetterInstance::new(LetterId(0), glyph, Vec3::ZERO);

        let mut poles = Vec::new();
        for (kind, hits) in [(PoleClass::Outline, hits_outer), (PoleClass::Inline, hits_inner)] {
            for &h in hits {
                let id = PoleId::new(0, poles.len() as u32);
                let mut pole = Pole::new(id, Vec3::ZERO, 20.0, kind);
                pole.hit_count = h;
                poles.push(pole);
                match kind {
                    PoleClass::Outline => letter.outline.push(id),
                    _ => letter.inline.push(id),
                }
            }
        }
        (letter, poles)
    }

    #[test]
    fn test_outline_only_usage() {
        let (mut letter, poles) = instance_with_poles(&[1, 3], &[]);
        let usage = letter.refresh_usage(&poles, 10);

        assert!((usage.outer - 0.2).abs() < 1e-6);
        assert_eq!(usage.combined, usage.outer);
        assert_eq!(letter.preferred_entry(), PathKind::Outline);
    }

    #[test]
    fn test_combined_usage_averages_inline() {
        let (mut letter, poles) = instance_with_poles(&[4, 4], &[0]);
        let usage = letter.refresh_usage(&poles, 10);

        assert!((usage.outer - 0.4).abs() < 1e-6);
        assert_eq!(usage.inner, 0.0);
        assert!((usage.combined - 0.2).abs() < 1e-6);
        assert_eq!(letter.preferred_entry(), PathKind::Inline);
    }

    #[test]
    fn test_flow_options_map_indices_to_handles() {
        let outline = GlyphPath::new(
            vec![Vec2::default(), Vec2::default(), Vec2::default()],
            vec![vec![2, 1], vec![0], vec![]],
        );
        let glyph = Arc::new(Glyph::new('v', 10.0, outline));
        let mut letter = LetterInstance::new(LetterId(3), glyph, Vec3::ZERO);
        letter.outline = vec![PoleId::new(1, 10), PoleId::new(1, 11), PoleId::new(1, 12)];

        assert_eq!(
            letter.flow_options(PathKind::Outline, 0),
            vec![PoleId::new(1, 12), PoleId::new(1, 11)]
        );
        assert!(letter.flow_options(PathKind::Outline, 2).is_empty());
        assert!(letter.flow_options(PathKind::Inline, 0).is_empty());
    }
}
