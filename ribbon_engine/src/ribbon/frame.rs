//! Per-frame render data exposed to the drawing layer.

use pole_field::Vec3;
use std::ops::Range;

use super::{Ribbon, RibbonContent, RibbonId, RibbonState};
use crate::config::RibbonConfig;

/// Everything a renderer needs to draw one ribbon this frame.
#[derive(Debug, Clone)]
pub struct RibbonFrame<'a> {
    pub id: RibbonId,
    pub state: RibbonState,
    pub vertices: &'a [Vec3],
    pub arc_lengths: &'a [f32],
    pub letter_range: Range<usize>,
    pub cursor: f32,

    /// Lateral offset to add to every vertex.
    pub displacement: Vec3,

    pub alpha: Vec<f32>,

    /// Texture coordinate along the visible window, `None` outside it.
    pub tex_coords: Vec<Option<f32>>,

    pub half_widths: Vec<f32>,
    pub content: &'a RibbonContent,
}

impl RibbonFrame<'_> {
    /// Number of vertices inside the visible window.
    pub fn visible_count(&self) -> usize {
        self.tex_coords.iter().filter(|t| t.is_some()).count()
    }
}

impl Ribbon {
    /// Render data for the current cursor position.
    pub fn frame(&self, config: &RibbonConfig) -> RibbonFrame<'_> {
        let path = self.path();
        let arc = path.arc_lengths();
        let cursor = self.cursor();
        let trail = config.trail_length;
        let tail = cursor - trail;

        let tex_coords: Vec<Option<f32>> = arc
            .iter()
            .map(|&s| (tail..=cursor).contains(&s).then(|| (cursor - s) / trail))
            .collect();

        let mut alpha = vec![0.0; arc.len()];
        let first = tex_coords.iter().position(Option::is_some);
        let last = tex_coords.iter().rposition(Option::is_some);
        if let (Some(first), Some(last)) = (first, last) {
            let count = last - first + 1;
            let fade = config.fade_vertices;
            for (k, a) in alpha[first..=last].iter_mut().enumerate() {
                *a = if fade == 0 {
                    1.0
                } else {
                    (k.min(count - 1 - k) as f32 / fade as f32).min(1.0)
                };
            }
        }

        let base = config.width * 0.5;
        let half_widths = (0..arc.len())
            .map(|i| {
                if path.is_in_letter(i) {
                    base * config.letter_scale
                } else {
                    base
                }
            })
            .collect();

        RibbonFrame {
            id: self.id,
            state: self.state(),
            vertices: path.vertices(),
            arc_lengths: arc,
            letter_range: path.letter_range(),
            cursor,
            displacement: self.displacement(),
            alpha,
            tex_coords,
            half_widths,
            content: self.content(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ribbon::{BuiltPath, RibbonLaunch, RibbonPath, WalkOutcome};
    use pole_field::PoleId;
    use std::collections::HashSet;

    fn ribbon_along_x(count: usize, speed: f32) -> Ribbon {
        let vertices = (0..count).map(|i| Vec3::new(i as f32 * 10.0, 0.0, 0.0)).collect();
        let built = BuiltPath {
            path: RibbonPath::new(vertices, 2..5).unwrap(),
            claims: HashSet::new(),
            entry: PoleId::new(0, 0),
            anchor: Vec3::ZERO,
            walk: WalkOutcome::DeadEnd,
        };
        let launch = RibbonLaunch {
            speed,
            spawn_delay: 0,
            start_frame: 0,
            phase: 0.0,
            content: RibbonContent::default(),
        };
        Ribbon::new(built, launch, &render_config())
    }

    fn render_config() -> RibbonConfig {
        RibbonConfig {
            width: 10.0,
            letter_scale: 2.0,
            trail_length: 40.0,
            fade_vertices: 2,
            ..RibbonConfig::default()
        }
    }

    #[test]
    fn test_visible_window_and_tex_coords() {
        let mut ribbon = ribbon_along_x(20, 60.0);
        ribbon.update(1, true, 1.0);

        let frame = ribbon.frame(&render_config());

        // Cursor 60, trail 40: arc lengths 20..=60 are visible
        assert_eq!(frame.visible_count(), 5);
        assert_eq!(frame.tex_coords[1], None);
        assert_eq!(frame.tex_coords[2], Some(1.0));
        assert_eq!(frame.tex_coords[6], Some(0.0));
        assert_eq!(frame.tex_coords[7], None);
    }

    #[test]
    fn test_alpha_ramps_at_both_ends() {
        let mut ribbon = ribbon_along_x(20, 60.0);
        ribbon.update(1, true, 1.0);

        let frame = ribbon.frame(&render_config());

        assert_eq!(&frame.alpha[1..8], &[0.0, 0.0, 0.5, 1.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_letter_vertices_are_wider() {
        let ribbon = ribbon_along_x(8, 1.0);
        let frame = ribbon.frame(&render_config());

        assert_eq!(frame.half_widths[1], 5.0);
        assert_eq!(frame.half_widths[2], 10.0);
        assert_eq!(frame.half_widths[4], 10.0);
        assert_eq!(frame.half_widths[5], 5.0);
        assert_eq!(frame.letter_range, 2..5);
    }
}
