use rand::Rng;

use super::{finish_clip, EffectContext, EffectGenerator, EffectRng};
use crate::{
    canvas::{with_alpha, Frame, Rgba},
    clip::EffectClip,
    config::EffectsConfig,
    sync::SyncPoints,
    Result,
};

const STROKE_WIDTH: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Circles,
    Triangles,
    Squares,
}

impl PatternKind {
    /// Order in which patterns are cycled on beats.
    pub const CYCLE: [PatternKind; 3] = [Self::Circles, Self::Triangles, Self::Squares];

    fn color(self) -> Rgba {
        match self {
            Self::Circles => [80, 220, 255, 255],
            Self::Triangles => [255, 90, 200, 255],
            Self::Squares => [255, 220, 70, 255],
        }
    }
}

/// Beat-driven pattern selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternCycle {
    index: usize,
}

impl PatternCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> PatternKind {
        PatternKind::CYCLE[self.index]
    }

    /// Advances once per sync point within `window` seconds of `time`.
    /// Several points in the same frame each advance the cycle. Returns how
    /// many points fired.
    pub fn advance_for(&mut self, time: f32, sync: &SyncPoints, window: f32) -> usize {
        let hits = sync.near(time, window).count();
        self.index = (self.index + hits) % PatternKind::CYCLE.len();
        hits
    }
}

/// Outline shapes whose count and size follow the energy, switching pattern
/// on every beat.
#[derive(Debug, Clone)]
pub struct GeometricPatternEffect {
    max_shapes: usize,
    base_size: f32,
    sync_window: f32,
}

impl GeometricPatternEffect {
    pub fn from_config(config: &EffectsConfig) -> Self {
        Self {
            max_shapes: config.pattern_max_shapes,
            base_size: config.pattern_base_size,
            sync_window: config.sync_window,
        }
    }

    fn draw_shapes(&self, frame: &mut Frame, kind: PatternKind, energy: f32, rng: &mut EffectRng) {
        let count = (energy * self.max_shapes as f32).round() as usize;
        let size = self.base_size * (0.5 + energy);
        let color = with_alpha(kind.color(), energy);
        let width = frame.width() as f32;
        let height = frame.height() as f32;

        for _ in 0..count {
            let x = rng.random_range(0.0..width);
            let y = rng.random_range(0.0..height);
            let half = size * 0.5;
            match kind {
                PatternKind::Circles => frame.stroke_circle(x, y, half, STROKE_WIDTH, color),
                PatternKind::Triangles => frame.stroke_polygon(
                    &[(x, y - half), (x + half, y + half), (x - half, y + half)],
                    STROKE_WIDTH,
                    color,
                ),
                PatternKind::Squares => frame.stroke_polygon(
                    &[
                        (x - half, y - half),
                        (x + half, y - half),
                        (x + half, y + half),
                        (x - half, y + half),
                    ],
                    STROKE_WIDTH,
                    color,
                ),
            }
        }
    }
}

impl Default for GeometricPatternEffect {
    fn default() -> Self {
        Self::from_config(&EffectsConfig::default())
    }
}

impl EffectGenerator for GeometricPatternEffect {
    fn name(&self) -> &'static str {
        "geometric_patterns"
    }

    fn generate(&self, ctx: &EffectContext<'_>, rng: &mut EffectRng) -> Result<EffectClip> {
        let (duration, frames) = ctx.plan(None)?;
        let mut cycle = PatternCycle::new();

        let rendered = (0..frames)
            .map(|index| -> Result<Frame> {
                let time = ctx.frame_time(index);
                cycle.advance_for(time, ctx.sync, self.sync_window);
                let energy = ctx.energy.at_frame(index);
                let mut frame = Frame::transparent(ctx.size)?;
                self.draw_shapes(&mut frame, cycle.current(), energy, rng);
                Ok(frame)
            })
            .collect::<Result<Vec<_>>>()?;

        finish_clip(self.name(), duration, ctx, rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{seeded_rng, test_support::*};
    use super::*;
    use crate::{analysis::EnergyProfile, sync::SyncPoint};

    #[test]
    fn advances_once_per_triggering_frame() {
        let sync = SyncPoints::from_beats(&[0.5, 1.5, 2.5, 3.5], &[1.0; 4]).unwrap();
        let mut cycle = PatternCycle::new();
        let mut fired = 0;

        for i in 0..40 {
            let time = i as f32 / 10.0;
            fired += cycle.advance_for(time, &sync, 0.04);
        }

        // Only the frames landing exactly on each beat are inside the window.
        assert_eq!(fired, 4);
        assert_eq!(cycle.index(), 4 % 3);
        assert_eq!(cycle.current(), PatternKind::Triangles);
    }

    #[test]
    fn coincident_points_each_advance() {
        let sync = SyncPoints::new(vec![SyncPoint::new(1.0, 0.5), SyncPoint::new(1.0, 0.9)]).unwrap();
        let mut cycle = PatternCycle::new();

        assert_eq!(cycle.advance_for(1.0, &sync, 0.1), 2);
        assert_eq!(cycle.current(), PatternKind::Squares);
    }

    #[test]
    fn index_after_n_triggers_is_n_mod_three() {
        for n in 0..10usize {
            let times: Vec<f32> = (0..n).map(|k| k as f32).collect();
            let sync = SyncPoints::from_beats(&times, &vec![1.0; n]).unwrap();
            let mut cycle = PatternCycle::new();
            for k in 0..n {
                cycle.advance_for(k as f32, &sync, 0.1);
            }
            assert_eq!(cycle.index(), n % 3);
        }
    }

    #[test]
    fn quiet_frames_draw_no_shapes() {
        let energy = EnergyProfile::from_values(vec![0.0, 1.0], 512).unwrap();
        let sync = SyncPoints::empty();
        let ctx = EffectContext::new(0.2, 10, size(), &energy, &sync);

        let config = EffectsConfig {
            pattern_base_size: 8.0,
            ..EffectsConfig::default()
        };
        let clip = GeometricPatternEffect::from_config(&config)
            .generate(&ctx, &mut seeded_rng(5))
            .unwrap();

        assert!(clip.frames()[0].is_transparent());
        assert!(!clip.frames()[1].is_transparent());
    }
}
