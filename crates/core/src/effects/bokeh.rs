use rand::Rng;

use super::{finish_clip, EffectContext, EffectGenerator, EffectRng};
use crate::{
    canvas::{with_alpha, wrap, Frame, Rgba},
    clip::EffectClip,
    config::{CanvasSize, EffectsConfig},
    Result,
};

const SIZE_RANGE: std::ops::Range<f32> = 10.0..50.0;
const GRADIENT_STEPS: usize = 8;
const PEAK_OPACITY: f32 = 0.3;

/// One soft out-of-focus highlight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BokehPoint {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone)]
pub struct BokehField {
    points: Vec<BokehPoint>,
    width: f32,
    height: f32,
    drift: f32,
}

impl BokehField {
    pub fn spawn(count: usize, size: CanvasSize, drift: f32, rng: &mut EffectRng) -> Self {
        let width = size.width as f32;
        let height = size.height as f32;
        let points = (0..count)
            .map(|_| BokehPoint {
                x: rng.random_range(0.0..width),
                y: rng.random_range(0.0..height),
                size: rng.random_range(SIZE_RANGE),
                color: [
                    rng.random_range(128..=255),
                    rng.random_range(128..=255),
                    rng.random_range(128..=255),
                    255,
                ],
            })
            .collect();
        Self {
            points,
            width,
            height,
            drift,
        }
    }

    pub fn points(&self) -> &[BokehPoint] {
        &self.points
    }

    /// Random walk of at most `drift` pixels per axis, wrapping at the edges.
    pub fn step(&mut self, rng: &mut EffectRng) {
        let drift = self.drift;
        for point in &mut self.points {
            point.x = wrap(point.x + rng.random_range(-drift..=drift), self.width);
            point.y = wrap(point.y + rng.random_range(-drift..=drift), self.height);
        }
    }

    /// Stacks concentric discs so opacity rises towards the centre; the
    /// radius pulses with `0.5 + energy`.
    pub fn draw(&self, frame: &mut Frame, energy: f32) {
        for point in &self.points {
            let radius = point.size * (0.5 + energy);
            for step in 0..GRADIENT_STEPS {
                let fraction = step as f32 / GRADIENT_STEPS as f32;
                let alpha = PEAK_OPACITY * (step + 1) as f32 / GRADIENT_STEPS as f32;
                frame.fill_circle(
                    point.x,
                    point.y,
                    radius * (1.0 - fraction),
                    with_alpha(point.color, alpha),
                );
            }
        }
    }
}

/// Drifting, energy-pulsed bokeh highlights.
#[derive(Debug, Clone)]
pub struct BokehEffect {
    count: usize,
    blur_radius: f32,
    drift: f32,
}

impl BokehEffect {
    pub fn from_config(config: &EffectsConfig) -> Self {
        Self {
            count: config.bokeh_count,
            blur_radius: config.bokeh_blur_radius,
            drift: config.bokeh_drift,
        }
    }
}

impl Default for BokehEffect {
    fn default() -> Self {
        Self::from_config(&EffectsConfig::default())
    }
}

impl EffectGenerator for BokehEffect {
    fn name(&self) -> &'static str {
        "bokeh"
    }

    fn generate(&self, ctx: &EffectContext<'_>, rng: &mut EffectRng) -> Result<EffectClip> {
        let (duration, frames) = ctx.plan(None)?;
        let mut field = BokehField::spawn(self.count, ctx.size, self.drift, rng);

        let rendered = (0..frames)
            .map(|index| -> Result<Frame> {
                let energy = ctx.energy.at_frame(index);
                field.step(rng);
                let mut frame = Frame::transparent(ctx.size)?;
                field.draw(&mut frame, energy);
                frame.gaussian_blur(self.blur_radius);
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
    use crate::{analysis::EnergyProfile, sync::SyncPoints};
    use proptest::prelude::*;

    fn covered_pixels(frame: &Frame) -> usize {
        frame.pixels().chunks_exact(4).filter(|px| px[3] > 0).count()
    }

    #[test]
    fn highlights_grow_with_energy() {
        let mut rng = seeded_rng(11);
        let field = BokehField::spawn(1, CanvasSize::new(200, 200), 0.0, &mut rng);

        let mut quiet = Frame::transparent(CanvasSize::new(200, 200)).unwrap();
        let mut loud = quiet.clone();
        field.draw(&mut quiet, 0.0);
        field.draw(&mut loud, 1.0);

        assert!(covered_pixels(&loud) > covered_pixels(&quiet));
    }

    #[test]
    fn every_frame_shows_highlights() {
        let energy = EnergyProfile::from_values(vec![0.0, 0.5, 1.0], 512).unwrap();
        let sync = SyncPoints::empty();
        let ctx = EffectContext::new(0.3, 10, size(), &energy, &sync);

        let clip = BokehEffect::default()
            .generate(&ctx, &mut seeded_rng(4))
            .unwrap();

        assert_eq!(clip.len(), 3);
        assert!(clip.frames().iter().all(|frame| !frame.is_transparent()));
    }

    proptest! {
        #[test]
        fn drift_stays_on_the_torus(seed in any::<u64>(), steps in 1usize..60) {
            let size = CanvasSize::new(9, 14);
            let mut rng = seeded_rng(seed);
            let mut field = BokehField::spawn(8, size, 25.0, &mut rng);

            for _ in 0..steps {
                field.step(&mut rng);
                for p in field.points() {
                    prop_assert!(p.x >= 0.0 && p.x < 9.0);
                    prop_assert!(p.y >= 0.0 && p.y < 14.0);
                }
            }
        }
    }
}
