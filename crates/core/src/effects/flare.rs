use std::f32::consts::FRAC_PI_4;

use rand::Rng;

use super::{finish_clip, EffectContext, EffectGenerator, EffectRng};
use crate::{
    canvas::{with_alpha, Frame, Rgba},
    clip::EffectClip,
    config::EffectsConfig,
    sync::SyncPoint,
    Result,
};

const FLARE_COLOR: Rgba = [255, 244, 214, 255];
/// Radius of the burst for a full-strength beat, in pixels.
const MAX_BURST_RADIUS: f32 = 500.0;
const RING_STEP: f32 = 10.0;
const STREAK_COUNT: usize = 8;
const STREAK_OPACITY: f32 = 0.5;
const STREAK_WIDTH: f32 = 2.0;

/// Radial bursts with eight streaks, fired on frames close to a sync point.
#[derive(Debug, Clone)]
pub struct LightFlareEffect {
    sync_window: f32,
    blur_radius: f32,
    streak_min: f32,
    streak_max: f32,
}

impl LightFlareEffect {
    pub fn from_config(config: &EffectsConfig) -> Self {
        Self {
            sync_window: config.sync_window,
            blur_radius: config.flare_blur_radius,
            streak_min: config.flare_streak_min,
            streak_max: config.flare_streak_max,
        }
    }

    fn draw_flare(&self, frame: &mut Frame, point: &SyncPoint, time: f32, rng: &mut EffectRng) {
        let proximity = (1.0 - (time - point.time).abs() / self.sync_window).clamp(0.0, 1.0);
        let cx = frame.width() as f32 * 0.5;
        let cy = frame.height() as f32 * 0.5;

        let max_radius = MAX_BURST_RADIUS * point.strength;
        let rings = (max_radius / RING_STEP).ceil() as usize;
        for ring in 0..rings {
            let radius = max_radius - ring as f32 * RING_STEP;
            let ratio = radius / max_radius;
            let alpha = (1.0 - ratio) * proximity;
            frame.fill_circle(cx, cy, radius, with_alpha(FLARE_COLOR, alpha));
        }

        let streak_color = with_alpha(FLARE_COLOR, STREAK_OPACITY * proximity * point.strength);
        for k in 0..STREAK_COUNT {
            let angle = k as f32 * FRAC_PI_4;
            let length = rng.random_range(self.streak_min..=self.streak_max);
            let end = (cx + length * angle.cos(), cy + length * angle.sin());
            frame.draw_line((cx, cy), end, STREAK_WIDTH, streak_color);
        }
    }
}

impl Default for LightFlareEffect {
    fn default() -> Self {
        Self::from_config(&EffectsConfig::default())
    }
}

impl EffectGenerator for LightFlareEffect {
    fn name(&self) -> &'static str {
        "light_flares"
    }

    /// Without an explicit duration the clip ends at the last sync point.
    fn generate(&self, ctx: &EffectContext<'_>, rng: &mut EffectRng) -> Result<EffectClip> {
        let (duration, frames) = ctx.plan(ctx.sync.last_time())?;

        let rendered = (0..frames)
            .map(|index| -> Result<Frame> {
                let time = ctx.frame_time(index);
                let mut frame = Frame::transparent(ctx.size)?;
                for point in ctx.sync.near(time, self.sync_window) {
                    self.draw_flare(&mut frame, point, time, rng);
                }
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
    use crate::{sync::SyncPoints, FxError};

    #[test]
    fn flares_near_beats_and_stays_dark_elsewhere() {
        let energy = ramp_energy(4);
        let sync = SyncPoints::new(vec![SyncPoint::new(1.0, 0.8)]).unwrap();
        let ctx = EffectContext::new(6.0, 50, size(), &energy, &sync);

        let clip = LightFlareEffect::default()
            .generate(&ctx, &mut seeded_rng(7))
            .unwrap();
        assert_eq!(clip.len(), 300);

        // Frame 51 is t = 1.02 s.
        let near = &clip.frames()[51];
        assert!(near.max_alpha_in(12, 20, 20, 28) > 0);

        // Frame 250 is t = 5.0 s.
        assert!(clip.frames()[250].is_transparent());
    }

    #[test]
    fn duration_defaults_to_last_sync_point() {
        let energy = ramp_energy(4);
        let sync = SyncPoints::from_beats(&[0.5, 2.0], &[0.4, 0.9]).unwrap();
        let ctx = EffectContext {
            duration: None,
            ..EffectContext::new(1.0, 10, size(), &energy, &sync)
        };

        let clip = LightFlareEffect::default()
            .generate(&ctx, &mut seeded_rng(0))
            .unwrap();

        assert_eq!(clip.duration(), 2.0);
        assert_eq!(clip.len(), 20);
    }

    #[test]
    fn missing_duration_without_sync_points_is_invalid() {
        let energy = ramp_energy(4);
        let sync = SyncPoints::empty();
        let ctx = EffectContext {
            duration: None,
            ..EffectContext::new(1.0, 10, size(), &energy, &sync)
        };

        let err = LightFlareEffect::default()
            .generate(&ctx, &mut seeded_rng(0))
            .unwrap_err();
        assert!(matches!(err, FxError::InvalidInput(_)));
    }

    #[test]
    fn exact_hit_is_brighter_than_edge_of_window() {
        let energy = ramp_energy(4);
        let sync = SyncPoints::new(vec![SyncPoint::new(1.0, 0.1)]).unwrap();
        let ctx = EffectContext::new(1.2, 100, size(), &energy, &sync);

        let clip = LightFlareEffect::default()
            .generate(&ctx, &mut seeded_rng(2))
            .unwrap();

        let centre = |index: usize| clip.frames()[index].pixel(16, 24).unwrap()[3];
        assert!(centre(100) > centre(108));
    }
}
