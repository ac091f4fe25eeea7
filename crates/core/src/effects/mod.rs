//! Procedural effect generators.
//!
//! Every generator is a sequential, per-frame simulation: state such as
//! particle lists is created at the start of [`EffectGenerator::generate`],
//! mutated once per output frame and dropped when the clip is returned. The
//! only shared inputs are read-only borrows, so different generators can run
//! on different threads without coordination.

mod bokeh;
mod flare;
mod geometric;
mod particle;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub use bokeh::{BokehEffect, BokehField, BokehPoint};
pub use flare::LightFlareEffect;
pub use geometric::{GeometricPatternEffect, PatternCycle, PatternKind};
pub use particle::{Particle, ParticleEffect, ParticleField};

use crate::{
    analysis::EnergyProfile,
    canvas::Frame,
    clip::{frame_count, EffectClip},
    config::{CanvasSize, EffectsConfig},
    sync::SyncPoints,
    FxError, Result,
};

/// Seedable random source injected into every generator.
pub type EffectRng = ChaCha8Rng;

pub fn seeded_rng(seed: u64) -> EffectRng {
    EffectRng::seed_from_u64(seed)
}

/// Read-only inputs shared by all generators for one render.
#[derive(Debug, Clone, Copy)]
pub struct EffectContext<'a> {
    /// Clip length in seconds. Generators with a natural fallback (the light
    /// flare uses the last sync point) accept `None`.
    pub duration: Option<f32>,
    pub fps: u32,
    pub size: CanvasSize,
    pub energy: &'a EnergyProfile,
    pub sync: &'a SyncPoints,
}

impl<'a> EffectContext<'a> {
    pub fn new(
        duration: f32,
        fps: u32,
        size: CanvasSize,
        energy: &'a EnergyProfile,
        sync: &'a SyncPoints,
    ) -> Self {
        Self {
            duration: Some(duration),
            fps,
            size,
            energy,
            sync,
        }
    }

    /// Resolves the clip duration and output frame count, validating timing
    /// and canvas size before any simulation work starts.
    pub fn plan(&self, fallback: Option<f32>) -> Result<(f32, usize)> {
        if self.size.width == 0 || self.size.height == 0 {
            return Err(FxError::invalid("canvas width and height must be positive"));
        }
        let duration = self
            .duration
            .or(fallback)
            .ok_or_else(|| FxError::invalid("no clip duration given and none can be inferred"))?;
        let frames = frame_count(duration, self.fps)?;
        Ok((duration, frames))
    }

    /// Timestamp of output frame `index`.
    pub fn frame_time(&self, index: usize) -> f32 {
        index as f32 / self.fps as f32
    }
}

/// A procedural effect that renders a whole clip from audio features.
pub trait EffectGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Renders the clip. Either every frame is produced or an error is
    /// returned; partial clips are never handed out.
    fn generate(&self, ctx: &EffectContext<'_>, rng: &mut EffectRng) -> Result<EffectClip>;
}

/// The effects a theme can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Particle,
    GeometricPattern,
    LightFlare,
    Bokeh,
}

impl EffectKind {
    pub fn build(self, config: &EffectsConfig) -> Box<dyn EffectGenerator> {
        match self {
            Self::Particle => Box::new(ParticleEffect::from_config(config)),
            Self::GeometricPattern => Box::new(GeometricPatternEffect::from_config(config)),
            Self::LightFlare => Box::new(LightFlareEffect::from_config(config)),
            Self::Bokeh => Box::new(BokehEffect::from_config(config)),
        }
    }
}

fn finish_clip(
    name: &'static str,
    duration: f32,
    ctx: &EffectContext<'_>,
    frames: Vec<Frame>,
) -> Result<EffectClip> {
    tracing::debug!(effect = name, frames = frames.len(), duration, "generated effect clip");
    EffectClip::new(name, duration, ctx.fps, ctx.size, frames)
}
