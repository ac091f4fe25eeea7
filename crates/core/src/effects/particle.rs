use std::f32::consts::TAU;

use rand::Rng;

use super::{finish_clip, EffectContext, EffectGenerator, EffectRng};
use crate::{
    canvas::{with_alpha, wrap, Frame, Rgba},
    clip::EffectClip,
    config::{CanvasSize, EffectsConfig},
    Result,
};

const PARTICLE_COLOR: Rgba = [255, 255, 255, 255];
const SIZE_RANGE: std::ops::Range<f32> = 2.0..8.0;
const SPEED_RANGE: std::ops::Range<f32> = 1.0..5.0;

/// A single drifting particle in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub speed: f32,
    /// Heading in radians.
    pub angle: f32,
}

/// Particle population owned by a single generation call.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    width: f32,
    height: f32,
    jitter: f32,
}

impl ParticleField {
    pub fn spawn(count: usize, size: CanvasSize, jitter: f32, rng: &mut EffectRng) -> Self {
        let width = size.width as f32;
        let height = size.height as f32;
        let particles = (0..count)
            .map(|_| Particle {
                x: rng.random_range(0.0..width),
                y: rng.random_range(0.0..height),
                size: rng.random_range(SIZE_RANGE),
                speed: rng.random_range(SPEED_RANGE),
                angle: rng.random_range(0.0..TAU),
            })
            .collect();
        Self {
            particles,
            width,
            height,
            jitter,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Moves every particle along its heading by `speed * energy`, wrapping at
    /// the canvas edges, then perturbs each heading by at most `jitter`.
    pub fn step(&mut self, energy: f32, rng: &mut EffectRng) {
        let jitter = self.jitter;
        for particle in &mut self.particles {
            let distance = particle.speed * energy;
            particle.x = wrap(particle.x + distance * particle.angle.cos(), self.width);
            particle.y = wrap(particle.y + distance * particle.angle.sin(), self.height);
            particle.angle += rng.random_range(-jitter..=jitter);
        }
    }

    pub fn draw(&self, frame: &mut Frame, energy: f32) {
        let color = with_alpha(PARTICLE_COLOR, energy);
        for particle in &self.particles {
            frame.fill_circle(particle.x, particle.y, particle.size * (1.0 + energy), color);
        }
    }
}

/// Energy-driven particle drift.
#[derive(Debug, Clone)]
pub struct ParticleEffect {
    count: usize,
    jitter: f32,
}

impl ParticleEffect {
    pub fn new(count: usize, jitter: f32) -> Self {
        Self { count, jitter }
    }

    pub fn from_config(config: &EffectsConfig) -> Self {
        Self::new(config.particle_count, config.particle_jitter)
    }
}

impl Default for ParticleEffect {
    fn default() -> Self {
        Self::from_config(&EffectsConfig::default())
    }
}

impl EffectGenerator for ParticleEffect {
    fn name(&self) -> &'static str {
        "particles"
    }

    fn generate(&self, ctx: &EffectContext<'_>, rng: &mut EffectRng) -> Result<EffectClip> {
        let (duration, frames) = ctx.plan(None)?;
        let mut field = ParticleField::spawn(self.count, ctx.size, self.jitter, rng);

        let rendered = (0..frames)
            .map(|index| -> Result<Frame> {
                let energy = ctx.energy.at_frame(index);
                field.step(energy, rng);
                let mut frame = Frame::transparent(ctx.size)?;
                field.draw(&mut frame, energy);
                Ok(frame)
            })
            .collect::<Result<Vec<_>>>()?;

        finish_clip(self.name(), duration, ctx, rendered)
    }
}
