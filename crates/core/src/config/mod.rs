use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{post::PostEffect, FxError, Result};

/// Top-level configuration structure for the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub render: RenderConfig,
    pub effects: EffectsConfig,
    /// Passes applied to the composited clip, in order.
    pub post: Vec<PostEffect>,
}

impl AppConfig {
    /// Parses a (possibly partial) JSON document; missing fields keep their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.analysis.frame_length == 0 || self.analysis.hop_length == 0 {
            return Err(FxError::invalid(
                "analysis frame_length and hop_length must be positive",
            ));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(FxError::invalid("canvas width and height must be positive"));
        }
        if self.render.fps == 0 {
            return Err(FxError::invalid("fps must be positive"));
        }
        self.effects.validate()?;
        for effect in &self.post {
            effect.validate()?;
        }
        Ok(())
    }
}

/// Framing used when deriving the energy profile from raw samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub frame_length: usize,
    pub hop_length: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_length: 2048,
            hop_length: 512,
        }
    }
}

/// Output canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const PORTRAIT_HD: Self = Self::new(1080, 1920);
    pub const PORTRAIT_SD: Self = Self::new(720, 1280);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::PORTRAIT_HD
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Base seed; every effect slot derives its own stream from it.
    pub seed: u64,
    /// Backdrop colour as straight RGBA.
    pub background: [u8; 4],
}

impl RenderConfig {
    pub fn canvas(&self) -> CanvasSize {
        CanvasSize::new(self.width, self.height)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        let size = CanvasSize::default();
        Self {
            width: size.width,
            height: size.height,
            fps: 30,
            seed: 0,
            background: [0, 0, 0, 255],
        }
    }
}

/// Tunables for the procedural effect generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Maximum distance in seconds between a frame and a sync point for the
    /// point to count as "hit" on that frame.
    pub sync_window: f32,
    pub particle_count: usize,
    /// Bound of the per-frame heading perturbation, in radians.
    pub particle_jitter: f32,
    pub pattern_max_shapes: usize,
    pub pattern_base_size: f32,
    pub flare_blur_radius: f32,
    pub flare_streak_min: f32,
    pub flare_streak_max: f32,
    pub bokeh_count: usize,
    pub bokeh_blur_radius: f32,
    /// Maximum positional drift per frame, in pixels.
    pub bokeh_drift: f32,
}

impl EffectsConfig {
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("sync_window", self.sync_window),
            ("particle_jitter", self.particle_jitter),
            ("pattern_base_size", self.pattern_base_size),
            ("flare_blur_radius", self.flare_blur_radius),
            ("flare_streak_min", self.flare_streak_min),
            ("bokeh_blur_radius", self.bokeh_blur_radius),
            ("bokeh_drift", self.bokeh_drift),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(FxError::invalid(format!(
                    "effects.{name} must be a finite, non-negative number"
                )));
            }
        }
        if !self.flare_streak_max.is_finite() || self.flare_streak_max < self.flare_streak_min {
            return Err(FxError::invalid(
                "effects.flare_streak_max must not be below flare_streak_min",
            ));
        }
        Ok(())
    }
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            sync_window: 0.1,
            particle_count: 100,
            particle_jitter: 0.1,
            pattern_max_shapes: 10,
            pattern_base_size: 60.0,
            flare_blur_radius: 5.0,
            flare_streak_min: 100.0,
            flare_streak_max: 300.0,
            bokeh_count: 30,
            bokeh_blur_radius: 3.0,
            bokeh_drift: 2.0,
        }
    }
}
