//! Core library for the Music FX renderer.
//!
//! Turns audio features (a normalised energy profile and beat sync points)
//! into audio-reactive RGBA frame sequences. Each module owns one stage:
//! energy analysis, sync point handling, the per-effect simulations, the
//! compositor and theme selection. Decoding audio and encoding video are left
//! to the caller.

pub mod analysis;
pub mod canvas;
pub mod clip;
pub mod compositor;
pub mod config;
pub mod effects;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod post;
pub mod sync;
pub mod theme;

pub use analysis::EnergyProfile;
pub use canvas::{Frame, Rgba};
pub use clip::{frame_count, ClipInfo, EffectClip};
pub use compositor::{Backdrop, Compositor};
pub use config::{AnalysisConfig, AppConfig, CanvasSize, EffectsConfig, RenderConfig};
pub use effects::{
    seeded_rng, BokehEffect, EffectContext, EffectGenerator, EffectKind, EffectRng,
    GeometricPatternEffect, LightFlareEffect, ParticleEffect,
};
pub use error::{FxError, Result};
pub use features::AudioFeatures;
pub use pipeline::BackgroundRenderer;
pub use post::{apply_post_effects, ColorGrading, PostEffect};
pub use sync::{SyncPoint, SyncPoints};
pub use theme::Theme;
