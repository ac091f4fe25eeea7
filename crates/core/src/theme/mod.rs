use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{effects::EffectKind, FxError};

/// Visual themes a background can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Realistic,
    Animated,
    Abstract,
    Cinematic,
}

impl Theme {
    pub const ALL: [Theme; 4] = [
        Self::Realistic,
        Self::Animated,
        Self::Abstract,
        Self::Cinematic,
    ];

    /// Effects to run for this theme, bottom layer first.
    ///
    /// `Animated` has no effect set of its own and reuses the abstract layers;
    /// `Cinematic` likewise reuses the realistic lighting layers.
    pub fn effects(self) -> &'static [EffectKind] {
        const ABSTRACT: &[EffectKind] = &[EffectKind::Particle, EffectKind::GeometricPattern];
        const REALISTIC: &[EffectKind] = &[EffectKind::LightFlare, EffectKind::Bokeh];

        match self {
            Self::Abstract | Self::Animated => ABSTRACT,
            Self::Realistic | Self::Cinematic => REALISTIC,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Realistic => "realistic",
            Self::Animated => "animated",
            Self::Abstract => "abstract",
            Self::Cinematic => "cinematic",
        }
    }
}

impl FromStr for Theme {
    type Err = FxError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str() == wanted)
            .ok_or_else(|| FxError::UnsupportedTheme(value.to_string()))
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
