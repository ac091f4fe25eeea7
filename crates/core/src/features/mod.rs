use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    analysis::EnergyProfile, config::AnalysisConfig, sync::SyncPoints, FxError, Result,
};

/// Audio features handed over by the decoder and beat detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub sample_rate: u32,
    /// Length of the analysed audio in seconds.
    pub duration: f32,
    pub energy: EnergyProfile,
    #[serde(default)]
    pub sync_points: SyncPoints,
}

impl AudioFeatures {
    /// Builds the feature record from decoded mono samples and detector
    /// output.
    pub fn from_analysis(
        samples: &[f32],
        sample_rate: u32,
        beat_times: &[f32],
        beat_strengths: &[f32],
        config: &AnalysisConfig,
    ) -> Result<Self> {
        if sample_rate == 0 {
            return Err(FxError::invalid("sample rate must be positive"));
        }
        let energy = EnergyProfile::compute(samples, config.frame_length, config.hop_length)?;
        let sync_points = SyncPoints::from_beats(beat_times, beat_strengths)?;

        Ok(Self {
            sample_rate,
            duration: samples.len() as f32 / sample_rate as f32,
            energy,
            sync_points,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let features: Self = serde_json::from_str(json)?;
        if features.sample_rate == 0 {
            return Err(FxError::invalid("sample rate must be positive"));
        }
        Ok(features)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
