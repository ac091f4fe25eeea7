use serde::{Deserialize, Serialize};

use crate::{FxError, Result};

/// Normalised per-analysis-frame loudness signal.
///
/// Values lie in `[0, 1]`; after [`EnergyProfile::compute`] the minimum is 0
/// and the maximum is 1 unless every raw RMS value was identical, in which
/// case the profile is all zeros. A profile is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEnergyProfile")]
pub struct EnergyProfile {
    values: Vec<f32>,
    hop_length: usize,
}

#[derive(Deserialize)]
struct RawEnergyProfile {
    values: Vec<f32>,
    #[serde(default = "default_hop_length")]
    hop_length: usize,
}

fn default_hop_length() -> usize {
    512
}

impl TryFrom<RawEnergyProfile> for EnergyProfile {
    type Error = FxError;

    fn try_from(raw: RawEnergyProfile) -> Result<Self> {
        Self::from_values(raw.values, raw.hop_length)
    }
}

impl EnergyProfile {
    /// Frames `samples` into windows of `frame_length` with stride
    /// `hop_length`, takes the RMS of each window and min-max scales the
    /// result. Trailing samples that do not fill a whole window are dropped.
    pub fn compute(samples: &[f32], frame_length: usize, hop_length: usize) -> Result<Self> {
        if frame_length == 0 || hop_length == 0 {
            return Err(FxError::invalid(
                "frame_length and hop_length must be positive",
            ));
        }
        if samples.len() < frame_length {
            return Err(FxError::invalid(format!(
                "{} samples cannot fill a single frame of {frame_length}",
                samples.len()
            )));
        }
        if samples.iter().any(|sample| !sample.is_finite()) {
            return Err(FxError::invalid("samples must be finite"));
        }

        let frame_count = 1 + (samples.len() - frame_length) / hop_length;
        let rms: Vec<f32> = (0..frame_count)
            .map(|index| {
                let start = index * hop_length;
                compute_rms(&samples[start..start + frame_length])
            })
            .collect();

        let values = match normalize(&rms) {
            Ok(values) => values,
            Err(FxError::DegenerateNormalization) => {
                tracing::warn!(
                    frames = frame_count,
                    "energy is constant across all frames; using an all-zero profile"
                );
                vec![0.0; frame_count]
            }
            Err(other) => return Err(other),
        };

        Ok(Self { values, hop_length })
    }

    /// Wraps an already normalised profile, e.g. one handed over by an
    /// external analyser.
    pub fn from_values(values: Vec<f32>, hop_length: usize) -> Result<Self> {
        if values.is_empty() {
            return Err(FxError::invalid("energy profile is empty"));
        }
        if hop_length == 0 {
            return Err(FxError::invalid("hop_length must be positive"));
        }
        if values
            .iter()
            .any(|value| !value.is_finite() || !(0.0..=1.0).contains(value))
        {
            return Err(FxError::invalid("energy values must lie within [0, 1]"));
        }
        Ok(Self { values, hop_length })
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Energy for output frame `index`.
    ///
    /// The profile is indexed by output frame number and clamped to its last
    /// entry; it is not resampled to the output frame rate.
    pub fn at_frame(&self, index: usize) -> f32 {
        let last = self.values.len().saturating_sub(1);
        self.values.get(index.min(last)).copied().unwrap_or(0.0)
    }

    /// Start time in seconds of analysis frame `index`.
    pub fn time_of(&self, index: usize, sample_rate: u32) -> f32 {
        if sample_rate == 0 {
            return 0.0;
        }
        (index * self.hop_length) as f32 / sample_rate as f32
    }
}

/// Strict min-max scaling to `[0, 1]`.
pub fn normalize(values: &[f32]) -> Result<Vec<f32>> {
    if values.is_empty() {
        return Err(FxError::invalid("cannot normalise an empty sequence"));
    }

    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return Err(FxError::DegenerateNormalization);
    }

    Ok(values
        .iter()
        .map(|value| ((value - min) / range).clamp(0.0, 1.0))
        .collect())
}

fn compute_rms(samples: &[f32]) -> f32 {
    let sum: f32 = samples.iter().map(|sample| sample * sample).sum();
    (sum / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn silence_falls_back_to_zero_profile() {
        let profile = EnergyProfile::compute(&[0.0; 4096], 2048, 512).unwrap();

        assert_eq!(profile.values(), &[0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn drops_trailing_partial_frame() {
        let profile = EnergyProfile::compute(&[0.5; 4100], 2048, 512).unwrap();
        assert_eq!(profile.len(), 5);
    }

    #[test]
    fn ramps_scale_to_unit_range() {
        let samples: Vec<f32> = (0..8).flat_map(|block| vec![block as f32 * 0.1; 4]).collect();
        let profile = EnergyProfile::compute(&samples, 4, 4).unwrap();

        assert_eq!(profile.len(), 8);
        assert_eq!(profile.values()[0], 0.0);
        assert!((profile.values()[7] - 1.0).abs() < 1e-6);
        assert!(profile.values().windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn rejects_short_input_and_zero_framing() {
        assert!(matches!(
            EnergyProfile::compute(&[0.1; 100], 2048, 512),
            Err(FxError::InvalidInput(_))
        ));
        assert!(matches!(
            EnergyProfile::compute(&[0.1; 100], 0, 512),
            Err(FxError::InvalidInput(_))
        ));
        assert!(matches!(
            EnergyProfile::compute(&[0.1; 100], 10, 0),
            Err(FxError::InvalidInput(_))
        ));
    }

    #[test]
    fn strict_normalisation_reports_degenerate_input() {
        assert!(matches!(
            normalize(&[0.3, 0.3, 0.3]),
            Err(FxError::DegenerateNormalization)
        ));
    }

    #[test]
    fn frame_lookup_clamps_to_last_entry() {
        let profile = EnergyProfile::from_values(vec![0.0, 0.5, 1.0], 512).unwrap();

        assert_eq!(profile.at_frame(1), 0.5);
        assert_eq!(profile.at_frame(40), 1.0);
    }

    #[test]
    fn maps_frame_index_to_time() {
        let profile = EnergyProfile::from_values(vec![0.0; 4], 512).unwrap();
        assert!((profile.time_of(2, 22_050) - 1024.0 / 22_050.0).abs() < 1e-7);
    }

    #[test]
    fn deserialisation_validates_values() {
        let ok: EnergyProfile = serde_json::from_str(r#"{ "values": [0.0, 1.0] }"#).unwrap();
        assert_eq!(ok.hop_length(), 512);

        assert!(serde_json::from_str::<EnergyProfile>(r#"{ "values": [] }"#).is_err());
        assert!(serde_json::from_str::<EnergyProfile>(r#"{ "values": [1.5] }"#).is_err());
    }

    proptest! {
        #[test]
        fn normalised_profile_spans_unit_interval(
            samples in prop::collection::vec(-1.0f32..1.0, 64..512),
            frame_length in 1usize..64,
            hop_length in 1usize..32,
        ) {
            let profile = EnergyProfile::compute(&samples, frame_length, hop_length).unwrap();
            let values = profile.values();

            prop_assert_eq!(values.len(), 1 + (samples.len() - frame_length) / hop_length);
            prop_assert!(values.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));

            let max = values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let min = values.iter().cloned().fold(f32::INFINITY, f32::min);
            prop_assert_eq!(min, 0.0);
            prop_assert!(max == 1.0 || max == 0.0);
        }
    }
}
