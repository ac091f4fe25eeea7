use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{FxError, Result};

/// A detected beat: timestamp in seconds and a strength in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncPoint {
    pub time: f32,
    pub strength: f32,
}

impl SyncPoint {
    pub fn new(time: f32, strength: f32) -> Self {
        Self { time, strength }
    }

    fn validate(&self) -> Result<()> {
        if !self.time.is_finite() || self.time < 0.0 {
            return Err(FxError::invalid(format!(
                "sync point time {} must be finite and non-negative",
                self.time
            )));
        }
        if !self.strength.is_finite() || !(0.0..=1.0).contains(&self.strength) {
            return Err(FxError::invalid(format!(
                "sync point strength {} must lie within [0, 1]",
                self.strength
            )));
        }
        Ok(())
    }
}

/// Time-ordered list of sync points. Times need not be unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SyncPoint>", into = "Vec<SyncPoint>")]
pub struct SyncPoints {
    points: Vec<SyncPoint>,
}

impl SyncPoints {
    pub fn new(points: Vec<SyncPoint>) -> Result<Self> {
        for point in &points {
            point.validate()?;
        }
        let mut points = points;
        points.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));
        Ok(Self { points })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Pairs detector output into sync points.
    pub fn from_beats(times: &[f32], strengths: &[f32]) -> Result<Self> {
        if times.len() != strengths.len() {
            return Err(FxError::invalid(format!(
                "{} beat times but {} beat strengths",
                times.len(),
                strengths.len()
            )));
        }
        Self::new(
            times
                .iter()
                .zip(strengths)
                .map(|(&time, &strength)| SyncPoint::new(time, strength))
                .collect(),
        )
    }

    /// Keeps only the points at least as strong as `threshold`.
    pub fn strong(&self, threshold: f32) -> Self {
        Self {
            points: self
                .points
                .iter()
                .copied()
                .filter(|point| point.strength >= threshold)
                .collect(),
        }
    }

    /// Points whose time lies strictly within `window` seconds of `time`.
    pub fn near(&self, time: f32, window: f32) -> impl Iterator<Item = &SyncPoint> + '_ {
        let start = self
            .points
            .partition_point(|point| point.time <= time - window);
        self.points[start..]
            .iter()
            .take_while(move |point| point.time < time + window)
            .filter(move |point| (point.time - time).abs() < window)
    }

    pub fn last_time(&self) -> Option<f32> {
        self.points.last().map(|point| point.time)
    }

    pub fn points(&self) -> &[SyncPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl TryFrom<Vec<SyncPoint>> for SyncPoints {
    type Error = FxError;

    fn try_from(points: Vec<SyncPoint>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<SyncPoints> for Vec<SyncPoint> {
    fn from(value: SyncPoints) -> Self {
        value.points
    }
}
