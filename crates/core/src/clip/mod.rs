use serde::{Deserialize, Serialize};

use crate::{canvas::Frame, config::CanvasSize, FxError, Result};

/// Number of output frames for a clip: `floor(duration * fps)`.
pub fn frame_count(duration: f32, fps: u32) -> Result<usize> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(FxError::invalid(format!(
            "duration must be positive, got {duration}"
        )));
    }
    if fps == 0 {
        return Err(FxError::invalid("fps must be positive"));
    }
    Ok((duration * fps as f32).floor() as usize)
}

/// Metadata handed to the encoder alongside the frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipInfo {
    pub duration: f32,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub frames: usize,
}

/// A finite, ordered run of frames produced by one generator or by the
/// compositor. Frames are immutable once the clip has been built.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectClip {
    name: String,
    duration: f32,
    fps: u32,
    size: CanvasSize,
    frames: Vec<Frame>,
}

impl EffectClip {
    /// Assembles a clip, checking that every frame has the declared size.
    pub fn new(
        name: impl Into<String>,
        duration: f32,
        fps: u32,
        size: CanvasSize,
        frames: Vec<Frame>,
    ) -> Result<Self> {
        if let Some(bad) = frames.iter().find(|frame| frame.size() != size) {
            return Err(FxError::invalid(format!(
                "frame is {}x{} but clip is {}x{}",
                bad.width(),
                bad.height(),
                size.width,
                size.height
            )));
        }
        Ok(Self {
            name: name.into(),
            duration,
            fps,
            size,
            frames,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `index`, holding the final frame for indices past the end.
    pub fn frame_or_last(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index).or_else(|| self.frames.last())
    }

    pub fn info(&self) -> ClipInfo {
        ClipInfo {
            duration: self.duration,
            fps: self.fps,
            width: self.size.width,
            height: self.size.height,
            frames: self.frames.len(),
        }
    }

    pub(crate) fn frames_mut(&mut self) -> &mut [Frame] {
        &mut self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_count_floors_product() {
        assert_eq!(frame_count(2.0, 30).unwrap(), 60);
        assert_eq!(frame_count(1.05, 10).unwrap(), 10);
        assert_eq!(frame_count(0.01, 30).unwrap(), 0);
    }

    #[test]
    fn frame_count_rejects_bad_timing() {
        assert!(frame_count(0.0, 30).is_err());
        assert!(frame_count(-1.0, 30).is_err());
        assert!(frame_count(f32::NAN, 30).is_err());
        assert!(frame_count(1.0, 0).is_err());
    }

    #[test]
    fn holds_last_frame_past_end() {
        let size = CanvasSize::new(2, 2);
        let first = Frame::filled(size, [1, 1, 1, 255]).unwrap();
        let last = Frame::filled(size, [9, 9, 9, 255]).unwrap();
        let clip = EffectClip::new("test", 0.2, 10, size, vec![first, last.clone()]).unwrap();

        assert_eq!(clip.frame_or_last(7), Some(&last));
        assert_eq!(clip.info().frames, 2);
    }

    #[test]
    fn rejects_mismatched_frame_sizes() {
        let frame = Frame::transparent(CanvasSize::new(3, 3)).unwrap();
        assert!(EffectClip::new("bad", 1.0, 1, CanvasSize::new(2, 2), vec![frame]).is_err());
    }
}
