use rayon::prelude::*;

use crate::{
    canvas::{Frame, Rgba},
    clip::{frame_count, EffectClip},
    config::CanvasSize,
    FxError, Result,
};

/// Base layer of a composition: a still canvas held for `duration` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    frame: Frame,
    duration: f32,
}

impl Backdrop {
    pub fn new(frame: Frame, duration: f32) -> Self {
        Self { frame, duration }
    }

    pub fn solid(size: CanvasSize, color: Rgba, duration: f32) -> Result<Self> {
        Ok(Self::new(Frame::filled(size, color)?, duration))
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }
}

/// Stacks effect clips over a backdrop.
///
/// Clips are layered in input order, later clips on top, with straight-alpha
/// source-over blending. The output always spans the backdrop's duration.
/// A clip shorter than that holds its final frame (freeze-extend); a longer
/// one is cut. Empty clips contribute nothing.
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    fps: u32,
}

impl Compositor {
    pub fn new(fps: u32) -> Self {
        Self { fps }
    }

    pub fn composite(&self, base: &Backdrop, effects: &[EffectClip]) -> Result<EffectClip> {
        let frames = frame_count(base.duration, self.fps)?;
        let size = base.frame.size();

        for clip in effects {
            if clip.size() != size {
                return Err(FxError::invalid(format!(
                    "clip `{}` is {}x{} but the backdrop is {}x{}",
                    clip.name(),
                    clip.size().width,
                    clip.size().height,
                    size.width,
                    size.height
                )));
            }
            if clip.fps() != self.fps {
                return Err(FxError::invalid(format!(
                    "clip `{}` runs at {} fps but the composition runs at {}",
                    clip.name(),
                    clip.fps(),
                    self.fps
                )));
            }
            if clip.is_empty() {
                tracing::warn!(clip = clip.name(), "skipping empty effect clip");
            } else if clip.len() < frames {
                tracing::warn!(
                    clip = clip.name(),
                    have = clip.len(),
                    need = frames,
                    "effect clip is short; holding its last frame"
                );
            }
        }

        let composed = (0..frames)
            .into_par_iter()
            .map(|index| -> Result<Frame> {
                let mut frame = base.frame.clone();
                for clip in effects {
                    if let Some(layer) = clip.frame_or_last(index) {
                        frame.draw_layer(layer)?;
                    }
                }
                Ok(frame)
            })
            .collect::<Result<Vec<_>>>()?;

        EffectClip::new("composite", base.duration, self.fps, size, composed)
    }
}
