use serde::{Deserialize, Serialize};

use crate::{canvas::Frame, clip::EffectClip, FxError, Result};

/// Multiplicative colour adjustments; `1.0` leaves a channel unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorGrading {
    pub brightness: f32,
    /// Scales distance from mid grey.
    pub contrast: f32,
    /// Scales distance from the pixel's luma.
    pub saturation: f32,
}

impl Default for ColorGrading {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
        }
    }
}

impl ColorGrading {
    fn grade(&self, [r, g, b]: [f32; 3]) -> [f32; 3] {
        let adjust = |c: f32| (c * self.brightness - 127.5) * self.contrast + 127.5;
        let (r, g, b) = (adjust(r), adjust(g), adjust(b));
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        [
            luma + (r - luma) * self.saturation,
            luma + (g - luma) * self.saturation,
            luma + (b - luma) * self.saturation,
        ]
    }
}

/// Post-processing pass applied to every frame of a finished clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum PostEffect {
    ColorGrading(ColorGrading),
    Blur { radius: f32 },
}

impl PostEffect {
    pub fn validate(&self) -> Result<()> {
        let values = match self {
            Self::ColorGrading(grading) => vec![
                ("brightness", grading.brightness),
                ("contrast", grading.contrast),
                ("saturation", grading.saturation),
            ],
            Self::Blur { radius } => vec![("radius", *radius)],
        };
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(FxError::invalid(format!(
                    "post effect parameter `{name}` must be finite and non-negative"
                )));
            }
        }
        Ok(())
    }

    pub fn apply(&self, frame: &mut Frame) {
        match self {
            Self::ColorGrading(grading) => frame.map_rgb(|rgb| grading.grade(rgb)),
            Self::Blur { radius } => frame.gaussian_blur(*radius),
        }
    }
}

/// Applies `effects` in order to every frame of `clip`. All parameters are
/// validated first so a bad entry leaves the clip untouched.
pub fn apply_post_effects(clip: &mut EffectClip, effects: &[PostEffect]) -> Result<()> {
    for effect in effects {
        effect.validate()?;
    }
    for frame in clip.frames_mut() {
        for effect in effects {
            effect.apply(frame);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanvasSize;

    fn clip_of(color: [u8; 4]) -> EffectClip {
        let size = CanvasSize::new(3, 3);
        EffectClip::new("test", 0.2, 10, size, vec![Frame::filled(size, color).unwrap(); 2]).unwrap()
    }

    #[test]
    fn identity_grading_changes_nothing() {
        let mut clip = clip_of([10, 120, 240, 200]);
        let before = clip.clone();

        apply_post_effects(&mut clip, &[PostEffect::ColorGrading(ColorGrading::default())]).unwrap();

        assert_eq!(clip, before);
    }

    #[test]
    fn zero_saturation_produces_grey() {
        let mut clip = clip_of([200, 50, 10, 255]);
        let grading = ColorGrading {
            saturation: 0.0,
            ..ColorGrading::default()
        };

        apply_post_effects(&mut clip, &[PostEffect::ColorGrading(grading)]).unwrap();

        let [r, g, b, a] = clip.frames()[1].pixel(1, 1).unwrap();
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 255);
    }

    #[test]
    fn brightness_scales_channels() {
        let mut clip = clip_of([100, 100, 100, 255]);
        let grading = ColorGrading {
            brightness: 2.0,
            ..ColorGrading::default()
        };

        apply_post_effects(&mut clip, &[PostEffect::ColorGrading(grading)]).unwrap();
        assert_eq!(clip.frames()[0].pixel(0, 0), Some([200, 200, 200, 255]));
    }

    #[test]
    fn negative_parameters_are_rejected_before_any_change() {
        let mut clip = clip_of([1, 2, 3, 255]);
        let before = clip.clone();
        let effects = [
            PostEffect::ColorGrading(ColorGrading {
                brightness: 3.0,
                ..ColorGrading::default()
            }),
            PostEffect::Blur { radius: -1.0 },
        ];

        assert!(apply_post_effects(&mut clip, &effects).is_err());
        assert_eq!(clip, before);
    }

    #[test]
    fn configured_huge_blur_keeps_pixels_finite() {
        let config = crate::config::AppConfig::from_json_str(
            r#"{ "post": [{ "type": "blur", "params": { "radius": 20000.0 } }] }"#,
        )
        .unwrap();
        let mut clip = clip_of([40, 80, 120, 255]);

        apply_post_effects(&mut clip, &config.post).unwrap();

        assert_eq!(clip.frames()[0].pixel(1, 1), Some([40, 80, 120, 255]));
    }

    #[test]
    fn parses_tagged_json() {
        let effects: Vec<PostEffect> = serde_json::from_str(
            r#"[
                {"type": "color_grading", "params": {"contrast": 1.2}},
                {"type": "blur", "params": {"radius": 2.0}}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            effects[0],
            PostEffect::ColorGrading(ColorGrading {
                contrast: 1.2,
                ..ColorGrading::default()
            })
        );
        assert_eq!(effects[1], PostEffect::Blur { radius: 2.0 });
    }
}
