//! Software raster surface shared by every effect generator.
//!
//! Pixels are stored as straight (non-premultiplied) RGBA8 in row-major order.
//! All drawing primitives use source-over blending and clip to the canvas.

use rayon::prelude::*;

use crate::{config::CanvasSize, FxError, Result};

pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// Returns `color` with its alpha replaced by `alpha` in `[0, 1]`.
pub fn with_alpha(color: Rgba, alpha: f32) -> Rgba {
    let [r, g, b, _] = color;
    [r, g, b, unit_to_byte(alpha)]
}

pub(crate) fn unit_to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// A single fixed-size RGBA frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    pub fn transparent(size: CanvasSize) -> Result<Self> {
        Self::filled(size, TRANSPARENT)
    }

    pub fn filled(size: CanvasSize, color: Rgba) -> Result<Self> {
        if size.width == 0 || size.height == 0 {
            return Err(FxError::invalid("canvas width and height must be positive"));
        }
        let mut pixels = Vec::with_capacity(size.pixel_count() * 4);
        for _ in 0..size.pixel_count() {
            pixels.extend_from_slice(&color);
        }
        Ok(Self {
            width: size.width,
            height: size.height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> CanvasSize {
        CanvasSize::new(self.width, self.height)
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = self.offset(x, y);
        let mut out = TRANSPARENT;
        out.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(out)
    }

    pub fn is_transparent(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Largest alpha value inside the inclusive pixel rectangle.
    pub fn max_alpha_in(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> u8 {
        let x1 = x1.min(self.width.saturating_sub(1));
        let y1 = y1.min(self.height.saturating_sub(1));
        let mut max = 0;
        for y in y0..=y1 {
            for x in x0..=x1 {
                max = max.max(self.pixels[self.offset(x, y) + 3]);
            }
        }
        max
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Source-over blend of `color` onto the pixel at `(x, y)`.
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height || color[3] == 0 {
            return;
        }
        let offset = self.offset(x, y);
        let dst = &mut self.pixels[offset..offset + 4];
        let blended = blend_over(color, [dst[0], dst[1], dst[2], dst[3]]);
        dst.copy_from_slice(&blended);
    }

    /// Composites `layer` over this frame pixel by pixel.
    pub fn draw_layer(&mut self, layer: &Frame) -> Result<()> {
        if layer.width != self.width || layer.height != self.height {
            return Err(FxError::invalid(format!(
                "layer is {}x{} but canvas is {}x{}",
                layer.width, layer.height, self.width, self.height
            )));
        }
        self.pixels
            .par_chunks_exact_mut(4)
            .zip(layer.pixels.par_chunks_exact(4))
            .for_each(|(dst, src)| {
                if src[3] == 0 {
                    return;
                }
                let top = [src[0], src[1], src[2], src[3]];
                let blended = blend_over(top, [dst[0], dst[1], dst[2], dst[3]]);
                dst.copy_from_slice(&blended);
            });
        Ok(())
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba) {
        if radius <= 0.0 {
            return;
        }
        let r2 = radius * radius;
        let min = (cx - radius, cy - radius);
        let max = (cx + radius, cy + radius);
        self.for_each_in_box(min, max, color, |x, y| {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            dx * dx + dy * dy <= r2
        });
    }

    pub fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, width: f32, color: Rgba) {
        if radius <= 0.0 {
            return;
        }
        let half = (width * 0.5).max(0.5);
        let outer = radius + half;
        let min = (cx - outer, cy - outer);
        let max = (cx + outer, cy + outer);
        self.for_each_in_box(min, max, color, |x, y| {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            ((dx * dx + dy * dy).sqrt() - radius).abs() <= half
        });
    }

    pub fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba) {
        let half = (width * 0.5).max(0.5);
        let (x0, y0) = from;
        let (x1, y1) = to;
        let min = (x0.min(x1) - half, y0.min(y1) - half);
        let max = (x0.max(x1) + half, y0.max(y1) + half);
        self.for_each_in_box(min, max, color, |x, y| {
            distance_to_segment((x as f32 + 0.5, y as f32 + 0.5), from, to) <= half
        });
    }

    /// Outline of a closed polygon. Shared edge pixels are only painted once.
    pub fn stroke_polygon(&mut self, vertices: &[(f32, f32)], width: f32, color: Rgba) {
        if vertices.len() < 2 {
            return;
        }
        let half = (width * 0.5).max(0.5);
        let (mut x0, mut y0) = (f32::INFINITY, f32::INFINITY);
        let (mut x1, mut y1) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for &(x, y) in vertices {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        let edges: Vec<((f32, f32), (f32, f32))> = vertices
            .iter()
            .zip(vertices.iter().cycle().skip(1))
            .map(|(&a, &b)| (a, b))
            .collect();
        self.for_each_in_box((x0 - half, y0 - half), (x1 + half, y1 + half), color, |x, y| {
            let p = (x as f32 + 0.5, y as f32 + 0.5);
            edges
                .iter()
                .any(|&(a, b)| distance_to_segment(p, a, b) <= half)
        });
    }

    /// Blends `color` onto every pixel of the clipped box for which `inside`
    /// holds.
    fn for_each_in_box<F>(&mut self, min: (f32, f32), max: (f32, f32), color: Rgba, inside: F)
    where
        F: Fn(u32, u32) -> bool,
    {
        if color[3] == 0 {
            return;
        }
        let Some((xs, xe)) = clip_span(min.0, max.0, self.width) else {
            return;
        };
        let Some((ys, ye)) = clip_span(min.1, max.1, self.height) else {
            return;
        };
        for y in ys..=ye {
            for x in xs..=xe {
                if inside(x, y) {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    /// Gaussian blur with standard deviation `radius`, computed in
    /// premultiplied space so transparent regions do not darken edges.
    pub fn gaussian_blur(&mut self, radius: f32) {
        if radius.is_nan() || radius <= 0.0 || self.is_transparent() {
            return;
        }
        let kernel = gaussian_kernel(radius, self.width.max(self.height) as usize);
        let half = (kernel.len() / 2) as isize;
        let width = self.width as usize;
        let height = self.height as usize;

        let premultiplied: Vec<[f32; 4]> = self
            .pixels
            .chunks_exact(4)
            .map(|px| {
                let a = px[3] as f32 / 255.0;
                [px[0] as f32 * a, px[1] as f32 * a, px[2] as f32 * a, a]
            })
            .collect();

        let mut horizontal = vec![[0.0f32; 4]; width * height];
        horizontal
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, out) in row.iter_mut().enumerate() {
                    let mut acc = [0.0f32; 4];
                    for (k, weight) in kernel.iter().enumerate() {
                        let sx = (x as isize + k as isize - half).clamp(0, width as isize - 1);
                        let src = &premultiplied[y * width + sx as usize];
                        for c in 0..4 {
                            acc[c] += src[c] * weight;
                        }
                    }
                    *out = acc;
                }
            });

        self.pixels
            .par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..width {
                    let mut acc = [0.0f32; 4];
                    for (k, weight) in kernel.iter().enumerate() {
                        let sy = (y as isize + k as isize - half).clamp(0, height as isize - 1);
                        let src = &horizontal[sy as usize * width + x];
                        for c in 0..4 {
                            acc[c] += src[c] * weight;
                        }
                    }
                    let alpha = acc[3].clamp(0.0, 1.0);
                    let px = &mut row[x * 4..x * 4 + 4];
                    if alpha <= 0.0 {
                        px.copy_from_slice(&TRANSPARENT);
                        continue;
                    }
                    for c in 0..3 {
                        px[c] = (acc[c] / alpha).round().clamp(0.0, 255.0) as u8;
                    }
                    px[3] = unit_to_byte(alpha);
                }
            });
    }

    /// Applies `f` to every RGB triple, leaving alpha untouched.
    pub fn map_rgb<F>(&mut self, f: F)
    where
        F: Fn([f32; 3]) -> [f32; 3] + Sync,
    {
        self.pixels.par_chunks_exact_mut(4).for_each(|px| {
            let mapped = f([px[0] as f32, px[1] as f32, px[2] as f32]);
            for c in 0..3 {
                px[c] = mapped[c].round().clamp(0.0, 255.0) as u8;
            }
        });
    }
}

/// Straight-alpha "over" operator.
pub fn blend_over(src: Rgba, dst: Rgba) -> Rgba {
    let sa = src[3] as f32 / 255.0;
    if sa >= 1.0 {
        return src;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return TRANSPARENT;
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = unit_to_byte(out_a);
    out
}

fn clip_span(lo: f32, hi: f32, extent: u32) -> Option<(u32, u32)> {
    if !lo.is_finite() || !hi.is_finite() || hi < 0.0 || lo >= extent as f32 {
        return None;
    }
    let start = lo.floor().max(0.0) as u32;
    let end = (hi.ceil() as u32).min(extent - 1);
    (start <= end).then_some((start, end))
}

fn distance_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (abx, aby) = (b.0 - a.0, b.1 - a.1);
    let (apx, apy) = (p.0 - a.0, p.1 - a.1);
    let len2 = abx * abx + aby * aby;
    let t = if len2 > 0.0 {
        ((apx * abx + apy * aby) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (dx, dy) = (apx - abx * t, apy - aby * t);
    (dx * dx + dy * dy).sqrt()
}

/// Taps cover three standard deviations either side, capped at `max_half`.
fn gaussian_kernel(sigma: f32, max_half: usize) -> Vec<f32> {
    let half = ((sigma * 3.0).ceil() as usize).clamp(1, max_half.max(1)) as isize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| {
            let x = i as f32;
            (-(x * x) / denom).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Wraps `value` onto `[0, extent)`, giving the canvas a toroidal topology.
pub fn wrap(value: f32, extent: f32) -> f32 {
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs.
    if wrapped >= extent || !wrapped.is_finite() {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn small() -> CanvasSize {
        CanvasSize::new(16, 12)
    }

    #[test]
    fn zero_sized_canvas_is_rejected() {
        assert!(Frame::transparent(CanvasSize::new(0, 10)).is_err());
    }

    #[test]
    fn over_blend_of_opaque_source_replaces_destination() {
        assert_eq!(blend_over([10, 20, 30, 255], [200, 200, 200, 255]), [10, 20, 30, 255]);
        assert_eq!(blend_over([0, 0, 0, 0], [1, 2, 3, 4]), [1, 2, 3, 4]);
    }

    #[test]
    fn half_transparent_white_over_black_is_grey() {
        let out = blend_over([255, 255, 255, 128], [0, 0, 0, 255]);
        assert_eq!(out[3], 255);
        assert!((out[0] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn circle_is_clipped_to_canvas() {
        let mut frame = Frame::transparent(small()).unwrap();
        frame.fill_circle(0.0, 0.0, 4.0, [255, 0, 0, 255]);

        assert_eq!(frame.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(15, 11), Some(TRANSPARENT));
    }

    #[test]
    fn stroke_circle_leaves_centre_empty() {
        let mut frame = Frame::transparent(CanvasSize::new(40, 40)).unwrap();
        frame.stroke_circle(20.0, 20.0, 10.0, 2.0, [255, 255, 255, 255]);

        assert_eq!(frame.pixel(20, 20), Some(TRANSPARENT));
        assert_eq!(frame.pixel(29, 19).map(|px| px[3]), Some(255));
    }

    #[test]
    fn blur_spreads_alpha_and_keeps_empty_frames_empty() {
        let mut empty = Frame::transparent(small()).unwrap();
        empty.gaussian_blur(3.0);
        assert!(empty.is_transparent());

        let mut frame = Frame::transparent(small()).unwrap();
        frame.blend_pixel(8, 6, [255, 255, 255, 255]);
        frame.gaussian_blur(1.0);

        let centre = frame.pixel(8, 6).unwrap();
        let neighbour = frame.pixel(9, 6).unwrap();
        assert!(centre[3] < 255);
        assert!(neighbour[3] > 0);
        assert_eq!(neighbour[0], 255);
    }

    #[test]
    fn huge_blur_radius_stays_finite() {
        let mut frame = Frame::transparent(CanvasSize::new(3, 3)).unwrap();
        frame.blend_pixel(1, 1, [255, 255, 255, 255]);
        frame.gaussian_blur(20_000.0);

        assert!(!frame.is_transparent());
        assert_eq!(frame.pixel(0, 0).unwrap()[0], 255);
    }

    #[test]
    fn kernel_is_capped_and_normalised() {
        let kernel = gaussian_kernel(1.0e6, 4);
        assert_eq!(kernel.len(), 9);
        assert!(kernel.iter().all(|w| w.is_finite() && *w > 0.0));
        assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-5);

        assert_eq!(gaussian_kernel(2.0, 100).len(), 13);
    }

    #[test]
    fn layer_size_mismatch_is_an_error() {
        let mut base = Frame::transparent(small()).unwrap();
        let layer = Frame::transparent(CanvasSize::new(4, 4)).unwrap();
        assert!(base.draw_layer(&layer).is_err());
    }

    proptest! {
        #[test]
        fn wrap_stays_in_range(value in -1.0e6f32..1.0e6, extent in 1.0f32..4096.0) {
            let wrapped = wrap(value, extent);
            prop_assert!(wrapped >= 0.0 && wrapped < extent);
        }
    }

    #[test]
    fn wrap_handles_tiny_negative_values() {
        assert_eq!(wrap(-1.0e-9, 100.0), 0.0);
        assert_eq!(wrap(-1.0, 100.0), 99.0);
        assert_eq!(wrap(100.0, 100.0), 0.0);
    }
}
