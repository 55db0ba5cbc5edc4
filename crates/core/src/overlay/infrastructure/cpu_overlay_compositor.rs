use std::borrow::Cow;

use ndarray::ArrayView3;

use crate::detection::domain::face_observation::FaceObservation;
use crate::overlay::domain::affine_transform::overlay_transform;
use crate::overlay::domain::frame_compositor::{FrameCompositor, RenderFrame};
use crate::overlay::domain::overlay_descriptor::OverlayDescriptor;
use crate::shared::frame::Frame;
use crate::shared::geometry::{Point, Rect, Size};

const DEFAULT_SAMPLES_PER_AXIS: usize = 2;

/// CPU source-atop compositor.
///
/// Places the overlay on the first observation's face box, then resolves
/// each destination pixel the transformed overlay can touch by mapping a
/// grid of sub-pixel sample points back into overlay space. Samples inside
/// the overlay are bilinearly filtered in premultiplied RGBA, so edges get
/// fractional coverage. Everything outside the overlay keeps the source
/// pixels, and a 4-channel source keeps its own alpha.
pub struct CpuOverlayCompositor {
    samples_per_axis: usize,
}

impl CpuOverlayCompositor {
    pub fn new(samples_per_axis: usize) -> Self {
        Self {
            samples_per_axis: samples_per_axis.max(1),
        }
    }
}

impl Default for CpuOverlayCompositor {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLES_PER_AXIS)
    }
}

impl FrameCompositor for CpuOverlayCompositor {
    fn composite<'a>(
        &self,
        frame: &'a Frame,
        observations: &[FaceObservation],
        overlay: Option<&OverlayDescriptor>,
    ) -> Result<RenderFrame<'a>, Box<dyn std::error::Error>> {
        let (Some(overlay), Some(face)) = (overlay, observations.first()) else {
            return Ok(Cow::Borrowed(frame));
        };
        if frame.channels() < 3 {
            log::warn!(
                "Cannot draw an overlay on a {}-channel frame, passing it through",
                frame.channels()
            );
            return Ok(Cow::Borrowed(frame));
        }

        let natural = overlay.natural_size();
        let transform = overlay_transform(&face.bounding_box, face.angle.unwrap_or(0.0), natural);
        let Some(inverse) = transform.inverted() else {
            log::trace!("Degenerate face box {:?}, skipping overlay", face.bounding_box);
            return Ok(Cow::Borrowed(frame));
        };
        let Some(span) = PixelSpan::clip(&transform.bounds_of(natural), frame) else {
            return Ok(Cow::Borrowed(frame));
        };

        let mut output = frame.clone();
        let sampler = OverlaySampler::new(overlay);
        let offsets = sample_offsets(self.samples_per_axis);
        let weight = 1.0 / (offsets.len() * offsets.len()) as f32;
        let width = output.width() as usize;
        let channels = output.channels() as usize;
        let data = output.data_mut();

        for row in span.y0..span.y1 {
            for col in span.x0..span.x1 {
                let mut acc = [0.0f32; 4];
                for &oy in &offsets {
                    for &ox in &offsets {
                        let p = inverse.apply(Point::new(col as f64 + ox, row as f64 + oy));
                        if let Some(texel) = sampler.sample(p) {
                            for (a, t) in acc.iter_mut().zip(texel) {
                                *a += t * weight;
                            }
                        }
                    }
                }

                let coverage = acc[3];
                if coverage <= 0.0 {
                    continue;
                }
                let offset = (row * width + col) * channels;
                for c in 0..3 {
                    let dst = data[offset + c] as f32;
                    let blended = acc[c] * 255.0 + dst * (1.0 - coverage);
                    data[offset + c] = blended.round().clamp(0.0, 255.0) as u8;
                }
            }
        }

        Ok(Cow::Owned(output))
    }
}

/// Destination pixel rows/columns overlapping the transformed overlay.
struct PixelSpan {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

impl PixelSpan {
    fn clip(bounds: &Rect, frame: &Frame) -> Option<Self> {
        let clamp = |v: f64, max: u32| v.clamp(0.0, max as f64) as usize;
        let x0 = clamp(bounds.x.floor(), frame.width());
        let y0 = clamp(bounds.y.floor(), frame.height());
        let x1 = clamp(bounds.max_x().ceil(), frame.width());
        let y1 = clamp(bounds.max_y().ceil(), frame.height());
        (x0 < x1 && y0 < y1).then_some(Self { x0, y0, x1, y1 })
    }
}

fn sample_offsets(n: usize) -> Vec<f64> {
    (0..n).map(|i| (i as f64 + 0.5) / n as f64).collect()
}

/// Bilinear, premultiplied lookups into the overlay image.
struct OverlaySampler<'a> {
    pixels: ArrayView3<'a, u8>,
    natural: Size,
    scale: (f64, f64),
    has_alpha: bool,
}

impl<'a> OverlaySampler<'a> {
    fn new(overlay: &'a OverlayDescriptor) -> Self {
        Self {
            pixels: overlay.image().as_ndarray(),
            natural: overlay.natural_size(),
            scale: overlay.pixel_scale(),
            has_alpha: overlay.image().has_alpha(),
        }
    }

    /// Premultiplied RGBA in 0..=1 at overlay-space point `p`, or `None`
    /// when `p` lies outside the overlay.
    fn sample(&self, p: Point) -> Option<[f32; 4]> {
        if !(0.0..=self.natural.width).contains(&p.x) || !(0.0..=self.natural.height).contains(&p.y)
        {
            return None;
        }
        let (h, w, _) = self.pixels.dim();
        let px = (p.x * self.scale.0 - 0.5).clamp(0.0, (w - 1) as f64);
        let py = (p.y * self.scale.1 - 0.5).clamp(0.0, (h - 1) as f64);
        let (x0, y0) = (px.floor() as usize, py.floor() as usize);
        let (x1, y1) = ((x0 + 1).min(w - 1), (y0 + 1).min(h - 1));
        let (fx, fy) = ((px - x0 as f64) as f32, (py - y0 as f64) as f32);

        let mut out = [0.0f32; 4];
        let taps = [
            (x0, y0, (1.0 - fx) * (1.0 - fy)),
            (x1, y0, fx * (1.0 - fy)),
            (x0, y1, (1.0 - fx) * fy),
            (x1, y1, fx * fy),
        ];
        for (x, y, wgt) in taps {
            let texel = self.premultiplied(x, y);
            for (o, t) in out.iter_mut().zip(texel) {
                *o += t * wgt;
            }
        }
        Some(out)
    }

    fn premultiplied(&self, x: usize, y: usize) -> [f32; 4] {
        let alpha = if self.has_alpha {
            self.pixels[[y, x, 3]] as f32 / 255.0
        } else {
            1.0
        };
        let channel = |c: usize| self.pixels[[y, x, c]] as f32 / 255.0 * alpha;
        [channel(0), channel(1), channel(2), alpha]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const RED: [u8; 4] = [255, 0, 0, 255];

    fn black_frame(width: u32, height: u32) -> Frame {
        Frame::filled(width, height, &[0, 0, 0], 3)
    }

    fn overlay(width: u32, height: u32, pixel: [u8; 4]) -> OverlayDescriptor {
        OverlayDescriptor::new(Frame::filled(width, height, &pixel, 0)).unwrap()
    }

    fn face(x: f64, y: f64, w: f64, h: f64) -> FaceObservation {
        FaceObservation::new(Rect::new(x, y, w, h))
    }

    fn composite<'a>(
        frame: &'a Frame,
        faces: &[FaceObservation],
        overlay: Option<&OverlayDescriptor>,
    ) -> RenderFrame<'a> {
        CpuOverlayCompositor::default()
            .composite(frame, faces, overlay)
            .unwrap()
    }

    #[test]
    fn test_no_faces_passes_frame_through() {
        let frame = black_frame(20, 20);
        let o = overlay(4, 4, RED);
        let result = composite(&frame, &[], Some(&o));
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(*result, frame);
    }

    #[test]
    fn test_no_overlay_passes_frame_through() {
        let frame = black_frame(20, 20);
        let result = composite(&frame, &[face(2.0, 2.0, 10.0, 10.0)], None);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(*result, frame);
    }

    #[test]
    fn test_degenerate_face_box_passes_through() {
        let frame = black_frame(20, 20);
        let o = overlay(4, 4, RED);
        let result = composite(&frame, &[face(5.0, 5.0, 0.0, 10.0)], Some(&o));
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[rstest]
    #[case::gray(&[90])]
    #[case::gray_alpha(&[90, 255])]
    fn test_frame_without_color_channels_passes_through(#[case] pixel: &[u8]) {
        let frame = Frame::filled(20, 20, pixel, 0);
        let o = overlay(4, 4, RED);
        let result = composite(&frame, &[face(2.0, 2.0, 10.0, 10.0)], Some(&o));
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(*result, frame);
    }

    #[test]
    fn test_opaque_overlay_fills_face_box_only() {
        let frame = black_frame(100, 100);
        let o = overlay(20, 30, RED);
        let result = composite(&frame, &[face(10.0, 20.0, 40.0, 60.0)], Some(&o));

        assert_eq!(result.pixel(10, 20), &[255, 0, 0]);
        assert_eq!(result.pixel(30, 50), &[255, 0, 0]);
        assert_eq!(result.pixel(49, 79), &[255, 0, 0]);
        assert_eq!(result.pixel(9, 50), &[0, 0, 0]);
        assert_eq!(result.pixel(50, 50), &[0, 0, 0]);
        assert_eq!(result.pixel(30, 80), &[0, 0, 0]);
        assert_eq!(result.pixel(0, 0), &[0, 0, 0]);
    }

    #[test]
    fn test_source_frame_is_not_mutated() {
        let frame = black_frame(50, 50);
        let before = frame.clone();
        let o = overlay(5, 5, RED);
        let _ = composite(&frame, &[face(10.0, 10.0, 20.0, 20.0)], Some(&o));
        assert_eq!(frame, before);
    }

    #[test]
    fn test_preserves_frame_index() {
        let frame = black_frame(30, 30);
        let o = overlay(5, 5, RED);
        let result = composite(&frame, &[face(0.0, 0.0, 10.0, 10.0)], Some(&o));
        assert_eq!(result.index(), 3);
    }

    #[test]
    fn test_transparent_overlay_leaves_pixels() {
        let frame = Frame::filled(30, 30, &[40, 80, 120], 0);
        let o = overlay(5, 5, [255, 255, 255, 0]);
        let result = composite(&frame, &[face(5.0, 5.0, 10.0, 10.0)], Some(&o));
        assert_eq!(result.data(), frame.data());
    }

    #[test]
    fn test_half_alpha_blends_with_source() {
        let frame = Frame::filled(30, 30, &[0, 0, 200], 0);
        let o = overlay(5, 5, [255, 0, 0, 128]);
        let result = composite(&frame, &[face(5.0, 5.0, 10.0, 10.0)], Some(&o));
        let a: f32 = 128.0 / 255.0;
        let expected_r = (255.0 * a).round() as u8;
        let expected_b = (200.0 * (1.0 - a)).round() as u8;
        assert_eq!(result.pixel(10, 10), &[expected_r, 0, expected_b]);
    }

    #[test]
    fn test_fractional_edge_gets_partial_coverage() {
        let frame = black_frame(40, 40);
        let o = overlay(10, 10, RED);
        let result = composite(&frame, &[face(10.5, 10.0, 10.0, 10.0)], Some(&o));
        // Column 10 is half covered, column 11 fully.
        assert_eq!(result.pixel(10, 15)[0], 128);
        assert_eq!(result.pixel(11, 15)[0], 255);
        assert_eq!(result.pixel(20, 15)[0], 128);
        assert_eq!(result.pixel(21, 15)[0], 0);
    }

    #[test]
    fn test_rgb_overlay_is_opaque() {
        let frame = black_frame(20, 20);
        let o = OverlayDescriptor::new(Frame::filled(4, 4, &[0, 255, 0], 0)).unwrap();
        let result = composite(&frame, &[face(4.0, 4.0, 8.0, 8.0)], Some(&o));
        assert_eq!(result.pixel(8, 8), &[0, 255, 0]);
    }

    #[test]
    fn test_rgba_source_keeps_its_alpha() {
        let frame = Frame::filled(20, 20, &[0, 0, 0, 77], 0);
        let o = overlay(4, 4, RED);
        let result = composite(&frame, &[face(4.0, 4.0, 8.0, 8.0)], Some(&o));
        assert_eq!(result.pixel(8, 8), &[255, 0, 0, 77]);
    }

    #[test]
    fn test_only_first_face_is_replaced() {
        let frame = black_frame(100, 100);
        let o = overlay(10, 10, RED);
        let faces = [face(0.0, 0.0, 20.0, 20.0), face(60.0, 60.0, 20.0, 20.0)];
        let result = composite(&frame, &faces, Some(&o));
        assert_eq!(result.pixel(10, 10), &[255, 0, 0]);
        assert_eq!(result.pixel(70, 70), &[0, 0, 0]);
    }

    #[test]
    fn test_angle_rotates_overlay_about_box_origin() {
        let frame = black_frame(100, 100);
        let o = overlay(10, 10, RED);
        let rotated = face(50.0, 50.0, 20.0, 20.0).with_angle(90.0);
        let result = composite(&frame, &[rotated], Some(&o));
        // -90 degrees swings the overlay up: it now covers x 50..70, y 30..50.
        assert_eq!(result.pixel(60, 40), &[255, 0, 0]);
        assert_eq!(result.pixel(60, 60), &[0, 0, 0]);
    }

    #[test]
    fn test_natural_size_controls_scale() {
        let frame = black_frame(100, 100);
        let o = OverlayDescriptor::new(Frame::filled(20, 20, &RED, 0))
            .unwrap()
            .with_natural_size(Size::new(10.0, 10.0))
            .unwrap();
        let f = face(10.0, 10.0, 30.0, 30.0);
        let t = overlay_transform(&f.bounding_box, 0.0, o.natural_size());
        assert_eq!(t.apply(Point::new(10.0, 10.0)), Point::new(40.0, 40.0));
        let result = composite(&frame, &[f], Some(&o));
        assert_eq!(result.pixel(39, 39), &[255, 0, 0]);
        assert_eq!(result.pixel(40, 40), &[0, 0, 0]);
    }

    #[rstest]
    #[case::oversized(face(-500.0, -500.0, 2000.0, 2000.0))]
    #[case::off_frame(face(500.0, 500.0, 20.0, 20.0))]
    #[case::rotated(face(10.0, 10.0, 30.0, 40.0).with_angle(33.0))]
    #[case::negative_angle(face(5.0, 25.0, 10.0, 10.0).with_angle(-170.0))]
    fn test_output_size_matches_source(#[case] f: FaceObservation) {
        let frame = black_frame(64, 48);
        let o = overlay(7, 9, RED);
        let result = composite(&frame, &[f], Some(&o));
        assert_eq!(result.width(), 64);
        assert_eq!(result.height(), 48);
        assert_eq!(result.channels(), 3);
        assert_eq!(result.data().len(), 64 * 48 * 3);
    }

    #[test]
    fn test_deterministic() {
        let frame = black_frame(40, 40);
        let o = overlay(3, 5, [10, 200, 30, 180]);
        let f = [face(3.3, 4.7, 21.1, 17.9).with_angle(12.0)];
        let a = composite(&frame, &f, Some(&o)).into_owned();
        let b = composite(&frame, &f, Some(&o)).into_owned();
        assert_eq!(a, b);
    }
}
