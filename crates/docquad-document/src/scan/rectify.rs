// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectifier: warp the quadrilateral bounded by four corners onto
// an upright rectangle using inverse mapping and bilinear sampling.

use std::path::Path;

use docquad_core::config::RectifierConfig;
use docquad_core::{CornerSet, Point, Result, ScanError};
use image::{DynamicImage, Rgba, RgbaImage};
use tracing::{debug, info, instrument};

use crate::geometry::{compute_transform, perspective_target_size};
use crate::image::{ExportFormat, ExportOptions, encode_rgba, ensure_within_limit};

/// A rectified page: an RGBA buffer and its size.
#[derive(Debug, Clone, PartialEq)]
pub struct RectifiedImage {
    image: RgbaImage,
}

impl RectifiedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }

    /// Encode as PNG or JPEG.
    pub fn encode(&self, options: ExportOptions) -> Result<Vec<u8>> {
        encode_rgba(&self.image, options)
    }

    /// Encode and write to `path`. The format comes from `options`.
    pub fn save(&self, path: impl AsRef<Path>, options: ExportOptions) -> Result<()> {
        let bytes = self.encode(options)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!(
            path = %path.as_ref().display(),
            bytes = bytes.len(),
            format = ?options.format,
            "Rectified image written"
        );
        Ok(())
    }

    /// PNG bytes with default options.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        self.encode(ExportOptions {
            format: ExportFormat::Png,
            ..ExportOptions::default()
        })
    }
}

/// Produces upright, rectangular crops from four corner points.
#[derive(Debug, Clone, Default)]
pub struct PerspectiveRectifier {
    config: RectifierConfig,
}

impl PerspectiveRectifier {
    pub fn new(config: RectifierConfig) -> Self {
        Self { config }
    }

    /// Rectify from an arbitrary point list. Anything other than exactly four
    /// finite points is [`ScanError::InvalidInput`].
    pub fn rectify_points(&self, image: &DynamicImage, points: &[Point]) -> Result<RectifiedImage> {
        let corners = CornerSet::try_from_slice(points)?;
        self.rectify(image, &corners)
    }

    /// Warp the region bounded by `corners` onto a `W x H` rectangle, where
    /// `W` and `H` are the longer of each pair of opposing edges (rounded).
    ///
    /// Deterministic: the same image and corners always give the same bytes.
    #[instrument(skip_all, fields(src_w = image.width(), src_h = image.height()))]
    pub fn rectify(&self, image: &DynamicImage, corners: &CornerSet) -> Result<RectifiedImage> {
        corners.ensure_finite()?;
        let (w, h) = perspective_target_size(corners);
        let (out_w, out_h) = (w.round(), h.round());
        if !(out_w >= 1.0 && out_h >= 1.0) {
            return Err(ScanError::invalid(format!(
                "target size {w:.2}x{h:.2} rounds to zero"
            )));
        }
        if out_w > u32::MAX as f64 || out_h > u32::MAX as f64 {
            return Err(ScanError::invalid(format!("target size {w}x{h} is too large")));
        }
        let (out_w, out_h) = (out_w as u32, out_h as u32);
        ensure_within_limit(out_w, out_h, self.config.max_pixels)?;

        let forward = compute_transform(corners, out_w as f64, out_h as f64)?;
        let inverse = forward
            .inverse()
            .ok_or_else(|| ScanError::invalid("perspective transform is not invertible"))?;

        let source = image.to_rgba8();
        let background = Rgba(self.config.background);
        let mut output = RgbaImage::new(out_w, out_h);
        for (x, y, pixel) in output.enumerate_pixels_mut() {
            *pixel = inverse
                .apply(Point::new(x as f64, y as f64))
                .and_then(|src| sample_bilinear(&source, src))
                .unwrap_or(background);
        }

        debug!(out_w, out_h, "Perspective warp complete");
        Ok(RectifiedImage { image: output })
    }
}

/// Bilinear sample at `p`, with pixel centres at integer coordinates.
///
/// `None` when `p` is more than half a pixel outside the outermost centres.
/// Inside that margin the edge pixels are replicated.
fn sample_bilinear(src: &RgbaImage, p: Point) -> Option<Rgba<u8>> {
    let (w, h) = (src.width() as f64, src.height() as f64);
    if !(p.x >= -0.5 && p.y >= -0.5 && p.x < w - 0.5 && p.y < h - 0.5) {
        return None;
    }

    let max_x = src.width() - 1;
    let max_y = src.height() - 1;
    let fx = p.x.floor();
    let fy = p.y.floor();
    let tx = p.x - fx;
    let ty = p.y - fy;

    let clamp = |v: f64, max: u32| -> u32 { v.clamp(0.0, max as f64) as u32 };
    let x0 = clamp(fx, max_x);
    let x1 = clamp(fx + 1.0, max_x);
    let y0 = clamp(fy, max_y);
    let y1 = clamp(fy + 1.0, max_y);

    let p00 = src.get_pixel(x0, y0).0;
    let p10 = src.get_pixel(x1, y0).0;
    let p01 = src.get_pixel(x0, y1).0;
    let p11 = src.get_pixel(x1, y1).0;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f64 * (1.0 - tx) + p10[c] as f64 * tx;
        let bottom = p01[c] as f64 * (1.0 - tx) + p11[c] as f64 * tx;
        let v = top * (1.0 - ty) + bottom * ty;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    Some(Rgba(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8, 255])
        }))
    }

    /// Rectifying with the image's own corners reproduces the image.
    #[test]
    fn identity_corners_reproduce_source() {
        let src = gradient(64, 48);
        let rectified = PerspectiveRectifier::default()
            .rectify(&src, &CornerSet::full_frame(64, 48))
            .unwrap();
        assert_eq!((rectified.width(), rectified.height()), (64, 48));

        let expected = src.to_rgba8();
        let mut worst = 0i32;
        for (a, b) in rectified.as_rgba().pixels().zip(expected.pixels()) {
            for c in 0..4 {
                worst = worst.max((a.0[c] as i32 - b.0[c] as i32).abs());
            }
        }
        assert!(worst <= 1, "max channel difference {worst}");
    }

    #[test]
    fn requires_exactly_four_corners() {
        let src = gradient(10, 10);
        let three = [
            Point::new(0.0, 0.0),
            Point::new(9.0, 0.0),
            Point::new(9.0, 9.0),
        ];
        let err = PerspectiveRectifier::default()
            .rectify_points(&src, &three)
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidInput(_)));
    }

    #[test]
    fn non_finite_corner_is_rejected() {
        let src = gradient(10, 10);
        let corners = CornerSet::full_frame(10, 10)
            .with_corner(docquad_core::CornerIndex::TopRight, Point::new(f64::NAN, 0.0));
        assert!(matches!(
            PerspectiveRectifier::default().rectify(&src, &corners),
            Err(ScanError::InvalidInput(_))
        ));
    }

    #[test]
    fn collapsed_corners_are_rejected() {
        let src = gradient(10, 10);
        let p = Point::new(4.0, 4.0);
        let corners = CornerSet::new(p, p, p, p);
        assert!(matches!(
            PerspectiveRectifier::default().rectify(&src, &corners),
            Err(ScanError::InvalidInput(_))
        ));
    }

    #[test]
    fn output_is_deterministic() {
        let src = gradient(120, 90);
        let corners = CornerSet::new(
            Point::new(12.3, 8.9),
            Point::new(101.2, 15.0),
            Point::new(110.7, 80.4),
            Point::new(3.1, 70.0),
        );
        let rectifier = PerspectiveRectifier::default();
        let a = rectifier.rectify(&src, &corners).unwrap();
        let b = rectifier.rectify(&src, &corners).unwrap();
        assert_eq!(a.as_rgba().as_raw(), b.as_rgba().as_raw());
    }

    /// Corners reaching outside the source leave background pixels behind.
    #[test]
    fn out_of_bounds_uses_background() {
        let src = DynamicImage::ImageRgba8(RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255])));
        let config = RectifierConfig {
            background: [1, 2, 3, 255],
            ..RectifierConfig::default()
        };
        let corners = CornerSet::new(
            Point::new(-20.0, -20.0),
            Point::new(19.0, -20.0),
            Point::new(19.0, 19.0),
            Point::new(-20.0, 19.0),
        );
        let out = PerspectiveRectifier::new(config).rectify(&src, &corners).unwrap();
        assert_eq!(out.as_rgba().get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
        let (w, h) = (out.width(), out.height());
        assert_eq!(out.as_rgba().get_pixel(w - 1, h - 1), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn target_over_pixel_limit_is_resource_exhausted() {
        let src = gradient(10, 10);
        let config = RectifierConfig {
            max_pixels: 50,
            ..RectifierConfig::default()
        };
        let err = PerspectiveRectifier::new(config)
            .rectify(&src, &CornerSet::full_frame(10, 10))
            .unwrap_err();
        assert!(matches!(err, ScanError::ResourceExhausted { .. }));
    }

    #[test]
    fn png_export_round_trips_size() {
        let src = gradient(30, 20);
        let out = PerspectiveRectifier::default()
            .rectify(&src, &CornerSet::full_frame(30, 20))
            .unwrap();
        let bytes = out.to_png_bytes().unwrap();
        let decoded = crate::image::decode_image(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (30, 20));
    }
}
