// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary detector: find the dominant quadrilateral (document, ID card) in
// a raster image and return its four ordered corners.

use std::time::Instant;

use docquad_core::config::{Binarization, CornerStrategy, DetectorConfig};
use docquad_core::{DetectionResult, Point, Result, ScanError};
use image::{DynamicImage, GrayImage, RgbaImage};
use imageproc::contours::find_contours;
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, info, instrument, warn};

use crate::geometry::{approximate_polygon, arc_length, order_corners, polygon_area};
use crate::image::ensure_within_limit;
use crate::scan::binarize::{binarize, intensity_range};

/// The image operations the detector is built from.
///
/// Swappable so the pipeline can be driven by another provider (or a failing
/// mock in tests). Contour points are integer pixel coordinates widened to
/// `f64`.
pub trait VisionPrimitives: Send + Sync {
    fn blur(&self, gray: &GrayImage, sigma: f32) -> Result<GrayImage>;
    fn binarize(&self, blurred: &GrayImage, method: Binarization) -> Result<GrayImage>;
    fn contours(&self, binary: &GrayImage) -> Result<Vec<Vec<Point>>>;
}

/// [`VisionPrimitives`] backed by `imageproc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocPrimitives;

impl VisionPrimitives for ImageprocPrimitives {
    fn blur(&self, gray: &GrayImage, sigma: f32) -> Result<GrayImage> {
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(ScanError::PrimitiveFailure(format!(
                "blur sigma must be positive, got {sigma}"
            )));
        }
        Ok(gaussian_blur_f32(gray, sigma))
    }

    fn binarize(&self, blurred: &GrayImage, method: Binarization) -> Result<GrayImage> {
        Ok(binarize(blurred, method))
    }

    fn contours(&self, binary: &GrayImage) -> Result<Vec<Vec<Point>>> {
        Ok(find_contours::<u32>(binary)
            .into_iter()
            .map(|c| {
                c.points
                    .into_iter()
                    .map(|p| Point::new(p.x as f64, p.y as f64))
                    .collect()
            })
            .collect())
    }
}

/// Anything that can turn an RGBA frame into a detection result.
///
/// The live loop talks to this rather than to [`BoundaryDetector`] directly.
pub trait FrameDetector: Send + Sync + 'static {
    fn detect_frame(&self, frame: &RgbaImage) -> Result<DetectionResult>;
}

/// Locates the largest quadrilateral in an image.
///
/// Pipeline: intensity -> blur -> binarize -> contours -> largest contour by
/// enclosed area -> four corners. The result is `not_found` (never a guessed
/// geometry) when the frame is blank, no contour is large enough, a corner
/// quadrant is empty, or a primitive fails. All intermediate buffers are
/// locals and are released on every exit path.
pub struct BoundaryDetector<P = ImageprocPrimitives> {
    config: DetectorConfig,
    primitives: P,
}

impl BoundaryDetector<ImageprocPrimitives> {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            primitives: ImageprocPrimitives,
        }
    }
}

impl Default for BoundaryDetector<ImageprocPrimitives> {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl<P: VisionPrimitives> BoundaryDetector<P> {
    // -- Construction ---------------------------------------------------------

    pub fn with_primitives(config: DetectorConfig, primitives: P) -> Self {
        Self { config, primitives }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    // -- Entry points ---------------------------------------------------------

    /// Detect on a decoded still image.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect(&self, image: &DynamicImage) -> Result<DetectionResult> {
        ensure_within_limit(image.width(), image.height(), self.config.max_pixels)?;
        self.run(&image.to_luma8(), None)
    }

    /// Detect on an RGBA frame (the live-video path).
    pub fn detect_rgba(&self, frame: &RgbaImage) -> Result<DetectionResult> {
        ensure_within_limit(frame.width(), frame.height(), self.config.max_pixels)?;
        self.run(&image::imageops::grayscale(frame), None)
    }

    /// Like [`detect`](Self::detect), but gives up with
    /// [`ScanError::DeadlineExceeded`] once `deadline` has passed. The check
    /// runs between pipeline stages.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect_with_deadline(
        &self,
        image: &DynamicImage,
        deadline: Instant,
    ) -> Result<DetectionResult> {
        ensure_within_limit(image.width(), image.height(), self.config.max_pixels)?;
        self.run(&image.to_luma8(), Some(deadline))
    }

    // -- Pipeline -------------------------------------------------------------

    fn run(&self, gray: &GrayImage, deadline: Option<Instant>) -> Result<DetectionResult> {
        let started = Instant::now();
        let (width, height) = gray.dimensions();

        match self.locate(gray, deadline, started) {
            Ok(Some(points)) => match order_corners(&points).into_corner_set() {
                Some(corners) => {
                    info!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Document quadrilateral found"
                    );
                    Ok(DetectionResult::found(corners, width, height))
                }
                None => {
                    debug!("Fewer than four corner quadrants resolved");
                    Ok(DetectionResult::not_found(width, height))
                }
            },
            Ok(None) => Ok(DetectionResult::not_found(width, height)),
            Err(ScanError::PrimitiveFailure(detail)) => {
                warn!(%detail, "Image primitive failed; reporting no detection");
                Ok(DetectionResult::not_found(width, height))
            }
            Err(err) => Err(err),
        }
    }

    /// The point set to classify into corners, or `None` when nothing
    /// qualifies.
    fn locate(
        &self,
        gray: &GrayImage,
        deadline: Option<Instant>,
        started: Instant,
    ) -> Result<Option<Vec<Point>>> {
        let cfg = &self.config;
        let (width, height) = gray.dimensions();

        let blurred = self.primitives.blur(gray, cfg.blur_sigma)?;
        check_deadline(deadline, started)?;

        let spread = intensity_range(&blurred);
        if spread < cfg.min_contrast {
            debug!(spread, "Frame is blank");
            return Ok(None);
        }

        let binary = self.primitives.binarize(&blurred, cfg.binarization)?;
        drop(blurred);
        check_deadline(deadline, started)?;

        let contours = self.primitives.contours(&binary)?;
        drop(binary);
        check_deadline(deadline, started)?;
        debug!(contours = contours.len(), "Contours extracted");

        // Largest enclosed area; the first contour wins a tie.
        let mut best: Option<(usize, f64)> = None;
        for (i, contour) in contours.iter().enumerate() {
            let area = polygon_area(contour);
            if best.is_none_or(|(_, best_area)| area > best_area) {
                best = Some((i, area));
            }
        }
        let Some((index, area)) = best else {
            debug!("No contours");
            return Ok(None);
        };

        let frame_area = width as f64 * height as f64;
        if area < cfg.min_area_ratio * frame_area {
            debug!(area, frame_area, "Largest contour below minimum area");
            return Ok(None);
        }

        let Some(contour) = contours.into_iter().nth(index) else {
            return Ok(None);
        };

        debug!(contour_points = contour.len(), area, "Selected largest contour");

        match cfg.corner_strategy {
            CornerStrategy::QuadrantExtremes => Ok(Some(contour)),
            CornerStrategy::PolygonApprox => {
                let epsilon = cfg.approx_epsilon_ratio * arc_length(&contour, true);
                let approx = approximate_polygon(&contour, epsilon);
                if approx.len() == 4 {
                    Ok(Some(approx))
                } else {
                    debug!(vertices = approx.len(), "Approximation is not a quadrilateral");
                    Ok(None)
                }
            }
        }
    }
}

impl<P: VisionPrimitives + 'static> FrameDetector for BoundaryDetector<P> {
    fn detect_frame(&self, frame: &RgbaImage) -> Result<DetectionResult> {
        self.detect_rgba(frame)
    }
}

fn check_deadline(deadline: Option<Instant>, started: Instant) -> Result<()> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(ScanError::DeadlineExceeded {
            elapsed_ms: started.elapsed().as_millis(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docquad_core::CornerSet;
    use image::{Luma, Rgba};

    /// White axis-aligned rectangle covering pixels `x0..x1` by `y0..y1` on black.
    fn white_rect(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(w, h, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                Luma([255])
            } else {
                Luma([0])
            }
        }))
    }

    fn assert_near(corners: &CornerSet, expected: [(f64, f64); 4], tol: f64) {
        for (got, (ex, ey)) in corners.points().iter().zip(expected) {
            assert!(
                (got.x - ex).abs() <= tol && (got.y - ey).abs() <= tol,
                "corner {got:?} not within {tol} of ({ex}, {ey}); all = {corners:?}"
            );
        }
    }

    const RECT_CORNERS: [(f64, f64); 4] = [(60.0, 40.0), (179.0, 40.0), (179.0, 119.0), (60.0, 119.0)];

    /// A solid white rectangle on black is found within a few pixels.
    #[test]
    fn finds_white_rectangle_on_black() {
        let img = white_rect(240, 160, 60, 40, 180, 120);
        let result = BoundaryDetector::new(DetectorConfig::default()).detect(&img).unwrap();
        assert_eq!((result.width, result.height), (240, 160));
        assert_near(&result.require().unwrap(), RECT_CORNERS, 3.0);
    }

    #[test]
    fn canny_with_polygon_approximation_finds_rectangle() {
        let config = DetectorConfig {
            binarization: Binarization::Canny {
                low: 50.0,
                high: 150.0,
            },
            corner_strategy: CornerStrategy::PolygonApprox,
            ..DetectorConfig::default()
        };
        let img = white_rect(240, 160, 60, 40, 180, 120);
        let result = BoundaryDetector::new(config).detect(&img).unwrap();
        assert_near(&result.require().unwrap(), RECT_CORNERS, 4.0);
    }

    #[test]
    fn adaptive_binarization_finds_rectangle() {
        let config = DetectorConfig {
            binarization: Binarization::Adaptive {
                block_radius: 7,
                offset: 10,
            },
            ..DetectorConfig::default()
        };
        let img = white_rect(240, 160, 60, 40, 180, 120);
        let result = BoundaryDetector::new(config).detect(&img).unwrap();
        assert_near(&result.require().unwrap(), RECT_CORNERS, 4.0);
    }

    /// A blank frame has no document in it.
    #[test]
    fn blank_image_is_not_found() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(120, 90, Luma([128])));
        let result = BoundaryDetector::new(DetectorConfig::default()).detect(&img).unwrap();
        assert!(!result.is_found());
        assert!(matches!(result.require(), Err(ScanError::NoDetection)));
        assert_eq!(
            result.corners_or_full_frame(),
            CornerSet::full_frame(120, 90)
        );
    }

    #[test]
    fn speck_below_minimum_area_is_not_found() {
        let img = white_rect(200, 200, 100, 100, 104, 104);
        let result = BoundaryDetector::new(DetectorConfig::default()).detect(&img).unwrap();
        assert!(!result.is_found());
    }

    #[test]
    fn rgba_frames_are_accepted() {
        let frame = RgbaImage::from_fn(240, 160, |x, y| {
            if (60..180).contains(&x) && (40..120).contains(&y) {
                Rgba([250, 250, 245, 255])
            } else {
                Rgba([20, 25, 30, 255])
            }
        });
        let detector = BoundaryDetector::new(DetectorConfig::default());
        let result = detector.detect_frame(&frame).unwrap();
        assert_near(&result.require().unwrap(), RECT_CORNERS, 3.0);
    }

    #[test]
    fn oversized_image_is_resource_exhausted() {
        let config = DetectorConfig {
            max_pixels: 1_000,
            ..DetectorConfig::default()
        };
        let img = white_rect(100, 100, 10, 10, 90, 90);
        let err = BoundaryDetector::new(config).detect(&img).unwrap_err();
        assert!(matches!(err, ScanError::ResourceExhausted { .. }));
    }

    #[test]
    fn zero_sized_image_is_invalid() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        let err = BoundaryDetector::new(DetectorConfig::default()).detect(&img).unwrap_err();
        assert!(matches!(err, ScanError::InvalidInput(_)));
    }

    #[test]
    fn expired_deadline_is_reported() {
        let img = white_rect(240, 160, 60, 40, 180, 120);
        let err = BoundaryDetector::new(DetectorConfig::default())
            .detect_with_deadline(&img, Instant::now())
            .unwrap_err();
        assert!(matches!(err, ScanError::DeadlineExceeded { .. }));
    }

    struct BrokenContours;

    impl VisionPrimitives for BrokenContours {
        fn blur(&self, gray: &GrayImage, _sigma: f32) -> Result<GrayImage> {
            Ok(gray.clone())
        }
        fn binarize(&self, blurred: &GrayImage, method: Binarization) -> Result<GrayImage> {
            ImageprocPrimitives.binarize(blurred, method)
        }
        fn contours(&self, _binary: &GrayImage) -> Result<Vec<Vec<Point>>> {
            Err(ScanError::PrimitiveFailure("contour tracer crashed".into()))
        }
    }

    /// A failing primitive is reported as "no detection", never raw.
    #[test]
    fn primitive_failure_becomes_not_found() {
        let detector = BoundaryDetector::with_primitives(DetectorConfig::default(), BrokenContours);
        let img = white_rect(240, 160, 60, 40, 180, 120);
        let result = detector.detect(&img).unwrap();
        assert!(!result.is_found());
    }

    struct Triangle;

    impl VisionPrimitives for Triangle {
        fn blur(&self, gray: &GrayImage, _sigma: f32) -> Result<GrayImage> {
            Ok(gray.clone())
        }
        fn binarize(&self, blurred: &GrayImage, _method: Binarization) -> Result<GrayImage> {
            Ok(blurred.clone())
        }
        fn contours(&self, _binary: &GrayImage) -> Result<Vec<Vec<Point>>> {
            Ok(vec![vec![
                Point::new(10.0, 10.0),
                Point::new(200.0, 10.0),
                Point::new(105.0, 150.0),
            ]])
        }
    }

    /// An empty corner quadrant is a failed detection, not a partial quad.
    #[test]
    fn unresolved_quadrant_is_not_found() {
        let detector = BoundaryDetector::with_primitives(DetectorConfig::default(), Triangle);
        let img = white_rect(240, 160, 60, 40, 180, 120);
        assert!(!detector.detect(&img).unwrap().is_found());
    }
}
