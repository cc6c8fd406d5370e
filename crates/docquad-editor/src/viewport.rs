// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Display <-> image coordinate conversion.

use docquad_core::Point;

/// Relationship between the displayed image and its natural pixel size.
///
/// Scale is `display / natural`, independently per axis. Every conversion
/// returns `None` while the scale is degenerate (zero, negative, or
/// non-finite), so callers can ignore the event instead of producing
/// garbage coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    display_width: f64,
    display_height: f64,
    natural_width: u32,
    natural_height: u32,
}

impl Viewport {
    pub fn new(display_width: f64, display_height: f64, natural_width: u32, natural_height: u32) -> Self {
        Self {
            display_width,
            display_height,
            natural_width,
            natural_height,
        }
    }

    /// Displayed at natural size (scale 1:1).
    pub fn unscaled(width: u32, height: u32) -> Self {
        Self::new(width as f64, height as f64, width, height)
    }

    pub fn set_display_size(&mut self, width: f64, height: f64) {
        self.display_width = width;
        self.display_height = height;
    }

    pub fn set_natural_size(&mut self, width: u32, height: u32) {
        self.natural_width = width;
        self.natural_height = height;
    }

    pub fn natural_size(&self) -> (u32, u32) {
        (self.natural_width, self.natural_height)
    }

    /// `(sx, sy)` display pixels per image pixel.
    pub fn scale(&self) -> Option<(f64, f64)> {
        if self.natural_width == 0 || self.natural_height == 0 {
            return None;
        }
        let sx = self.display_width / self.natural_width as f64;
        let sy = self.display_height / self.natural_height as f64;
        let usable = |s: f64| s.is_finite() && s > 0.0;
        (usable(sx) && usable(sy)).then_some((sx, sy))
    }

    pub fn to_image(&self, display: Point) -> Option<Point> {
        let (sx, sy) = self.scale()?;
        let p = Point::new(display.x / sx, display.y / sy);
        p.is_finite().then_some(p)
    }

    pub fn to_display(&self, image: Point) -> Option<Point> {
        let (sx, sy) = self.scale()?;
        let p = Point::new(image.x * sx, image.y * sy);
        p.is_finite().then_some(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_axis_scales() {
        // 2000x1000 image shown in a 500x400 box (non-uniform).
        let vp = Viewport::new(500.0, 400.0, 2000, 1000);
        assert_eq!(vp.scale(), Some((0.25, 0.4)));
        assert_eq!(vp.to_image(Point::new(100.0, 100.0)), Some(Point::new(400.0, 250.0)));
        assert_eq!(vp.to_display(Point::new(400.0, 250.0)), Some(Point::new(100.0, 100.0)));
    }

    #[test]
    fn degenerate_scale_converts_nothing() {
        let mut vp = Viewport::new(0.0, 300.0, 800, 600);
        assert!(vp.scale().is_none());
        assert!(vp.to_image(Point::new(1.0, 1.0)).is_none());

        vp.set_display_size(400.0, 300.0);
        vp.set_natural_size(0, 600);
        assert!(vp.to_display(Point::new(1.0, 1.0)).is_none());

        vp.set_natural_size(800, 600);
        assert_eq!(vp.scale(), Some((0.5, 0.5)));
    }

    #[test]
    fn non_finite_pointer_is_rejected() {
        let vp = Viewport::unscaled(100, 100);
        assert!(vp.to_image(Point::new(f64::NAN, 3.0)).is_none());
    }
}
