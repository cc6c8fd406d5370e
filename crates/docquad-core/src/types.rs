// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: points, corner sets, detection results.

use serde::{Deserialize, Serialize};
use std::ops::Index;

use crate::error::{Result, ScanError};

/// A 2D point. The coordinate space (image pixels or display pixels) is
/// implied by context; never mix the two without an explicit scale conversion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Spatial role of a corner. The discriminant is the corner's slot in a
/// [`CornerSet`] (clockwise from top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CornerIndex {
    TopLeft = 0,
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
}

impl CornerIndex {
    /// Canonical (clockwise) order. Hit-test ties resolve in this order.
    pub const ALL: [CornerIndex; 4] = [
        CornerIndex::TopLeft,
        CornerIndex::TopRight,
        CornerIndex::BottomRight,
        CornerIndex::BottomLeft,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Four ordered corners `{top_left, top_right, bottom_right, bottom_left}`.
///
/// Slot order always encodes spatial role, never raw detection order. A set
/// is only mutated through [`CornerSet::with_corner`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "NamedCorners", into = "NamedCorners")]
pub struct CornerSet {
    points: [Point; 4],
}

impl CornerSet {
    pub fn new(top_left: Point, top_right: Point, bottom_right: Point, bottom_left: Point) -> Self {
        Self {
            points: [top_left, top_right, bottom_right, bottom_left],
        }
    }

    /// Build from an array already in canonical clockwise order.
    pub fn from_array(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Build from a caller-supplied slice. Exactly four finite points are
    /// required.
    pub fn try_from_slice(points: &[Point]) -> Result<Self> {
        let array: [Point; 4] = points.try_into().map_err(|_| {
            ScanError::invalid(format!("expected 4 corners, got {}", points.len()))
        })?;
        let set = Self::from_array(array);
        set.ensure_finite()?;
        Ok(set)
    }

    /// Corners of the whole frame: the caller-side substitute when detection
    /// finds nothing.
    pub fn full_frame(width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        Self::new(
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        )
    }

    pub fn top_left(&self) -> Point {
        self.points[0]
    }

    pub fn top_right(&self) -> Point {
        self.points[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.points[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.points[3]
    }

    pub fn points(&self) -> &[Point; 4] {
        &self.points
    }

    /// Copy of this set with a single corner replaced. The other three
    /// corners are untouched and no reordering happens.
    pub fn with_corner(&self, corner: CornerIndex, position: Point) -> Self {
        let mut points = self.points;
        points[corner.index()] = position;
        Self { points }
    }

    pub fn ensure_finite(&self) -> Result<()> {
        match self.points.iter().position(|p| !p.is_finite()) {
            Some(i) => Err(ScanError::invalid(format!(
                "corner {i} has non-finite coordinates"
            ))),
            None => Ok(()),
        }
    }

    /// Arithmetic mean of the four corners.
    pub fn centroid(&self) -> Point {
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / 4.0, sy / 4.0)
    }

    /// Shoelace area. Positive for clockwise order in image coordinates
    /// (y pointing down).
    pub fn signed_area(&self) -> f64 {
        let mut twice = 0.0;
        for i in 0..4 {
            let a = self.points[i];
            let b = self.points[(i + 1) % 4];
            twice += a.x * b.y - b.x * a.y;
        }
        twice / 2.0
    }

    /// True when every turn has the same orientation. Manual edits may
    /// legitimately produce non-convex sets.
    pub fn is_convex(&self) -> bool {
        let mut sign = 0.0f64;
        for i in 0..4 {
            let a = self.points[i];
            let b = self.points[(i + 1) % 4];
            let c = self.points[(i + 2) % 4];
            let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
            if cross == 0.0 {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        sign != 0.0
    }

    /// Scale every corner independently in X and Y.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self {
            points: self.points.map(|p| Point::new(p.x * sx, p.y * sy)),
        }
    }
}

impl Index<CornerIndex> for CornerSet {
    type Output = Point;

    fn index(&self, corner: CornerIndex) -> &Point {
        &self.points[corner.index()]
    }
}

/// Wire shape for [`CornerSet`]: named fields rather than a bare array.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamedCorners {
    top_left: Point,
    top_right: Point,
    bottom_right: Point,
    bottom_left: Point,
}

impl From<NamedCorners> for CornerSet {
    fn from(n: NamedCorners) -> Self {
        CornerSet::new(n.top_left, n.top_right, n.bottom_right, n.bottom_left)
    }
}

impl From<CornerSet> for NamedCorners {
    fn from(c: CornerSet) -> Self {
        NamedCorners {
            top_left: c.top_left(),
            top_right: c.top_right(),
            bottom_right: c.bottom_right(),
            bottom_left: c.bottom_left(),
        }
    }
}

/// Result of quadrant classification: one optional slot per corner role.
///
/// A missing slot means no point fell into that quadrant. Anything short of
/// four resolved slots is a detection failure, never a partial quadrilateral.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QuadrantCorners {
    slots: [Option<Point>; 4],
}

impl QuadrantCorners {
    pub fn from_slots(slots: [Option<Point>; 4]) -> Self {
        Self { slots }
    }

    pub fn get(&self, corner: CornerIndex) -> Option<Point> {
        self.slots[corner.index()]
    }

    pub fn resolved(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn into_corner_set(self) -> Option<CornerSet> {
        let [tl, tr, br, bl] = self.slots;
        Some(CornerSet::new(tl?, tr?, br?, bl?))
    }
}

/// Outcome of a boundary detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Detected corners, absent when no quadrilateral was found.
    pub corners: Option<CornerSet>,
    /// Source image width in pixels.
    pub width: u32,
    /// Source image height in pixels.
    pub height: u32,
}

impl DetectionResult {
    pub fn found(corners: CornerSet, width: u32, height: u32) -> Self {
        Self {
            corners: Some(corners),
            width,
            height,
        }
    }

    pub fn not_found(width: u32, height: u32) -> Self {
        Self {
            corners: None,
            width,
            height,
        }
    }

    pub fn is_found(&self) -> bool {
        self.corners.is_some()
    }

    /// Detected corners, or the full-frame default when nothing was found.
    pub fn corners_or_full_frame(&self) -> CornerSet {
        self.corners
            .unwrap_or_else(|| CornerSet::full_frame(self.width, self.height))
    }

    /// Detected corners or [`ScanError::NoDetection`].
    pub fn require(&self) -> Result<CornerSet> {
        self.corners.ok_or(ScanError::NoDetection)
    }
}

/// Classification of errors for retry and logging decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Try again or substitute defaults (no document, deadline hit).
    Recoverable,
    /// The caller must correct its input before retrying.
    CallerFault,
    /// The current operation cannot complete.
    Fatal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> CornerSet {
        CornerSet::new(
            Point::new(10.0, 20.0),
            Point::new(110.0, 20.0),
            Point::new(110.0, 70.0),
            Point::new(10.0, 70.0),
        )
    }

    #[test]
    fn try_from_slice_requires_four_points() {
        let pts = [Point::new(0.0, 0.0); 3];
        let err = CornerSet::try_from_slice(&pts).unwrap_err();
        assert!(matches!(err, ScanError::InvalidInput(_)));
    }

    #[test]
    fn try_from_slice_rejects_nan() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(f64::NAN, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert!(CornerSet::try_from_slice(&pts).is_err());
    }

    #[test]
    fn with_corner_touches_only_one_slot() {
        let set = rect();
        let moved = set.with_corner(CornerIndex::BottomRight, Point::new(5.0, 5.0));
        assert_eq!(moved[CornerIndex::BottomRight], Point::new(5.0, 5.0));
        assert_eq!(moved.top_left(), set.top_left());
        assert_eq!(moved.top_right(), set.top_right());
        assert_eq!(moved.bottom_left(), set.bottom_left());
    }

    #[test]
    fn clockwise_rectangle_has_positive_area() {
        let set = rect();
        assert!((set.signed_area() - 5000.0).abs() < 1e-9);
        assert!(set.is_convex());
        assert_eq!(set.centroid(), Point::new(60.0, 45.0));
    }

    #[test]
    fn dragged_corner_can_make_set_non_convex() {
        let bent = rect().with_corner(CornerIndex::BottomRight, Point::new(30.0, 30.0));
        assert!(!bent.is_convex());
    }

    #[test]
    fn full_frame_fallback() {
        let result = DetectionResult::not_found(640, 480);
        let corners = result.corners_or_full_frame();
        assert_eq!(corners.top_right(), Point::new(640.0, 0.0));
        assert_eq!(corners.bottom_right(), Point::new(640.0, 480.0));
        assert!(matches!(result.require(), Err(ScanError::NoDetection)));
    }

    #[test]
    fn incomplete_quadrants_do_not_form_a_set() {
        let partial = QuadrantCorners::from_slots([
            Some(Point::new(0.0, 0.0)),
            Some(Point::new(1.0, 0.0)),
            None,
            Some(Point::new(0.0, 1.0)),
        ]);
        assert_eq!(partial.resolved(), 3);
        assert!(partial.into_corner_set().is_none());
    }

    #[test]
    fn corner_set_serializes_with_named_fields() {
        let json = serde_json::to_string(&rect()).unwrap();
        assert!(json.contains("\"topLeft\""));
        let back: CornerSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rect());
    }
}
