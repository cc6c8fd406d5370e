// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Four-point homography (projective transform) between two planes.

use docquad_core::{CornerSet, Point, Result, ScanError};
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

/// A 3x3 projective transform, normalised so that `h[(2, 2)] == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    h: Matrix3<f64>,
}

impl Homography {
    pub fn identity() -> Self {
        Self {
            h: Matrix3::identity(),
        }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.h
    }

    /// Row-major copy of the matrix.
    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    /// Map a point. `None` when it lands on the line at infinity.
    #[inline]
    pub fn apply(&self, p: Point) -> Option<Point> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        let w = v[2];
        if w.abs() < 1e-12 {
            return None;
        }
        Some(Point::new(v[0] / w, v[1] / w))
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().and_then(normalize).map(|h| Self { h })
    }

    /// Solve `dst ~ H * src` from four correspondences.
    ///
    /// Both point sets are Hartley-normalised before the 8x8 system is solved,
    /// which keeps the solve well conditioned at multi-megapixel coordinates.
    /// Returns `None` when three of the points are collinear (or nearly so).
    pub fn from_correspondences(src: &[Point; 4], dst: &[Point; 4]) -> Option<Self> {
        let (s, ts) = hartley_normalize(src);
        let (d, td) = hartley_normalize(dst);
        if has_collinear_triple(&s) || has_collinear_triple(&d) {
            return None;
        }

        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();
        for k in 0..4 {
            let (x, y) = (s[k].x, s[k].y);
            let (u, v) = (d[k].x, d[k].y);
            let r = 2 * k;

            a[(r, 0)] = x;
            a[(r, 1)] = y;
            a[(r, 2)] = 1.0;
            a[(r, 6)] = -u * x;
            a[(r, 7)] = -u * y;
            b[r] = u;

            a[(r + 1, 3)] = x;
            a[(r + 1, 4)] = y;
            a[(r + 1, 5)] = 1.0;
            a[(r + 1, 6)] = -v * x;
            a[(r + 1, 7)] = -v * y;
            b[r + 1] = v;
        }

        let sol = a.lu().solve(&b)?;
        if !sol.iter().all(|v| v.is_finite()) {
            return None;
        }
        let hn = Matrix3::new(sol[0], sol[1], sol[2], sol[3], sol[4], sol[5], sol[6], sol[7], 1.0);
        if hn.determinant().abs() < 1e-9 {
            return None;
        }

        let h = td.try_inverse()? * hn * ts;
        normalize(h).map(|h| Self { h })
    }
}

fn normalize(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 || !h.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some(h / s)
}

/// Any three of the (normalised) points spanning a near-zero area.
fn has_collinear_triple(pts: &[Point; 4]) -> bool {
    const TRIPLES: [(usize, usize, usize); 4] = [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)];
    TRIPLES.iter().any(|&(i, j, k)| {
        let (a, b, c) = (pts[i], pts[j], pts[k]);
        ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs() < 1e-6
    })
}

/// Translate to the centroid and scale so the mean distance is sqrt(2).
fn hartley_normalize(pts: &[Point; 4]) -> ([Point; 4], Matrix3<f64>) {
    let cx = pts.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = pts.iter().map(|p| p.y).sum::<f64>() / 4.0;
    let mean_dist = pts
        .iter()
        .map(|p| (p.x - cx).hypot(p.y - cy))
        .sum::<f64>()
        / 4.0;
    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let out = pts.map(|p| Point::new(s * (p.x - cx), s * (p.y - cy)));
    (out, t)
}

/// Transform taking the four corners to `(0,0), (w,0), (w,h), (0,h)`.
pub fn compute_transform(corners: &CornerSet, target_w: f64, target_h: f64) -> Result<Homography> {
    corners.ensure_finite()?;
    if !(target_w > 0.0 && target_h > 0.0 && target_w.is_finite() && target_h.is_finite()) {
        return Err(ScanError::invalid(format!(
            "target size {target_w}x{target_h} has zero area"
        )));
    }
    let dst = [
        Point::new(0.0, 0.0),
        Point::new(target_w, 0.0),
        Point::new(target_w, target_h),
        Point::new(0.0, target_h),
    ];
    Homography::from_correspondences(corners.points(), &dst)
        .ok_or_else(|| ScanError::invalid("corners are degenerate (three or more collinear)"))
}
