// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Convex hull and minimum-area rotated rectangle (rotating calipers).

use docquad_core::Point;

/// A rotated rectangle. `angle` is the direction of the `width` side in
/// radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub center: Point,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
}

impl RotatedRect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull via Andrew's monotone chain, counter-clockwise in a y-up
/// frame, collinear points dropped.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.iter().copied().filter(Point::is_finite).collect();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Minimum-area bounding rectangle of a point set.
///
/// Returns `None` when the hull has fewer than three vertices (empty input,
/// a single point, or collinear points). Ties on area keep the first hull
/// edge examined.
pub fn min_area_rect(points: &[Point]) -> Option<RotatedRect> {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return None;
    }

    let n = hull.len();
    let mut best: Option<RotatedRect> = None;
    for i in 0..n {
        let origin = hull[i];
        let next = hull[(i + 1) % n];
        let (ex, ey) = (next.x - origin.x, next.y - origin.y);
        let len = ex.hypot(ey);
        if len < f64::EPSILON {
            continue;
        }
        let (ux, uy) = (ex / len, ey / len);
        let (vx, vy) = (-uy, ux);

        let (mut umin, mut umax, mut vmin, mut vmax) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for p in &hull {
            let (dx, dy) = (p.x - origin.x, p.y - origin.y);
            let u = dx * ux + dy * uy;
            let v = dx * vx + dy * vy;
            umin = umin.min(u);
            umax = umax.max(u);
            vmin = vmin.min(v);
            vmax = vmax.max(v);
        }

        let rect = RotatedRect {
            center: Point::new(
                origin.x + ux * (umin + umax) / 2.0 + vx * (vmin + vmax) / 2.0,
                origin.y + uy * (umin + umax) / 2.0 + vy * (vmin + vmax) / 2.0,
            ),
            width: umax - umin,
            height: vmax - vmin,
            angle: uy.atan2(ux),
        };
        if best.is_none_or(|b| rect.area() < b.area()) {
            best = Some(rect);
        }
    }
    best
}
