// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry kernel: distances, polygon measures, quadrant-based corner
// ordering, and the perspective transform. Pure functions, no state.

pub mod homography;
pub mod hull;

pub use homography::{Homography, compute_transform};
pub use hull::{RotatedRect, convex_hull, min_area_rect};

use docquad_core::{CornerIndex, CornerSet, Point, QuadrantCorners};

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance_to(&b)
}

/// Arithmetic mean of a point set, `None` when empty.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

/// Which corner region `p` falls in relative to `center`.
///
/// Strict comparisons: a point on either axis through `center` belongs to no
/// quadrant.
pub fn classify_quadrant(p: Point, center: Point) -> Option<CornerIndex> {
    let left = p.x < center.x;
    let right = p.x > center.x;
    let above = p.y < center.y;
    let below = p.y > center.y;
    match (left, right, above, below) {
        (true, _, true, _) => Some(CornerIndex::TopLeft),
        (_, true, true, _) => Some(CornerIndex::TopRight),
        (_, true, _, true) => Some(CornerIndex::BottomRight),
        (true, _, _, true) => Some(CornerIndex::BottomLeft),
        _ => None,
    }
}

/// Classify an unordered point set into the four corner roles.
///
/// The reference center is the center of the minimum-area rotated rectangle
/// around the points (the centroid when the hull is degenerate). Within each
/// quadrant the point farthest from the center wins; on an exact distance tie
/// the first point in input order is kept.
pub fn order_corners(points: &[Point]) -> QuadrantCorners {
    let center = match min_area_rect(points) {
        Some(rect) => rect.center,
        None => match centroid(points) {
            Some(c) => c,
            None => return QuadrantCorners::default(),
        },
    };

    let mut best: [Option<(Point, f64)>; 4] = [None; 4];
    for &p in points {
        let Some(corner) = classify_quadrant(p, center) else {
            continue;
        };
        let d = distance(p, center);
        let slot = &mut best[corner.index()];
        match slot {
            Some((_, best_d)) if d <= *best_d => {}
            _ => *slot = Some((p, d)),
        }
    }

    QuadrantCorners::from_slots(best.map(|slot| slot.map(|(p, _)| p)))
}

/// Output size for rectification: the longer of each pair of opposing edges.
pub fn perspective_target_size(corners: &CornerSet) -> (f64, f64) {
    let width = distance(corners.top_left(), corners.top_right())
        .max(distance(corners.bottom_left(), corners.bottom_right()));
    let height = distance(corners.top_left(), corners.bottom_left())
        .max(distance(corners.top_right(), corners.bottom_right()));
    (width, height)
}

/// Absolute polygon area via the shoelace formula. Zero below 3 vertices.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let mut twice = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    twice.abs() / 2.0
}

/// Length of a polyline; `closed` adds the segment back to the first point.
pub fn arc_length(points: &[Point], closed: bool) -> f64 {
    let mut length: f64 = points.windows(2).map(|w| distance(w[0], w[1])).sum();
    if closed && points.len() > 2 {
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            length += distance(last, first);
        }
    }
    length
}

/// Douglas-Peucker simplification of a closed contour.
///
/// The ring is split between two mutually distant vertices (the point
/// farthest from an arbitrary start, then the point farthest from that one).
/// Both lie on the hull, so a contour that begins partway along an edge does
/// not force its first pixel into the result.
pub fn approximate_polygon(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() <= 3 {
        return points.to_vec();
    }
    let start = farthest_index(points, points[0]);
    let far = farthest_index(points, points[start]);
    if far == start {
        return vec![points[start]];
    }

    let n = points.len();
    let ring: Vec<Point> = points[start..].iter().chain(&points[..start]).copied().collect();
    let split = (far + n - start) % n;

    let mut second_half: Vec<Point> = ring[split..].to_vec();
    second_half.push(ring[0]);

    let mut result = simplify_open(&ring[..=split], epsilon);
    let tail = simplify_open(&second_half, epsilon);
    // Both halves share their endpoints with the other half.
    result.extend_from_slice(&tail[1..tail.len() - 1]);
    result
}

/// Index of the point farthest from `from`; the first one wins a tie.
fn farthest_index(points: &[Point], from: Point) -> usize {
    points
        .iter()
        .enumerate()
        .fold((0, 0.0), |(bi, bd), (i, p)| {
            let d = distance(from, *p);
            if d > bd { (i, d) } else { (bi, bd) }
        })
        .0
}

/// Iterative Douglas-Peucker on an open polyline. Endpoints are always kept.
fn simplify_open(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut stack = vec![(0usize, last)];
    while let Some((start, end)) = stack.pop() {
        if end - start <= 1 {
            continue;
        }
        let mut max_dist = 0.0;
        let mut max_index = start;
        for i in (start + 1)..end {
            let d = point_to_line_distance(points[i], points[start], points[end]);
            if d > max_dist {
                max_dist = d;
                max_index = i;
            }
        }
        if max_dist > epsilon {
            keep[max_index] = true;
            stack.push((start, max_index));
            stack.push((max_index, end));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Perpendicular distance from `p` to the infinite line through `a` and `b`.
fn point_to_line_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return distance(p, a);
    }
    ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / len
}
