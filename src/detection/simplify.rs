//! Multi-pass reduction of a pixel contour into a clean, low-vertex polygon.
//!
//! Tuned for rectilinear architectural drawings:
//! 1. Ramer-Douglas-Peucker at `tolerance`
//! 2. Drop vertices whose turn angle is below the corner threshold
//! 3. Snap near-horizontal/vertical edges to exact axis alignment
//! 4. Merge nearly collinear vertices (`tolerance * 0.3`)
//! 5. Drop vertices closer than `max(3, tolerance * 0.2)` to the previous one

use crate::geometry::distance_to_segment;
use crate::models::Point;

/// Edges within this many degrees of an axis are snapped onto it
pub const ARCHITECTURAL_ANGLE_TOLERANCE: f64 = 5.0;

/// Run all five passes in order
pub fn simplify_polygon(points: &[Point], tolerance: f64, corner_angle_threshold: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let simplified = ramer_douglas_peucker(points, tolerance);
    let simplified = detect_corners(&simplified, corner_angle_threshold);
    let simplified = align_to_architectural_angles(&simplified, ARCHITECTURAL_ANGLE_TOLERANCE);
    let simplified = merge_collinear_points(&simplified, tolerance * 0.3);
    remove_close_points(&simplified, (tolerance * 0.2).max(3.0))
}

/// Keep only points deviating more than `tolerance` from the chord.
/// The first and last points are always kept.
pub fn ramer_douglas_peucker(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[points.len() - 1] = true;

    // Explicit stack: pixel contours can be long enough to make recursion deep
    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_idx = start;
        for i in start + 1..end {
            let dist = distance_to_segment(&points[i], &points[start], &points[end]);
            if dist > max_dist {
                max_dist = dist;
                max_idx = i;
            }
        }

        if max_dist > tolerance {
            kept[max_idx] = true;
            stack.push((start, max_idx));
            stack.push((max_idx, end));
        }
    }

    points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect()
}

/// Keep a vertex only if the path turns by more than `min_angle_degrees` there.
/// The first and last points are always kept.
pub fn detect_corners(points: &[Point], min_angle_degrees: f64) -> Vec<Point> {
    if points.len() <= 3 {
        return points.to_vec();
    }

    let min_angle = min_angle_degrees.to_radians();
    let mut result = vec![points[0]];

    for window in points[1..].windows(2) {
        let (curr, next) = (window[0], window[1]);
        let prev = result[result.len() - 1];

        let (v1x, v1y) = (curr.x - prev.x, curr.y - prev.y);
        let (v2x, v2y) = (next.x - curr.x, next.y - curr.y);
        let len1 = (v1x * v1x + v1y * v1y).sqrt();
        let len2 = (v2x * v2x + v2y * v2y).sqrt();
        if len1 == 0.0 || len2 == 0.0 {
            continue;
        }

        let cos_angle = (v1x * v2x + v1y * v2y) / (len1 * len2);
        if cos_angle.clamp(-1.0, 1.0).acos() > min_angle {
            result.push(curr);
        }
    }

    result.push(points[points.len() - 1]);
    result
}

/// Snap edges that lie within `angle_tolerance_degrees` of 0°, 90°, 180° or
/// 270° onto that axis, keeping their length.
///
/// Runs left to right: when an edge is snapped its end point moves, and the
/// moved point is the start of the next edge. The closing edge back to the
/// first point is left as is.
pub fn align_to_architectural_angles(points: &[Point], angle_tolerance_degrees: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let tolerance = angle_tolerance_degrees.to_radians();
    let mut result = Vec::with_capacity(points.len());
    let mut curr = points[0];

    for &next in &points[1..] {
        result.push(curr);
        curr = snap_edge(curr, next, tolerance).unwrap_or(next);
    }
    result.push(curr);

    result
}

/// Where `next` lands if the edge `curr -> next` is snapped onto an axis
fn snap_edge(curr: Point, next: Point, tolerance: f64) -> Option<Point> {
    let dx = next.x - curr.x;
    let dy = next.y - curr.y;
    let angle = dy.atan2(dx);
    let quarter = std::f64::consts::FRAC_PI_2;
    let steps = (angle / quarter).round();

    if (angle - steps * quarter).abs() >= tolerance {
        return None;
    }

    let dist = (dx * dx + dy * dy).sqrt();
    let (ux, uy) = match (steps as i64).rem_euclid(4) {
        0 => (1.0, 0.0),
        1 => (0.0, 1.0),
        2 => (-1.0, 0.0),
        _ => (0.0, -1.0),
    };
    Some(Point::new(curr.x + dist * ux, curr.y + dist * uy))
}

/// Drop vertices within `tolerance` of the segment joining their neighbors
pub fn merge_collinear_points(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 3 {
        return points.to_vec();
    }

    let mut result = vec![points[0]];
    for window in points[1..].windows(2) {
        let prev = result[result.len() - 1];
        if distance_to_segment(&window[0], &prev, &window[1]) > tolerance {
            result.push(window[0]);
        }
    }
    result.push(points[points.len() - 1]);
    result
}

/// Drop vertices closer than `min_distance` to the previously kept one.
/// Returns the input unchanged if fewer than three points would survive.
pub fn remove_close_points(points: &[Point], min_distance: f64) -> Vec<Point> {
    if points.len() <= 3 {
        return points.to_vec();
    }

    let mut result = vec![points[0]];
    for &curr in &points[1..] {
        if curr.distance_to(&result[result.len() - 1]) >= min_distance {
            result.push(curr);
        }
    }

    if result.len() < 3 {
        return points.to_vec();
    }
    result
}
