//! Point and polygon math shared by the detector and the zone tooling.

use crate::models::{BoundingBox, Point};

/// Polygon area using the shoelace formula
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        area += p.x * q.y - q.x * p.y;
    }
    area.abs() / 2.0
}

/// Bounding box of a set of points (all zeros when empty)
pub fn bounding_box(points: &[Point]) -> BoundingBox {
    let Some(first) = points.first() else {
        return BoundingBox::default();
    };

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}

/// Mean of the vertices
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}

pub fn is_valid_polygon(points: &[Point]) -> bool {
    points.len() >= 3
}

/// Ray casting point-in-polygon test
pub fn point_in_polygon(point: &Point, polygon: &[Point]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    if n == 0 {
        return false;
    }

    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (&polygon[i], &polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Distance from a point to the closest point of the segment `start`-`end`
pub fn distance_to_segment(point: &Point, start: &Point, end: &Point) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq == 0.0 {
        return point.distance_to(start);
    }

    let t = (((point.x - start.x) * dx + (point.y - start.y) * dy) / length_sq).clamp(0.0, 1.0);
    point.distance_to(&Point::new(start.x + t * dx, start.y + t * dy))
}

pub fn is_point_near_edge(point: &Point, start: &Point, end: &Point, threshold: f64) -> bool {
    distance_to_segment(point, start, end) <= threshold
}

pub fn translate(points: &[Point], offset_x: f64, offset_y: f64) -> Vec<Point> {
    points
        .iter()
        .map(|p| Point::new(p.x + offset_x, p.y + offset_y))
        .collect()
}

/// Scale about the bounding box center
pub fn scale(points: &[Point], factor: f64) -> Vec<Point> {
    let bbox = bounding_box(points);
    let cx = bbox.x + bbox.width / 2.0;
    let cy = bbox.y + bbox.height / 2.0;

    points
        .iter()
        .map(|p| Point::new(cx + (p.x - cx) * factor, cy + (p.y - cy) * factor))
        .collect()
}

/// Mirror across a vertical axis (defaults to the bounding box center)
pub fn mirror_horizontal(points: &[Point], center_x: Option<f64>) -> Vec<Point> {
    let center = center_x.unwrap_or_else(|| {
        let bbox = bounding_box(points);
        bbox.x + bbox.width / 2.0
    });
    points.iter().map(|p| Point::new(2.0 * center - p.x, p.y)).collect()
}

/// Mirror across a horizontal axis (defaults to the bounding box center)
pub fn mirror_vertical(points: &[Point], center_y: Option<f64>) -> Vec<Point> {
    let center = center_y.unwrap_or_else(|| {
        let bbox = bounding_box(points);
        bbox.y + bbox.height / 2.0
    });
    points.iter().map(|p| Point::new(p.x, 2.0 * center - p.y)).collect()
}

pub fn snap_to_grid(point: &Point, grid_size: f64) -> Point {
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Vec<Point> {
    vec![
        Point::new(x, y),
        Point::new(x + width, y),
        Point::new(x + width, y + height),
        Point::new(x, y + height),
    ]
}

pub fn to_backend_format(points: &[Point]) -> Vec<[f64; 2]> {
    points.iter().map(|p| [p.x, p.y]).collect()
}

pub fn from_backend_format(coords: &[[f64; 2]]) -> Vec<Point> {
    coords.iter().map(|&[x, y]| Point::new(x, y)).collect()
}

/// SVG `points` attribute, e.g. `"0,0 10,0 10,10"`
pub fn to_svg_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse an SVG `points` attribute; malformed pairs are dropped
pub fn from_svg_points(value: &str) -> Vec<Point> {
    value
        .split_whitespace()
        .filter_map(|pair| {
            let (x, y) = pair.split_once(',')?;
            Some(Point::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
        })
        .collect()
}
