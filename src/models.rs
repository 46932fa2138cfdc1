use serde::{Deserialize, Serialize};

/// Pixel-space coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An RGB color sample or cluster centroid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Euclidean distance in RGB space
    pub fn distance(&self, other: &Color) -> f64 {
        let dr = self.r as f64 - other.r as f64;
        let dg = self.g as f64 - other.g as f64;
        let db = self.b as f64 - other.b as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// CSS-style label, e.g. `rgb(200,60,60)`
    pub fn css(&self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    /// Walls, lines and background: near-gray and either very light or very dark
    pub fn is_structural(&self) -> bool {
        let (r, g, b) = (self.r as i16, self.g as i16, self.b as i16);
        let is_gray = (r - g).abs() < 15 && (g - b).abs() < 15 && (r - b).abs() < 15;
        is_gray && (r > 200 || r < 50)
    }
}

/// A group of similar color samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCluster {
    pub color: Color,
    pub count: u32,
}

/// Axis-aligned bounding box in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x && point.x <= self.max_x() && point.y >= self.y && point.y <= self.max_y()
    }

    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        !(self.max_x() < other.x
            || self.x > other.max_x()
            || self.max_y() < other.y
            || self.y > other.max_y())
    }
}

/// One apartment candidate recovered from a floor plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPolygon {
    #[serde(with = "point_pairs")]
    pub points: Vec<Point>,
    pub bounding_box: BoundingBox,
    /// Shoelace area of the traced pixel contour
    pub area: f64,
    pub centroid: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl DetectedPolygon {
    /// Coordinates as `[[x, y], ...]`
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        crate::geometry::to_backend_format(&self.points)
    }
}

/// Serializes points as `[[x, y], ...]`, the format the zone storage expects.
pub(crate) mod point_pairs {
    use super::Point;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(points: &[Point], serializer: S) -> Result<S::Ok, S::Error> {
        let pairs: Vec<[f64; 2]> = points.iter().map(|p| [p.x, p.y]).collect();
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Point>, D::Error> {
        let pairs = Vec::<[f64; 2]>::deserialize(deserializer)?;
        Ok(pairs.into_iter().map(|[x, y]| Point { x, y }).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_colors() {
        assert!(Color::new(255, 255, 255).is_structural());
        assert!(Color::new(20, 25, 22).is_structural());
        assert!(!Color::new(128, 128, 128).is_structural());
        assert!(!Color::new(230, 120, 120).is_structural());
    }

    #[test]
    fn test_polygon_serializes_as_coordinate_pairs() {
        let polygon = DetectedPolygon {
            points: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 5.0)],
            bounding_box: BoundingBox { x: 0.0, y: 0.0, width: 10.0, height: 5.0 },
            area: 25.0,
            centroid: Point::new(6.0, 2.0),
            color: Some("rgb(1,2,3)".to_string()),
        };

        let json = serde_json::to_value(&polygon).unwrap();
        assert_eq!(json["points"][1], serde_json::json!([10.0, 0.0]));
        assert_eq!(json["boundingBox"]["width"], serde_json::json!(10.0));

        let back: DetectedPolygon = serde_json::from_value(json).unwrap();
        assert_eq!(back, polygon);
    }
}
