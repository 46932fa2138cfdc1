//! Turning detected polygons into zone drafts for the zone editor.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{BoundingBox, DetectedPolygon};

pub const ZONE_TYPE_APARTMENT: &str = "apartment_unit";
pub const ENTITY_TYPE_APARTMENT: &str = "apartment";

/// An apartment as listed by the project API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApartmentRecord {
    pub id: u64,
    pub apartment_number: String,
    #[serde(default)]
    pub status: String,
}

/// Colors a zone is drawn with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDisplay {
    #[serde(rename = "fill")]
    pub fill_color: String,
    #[serde(rename = "stroke")]
    pub stroke_color: String,
    #[serde(rename = "hover")]
    pub hover_color: String,
}

/// Stroke color by sales status; fill and hover are the same color at 50% and 80% alpha
pub fn status_colors(status: &str) -> ZoneDisplay {
    let stroke = match status {
        "available" => "#10b981",
        "reserved" => "#f59e0b",
        "sold" => "#6b7280",
        _ => "#3b82f6",
    };

    ZoneDisplay {
        fill_color: format!("{}80", stroke),
        stroke_color: stroke.to_string(),
        hover_color: format!("{}cc", stroke),
    }
}

/// A zone ready to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDraft {
    pub id: Uuid,
    pub zone_type: String,
    pub entity_type: String,
    pub entity_id: Option<u64>,
    pub label: String,
    #[serde(rename = "svg_coordinates")]
    pub points: Vec<[f64; 2]>,
    pub bounding_box: BoundingBox,
    #[serde(rename = "display_config")]
    pub display: ZoneDisplay,
}

impl ZoneDraft {
    /// Zone for a polygon no apartment has been matched to yet
    pub fn unassigned(polygon: &DetectedPolygon, index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            zone_type: ZONE_TYPE_APARTMENT.to_string(),
            entity_type: ENTITY_TYPE_APARTMENT.to_string(),
            entity_id: None,
            label: format!("Zone {}", index + 1),
            points: polygon.coordinates(),
            bounding_box: polygon.bounding_box,
            display: status_colors(""),
        }
    }

    pub fn for_apartment(polygon: &DetectedPolygon, apartment: &ApartmentRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            zone_type: ZONE_TYPE_APARTMENT.to_string(),
            entity_type: ENTITY_TYPE_APARTMENT.to_string(),
            entity_id: Some(apartment.id),
            label: format!("Apartment {}", apartment.apartment_number),
            points: polygon.coordinates(),
            bounding_box: polygon.bounding_box,
            display: status_colors(&apartment.status),
        }
    }
}

/// Pair polygons with apartments in order. Polygons beyond the last
/// apartment become unassigned zones; extra apartments are left out.
pub fn assign_apartments(polygons: &[DetectedPolygon], apartments: &[ApartmentRecord]) -> Vec<ZoneDraft> {
    if apartments.len() > polygons.len() {
        log::warn!(
            "{} apartments but only {} polygons; {} apartments left without a zone",
            apartments.len(),
            polygons.len(),
            apartments.len() - polygons.len()
        );
    }

    polygons
        .iter()
        .enumerate()
        .map(|(i, polygon)| match apartments.get(i) {
            Some(apartment) => ZoneDraft::for_apartment(polygon, apartment),
            None => ZoneDraft::unassigned(polygon, i),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{bounding_box, centroid, polygon_area, rectangle};

    fn polygon(x: f64) -> DetectedPolygon {
        let points = rectangle(x, 0.0, 10.0, 10.0);
        DetectedPolygon {
            bounding_box: bounding_box(&points),
            area: polygon_area(&points),
            centroid: centroid(&points),
            color: None,
            points,
        }
    }

    fn apartment(id: u64, number: &str, status: &str) -> ApartmentRecord {
        ApartmentRecord {
            id,
            apartment_number: number.to_string(),
            status: status.to_string(),
        }
    }

    #[test]
    fn test_status_colors() {
        let available = status_colors("available");
        assert_eq!(available.stroke_color, "#10b981");
        assert_eq!(available.fill_color, "#10b98180");
        assert_eq!(available.hover_color, "#10b981cc");
        assert_eq!(status_colors("reserved").stroke_color, "#f59e0b");
        assert_eq!(status_colors("sold").stroke_color, "#6b7280");
        assert_eq!(status_colors("unknown").stroke_color, "#3b82f6");
    }

    #[test]
    fn test_assign_in_order() {
        let polygons = vec![polygon(0.0), polygon(20.0), polygon(40.0)];
        let apartments = vec![apartment(7, "101", "available"), apartment(9, "102", "sold")];

        let zones = assign_apartments(&polygons, &apartments);
        assert_eq!(zones.len(), 3);
        assert_eq!(zones[0].entity_id, Some(7));
        assert_eq!(zones[0].label, "Apartment 101");
        assert_eq!(zones[1].display.stroke_color, "#6b7280");
        assert_eq!(zones[2].entity_id, None);
        assert_eq!(zones[2].label, "Zone 3");
        assert_eq!(zones[2].points[1], [50.0, 0.0]);
        assert_ne!(zones[0].id, zones[1].id);
    }

    #[test]
    fn test_surplus_apartments_are_dropped() {
        let apartments = vec![apartment(1, "1", ""), apartment(2, "2", "")];
        let zones = assign_apartments(&[polygon(0.0)], &apartments);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].entity_id, Some(1));
    }

    #[test]
    fn test_zone_payload_shape() {
        let zone = ZoneDraft::for_apartment(&polygon(0.0), &apartment(3, "A-3", "reserved"));
        let json = serde_json::to_value(&zone).unwrap();

        assert_eq!(json["zone_type"], "apartment_unit");
        assert_eq!(json["entity_type"], "apartment");
        assert_eq!(json["display_config"]["fill"], "#f59e0b80");
        assert_eq!(json["svg_coordinates"][0], serde_json::json!([0.0, 0.0]));
    }

    #[test]
    fn test_apartment_records_from_json() {
        let records: Vec<ApartmentRecord> =
            serde_json::from_str(r#"[{"id": 1, "apartment_number": "12"}]"#).unwrap();
        assert_eq!(records[0].status, "");
    }
}
