use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// WGS84 point. GeoJSON stores `[lng, lat]`; this type is always lat-first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    pub fn from_geojson(position: [f64; 2]) -> Self {
        Self {
            lat: position[1],
            lng: position[0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    pub fn contains(&self, p: LatLng) -> bool {
        p.is_finite()
            && p.lat >= self.south_west.lat
            && p.lat <= self.north_east.lat
            && p.lng >= self.south_west.lng
            && p.lng <= self.north_east.lng
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south_west.lat + self.north_east.lat) / 2.0,
            lng: (self.south_west.lng + self.north_east.lng) / 2.0,
        }
    }
}

pub const HANOI_BOUNDS: Bounds = Bounds {
    south_west: LatLng::new(20.85, 105.60),
    north_east: LatLng::new(21.25, 106.00),
};

pub const HANOI_CENTER: LatLng = LatLng::new(21.0285, 105.8542);

/// Reject non-finite coordinates and anything outside the service area.
pub fn ensure_in_hanoi(p: LatLng) -> Result<LatLng, RequestError> {
    if !p.is_finite() {
        return Err(RequestError::NonFiniteCoordinate);
    }
    if !HANOI_BOUNDS.contains(p) {
        return Err(RequestError::OutsideHanoi {
            lat: p.lat,
            lng: p.lng,
        });
    }
    Ok(p)
}

/// Subset of GeoJSON geometries the backend emits. Anything else decodes to
/// `Unsupported` and is skipped by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// Representative point: the point itself, or the mean of the outer ring.
    pub fn anchor(&self) -> Option<LatLng> {
        match self {
            Self::Point { coordinates } => Some(LatLng::from_geojson(*coordinates)),
            Self::LineString { coordinates } => mean_position(coordinates),
            Self::Polygon { coordinates } => coordinates.first().and_then(|r| mean_position(r)),
            Self::MultiPolygon { coordinates } => coordinates
                .first()
                .and_then(|poly| poly.first())
                .and_then(|r| mean_position(r)),
            Self::Unsupported => None,
        }
    }

    /// Hit test for area geometries. Holes are honoured for polygons.
    pub fn contains(&self, p: LatLng) -> bool {
        match self {
            Self::Polygon { coordinates } => polygon_contains(coordinates, p),
            Self::MultiPolygon { coordinates } => {
                coordinates.iter().any(|poly| polygon_contains(poly, p))
            }
            _ => false,
        }
    }

    /// `(min_lng, min_lat, max_lng, max_lat)`.
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        let mut acc: Option<(f64, f64, f64, f64)> = None;
        let mut push = |pos: &[f64; 2]| {
            let (x, y) = (pos[0], pos[1]);
            acc = Some(match acc {
                None => (x, y, x, y),
                Some((a, b, c, d)) => (a.min(x), b.min(y), c.max(x), d.max(y)),
            });
        };
        match self {
            Self::Point { coordinates } => push(coordinates),
            Self::LineString { coordinates } => coordinates.iter().for_each(&mut push),
            Self::Polygon { coordinates } => coordinates.iter().flatten().for_each(&mut push),
            Self::MultiPolygon { coordinates } => coordinates
                .iter()
                .flatten()
                .flatten()
                .for_each(&mut push),
            Self::Unsupported => {}
        }
        acc
    }
}

fn mean_position(ring: &[[f64; 2]]) -> Option<LatLng> {
    if ring.is_empty() {
        return None;
    }
    let n = ring.len() as f64;
    let (sx, sy) = ring
        .iter()
        .fold((0.0, 0.0), |(sx, sy), pos| (sx + pos[0], sy + pos[1]));
    Some(LatLng {
        lat: sy / n,
        lng: sx / n,
    })
}

fn polygon_contains(rings: &[Vec<[f64; 2]>], p: LatLng) -> bool {
    let Some((outer, holes)) = rings.split_first() else {
        return false;
    };
    ring_contains(outer, p) && !holes.iter().any(|hole| ring_contains(hole, p))
}

/// Even-odd ray casting in lng/lat space.
fn ring_contains(ring: &[[f64; 2]], p: LatLng) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let (x, y) = (p.lng, p.lat);
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Properties shared by zone and report features. The backend uses several
/// spellings for the same field; aliases fold them together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureProperties {
    #[serde(deserialize_with = "crate::api::lenient_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(alias = "type")]
    pub zone_type: Option<String>,
    #[serde(alias = "type_display")]
    pub zone_type_display: Option<String>,
    pub district: Option<String>,
    pub ward: Option<String>,
    pub street: Option<String>,
    #[serde(alias = "max_depth_cm")]
    pub max_depth: Option<f64>,
    pub report_count: Option<u32>,
    pub last_reported: Option<String>,
    pub flood_cause: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub water_depth: Option<f64>,
    pub severity: Option<String>,
    pub severity_display: Option<String>,
    pub created_at: Option<String>,
    pub reporter_name: Option<String>,
    pub status: Option<String>,
}

impl FeatureProperties {
    pub fn title(&self) -> &str {
        self.name
            .as_deref()
            .or(self.address.as_deref())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Flood point")
    }

    pub fn zone_kind(&self) -> ZoneType {
        ZoneType::parse(self.zone_type.as_deref().unwrap_or_default())
    }

    pub fn severity_kind(&self) -> Severity {
        match self.severity.as_deref() {
            Some(raw) => Severity::parse(raw),
            None => self
                .water_depth
                .map(Severity::from_depth_cm)
                .unwrap_or(Severity::Unknown),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneType {
    Black,
    Frequent,
    Seasonal,
    Rain,
    Tide,
    Other,
}

impl ZoneType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "black" => Self::Black,
            "frequent" => Self::Frequent,
            "seasonal" => Self::Seasonal,
            "rain" => Self::Rain,
            "tide" => Self::Tide,
            _ => Self::Other,
        }
    }

    pub fn color_rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Black => (0xc0, 0x39, 0x2b),
            Self::Frequent => (0xe7, 0x4c, 0x3c),
            Self::Seasonal => (0xf3, 0x9c, 0x12),
            Self::Rain => (0x34, 0x98, 0xdb),
            Self::Tide => (0x9b, 0x59, 0xb6),
            Self::Other => (0x95, 0xa5, 0xa6),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Black => "Flood black spot",
            Self::Frequent => "Frequently flooded",
            Self::Seasonal => "Seasonal flooding",
            Self::Rain => "Floods in heavy rain",
            Self::Tide => "Tidal flooding",
            Self::Other => "Unclassified",
        }
    }
}

/// Report severity bands (cm): light < 20, medium 20–40, heavy 40–70, severe > 70.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Light,
    Medium,
    Heavy,
    Severe,
    Unknown,
}

impl Severity {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Self::Light,
            "medium" => Self::Medium,
            "heavy" => Self::Heavy,
            "severe" => Self::Severe,
            _ => Self::Unknown,
        }
    }

    pub fn from_depth_cm(depth: f64) -> Self {
        if !depth.is_finite() || depth < 0.0 {
            Self::Unknown
        } else if depth < 20.0 {
            Self::Light
        } else if depth < 40.0 {
            Self::Medium
        } else if depth <= 70.0 {
            Self::Heavy
        } else {
            Self::Severe
        }
    }

    pub fn color_rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Light => (0x2e, 0xcc, 0x71),
            Self::Medium => (0xf3, 0x9c, 0x12),
            Self::Heavy => (0xe6, 0x7e, 0x22),
            Self::Severe => (0xc0, 0x39, 0x2b),
            Self::Unknown => (0x7f, 0x8c, 0x8d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<[f64; 2]> {
        vec![
            [x0, y0],
            [x0 + size, y0],
            [x0 + size, y0 + size],
            [x0, y0 + size],
            [x0, y0],
        ]
    }

    #[test]
    fn hanoi_bounds_accept_old_quarter_and_reject_saigon() {
        assert!(ensure_in_hanoi(HANOI_CENTER).is_ok());
        assert_eq!(
            ensure_in_hanoi(LatLng::new(10.7769, 106.7009)),
            Err(RequestError::OutsideHanoi {
                lat: 10.7769,
                lng: 106.7009
            })
        );
        assert_eq!(
            ensure_in_hanoi(LatLng::new(f64::NAN, 105.8)),
            Err(RequestError::NonFiniteCoordinate)
        );
    }

    #[test]
    fn polygon_hit_test_respects_holes() {
        let geometry = Geometry::Polygon {
            coordinates: vec![square(105.80, 21.00, 0.10), square(105.84, 21.04, 0.02)],
        };
        assert!(geometry.contains(LatLng::new(21.01, 105.81)));
        assert!(!geometry.contains(LatLng::new(21.05, 105.85)));
        assert!(!geometry.contains(LatLng::new(21.20, 105.81)));
    }

    #[test]
    fn multipolygon_hits_any_member() {
        let geometry = Geometry::MultiPolygon {
            coordinates: vec![
                vec![square(105.70, 20.90, 0.01)],
                vec![square(105.90, 21.10, 0.01)],
            ],
        };
        assert!(geometry.contains(LatLng::new(21.105, 105.905)));
        assert!(!geometry.contains(LatLng::new(21.0, 105.8)));
    }

    #[test]
    fn decodes_backend_feature_with_aliases() {
        let raw = serde_json::json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [105.85, 21.03]},
            "properties": {
                "id": "zone_7",
                "name": "Phố Huế",
                "type": "black",
                "max_depth_cm": 45.0,
                "unknown_extra": true
            }
        });
        let feature: Feature = serde_json::from_value(raw).expect("feature");
        assert_eq!(feature.properties.zone_kind(), ZoneType::Black);
        assert_eq!(feature.properties.max_depth, Some(45.0));
        assert_eq!(
            feature.geometry.and_then(|g| g.anchor()),
            Some(LatLng::new(21.03, 105.85))
        );
    }

    #[test]
    fn unknown_geometry_type_is_tolerated() {
        let raw = serde_json::json!({
            "geometry": {"type": "GeometryCollection", "geometries": []},
            "properties": {}
        });
        let feature: Feature = serde_json::from_value(raw).expect("feature");
        assert_eq!(feature.geometry, Some(Geometry::Unsupported));
        assert_eq!(feature.properties.title(), "Flood point");
    }

    #[test]
    fn severity_falls_back_to_depth_bands() {
        let props = FeatureProperties {
            water_depth: Some(55.0),
            ..Default::default()
        };
        assert_eq!(props.severity_kind(), Severity::Heavy);
        assert_eq!(Severity::from_depth_cm(5.0), Severity::Light);
        assert_eq!(Severity::from_depth_cm(80.0), Severity::Severe);
    }

    #[test]
    fn bbox_spans_all_rings() {
        let geometry = Geometry::Polygon {
            coordinates: vec![square(105.80, 21.00, 0.10)],
        };
        let (min_x, min_y, max_x, max_y) = geometry.bbox().expect("bbox");
        assert!((min_x - 105.80).abs() < 1e-9);
        assert!((min_y - 21.00).abs() < 1e-9);
        assert!((max_x - 105.90).abs() < 1e-9);
        assert!((max_y - 21.10).abs() < 1e-9);
    }
}
