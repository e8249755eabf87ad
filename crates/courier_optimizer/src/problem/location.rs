use serde::{Deserialize, Serialize};

const MICRODEGREES_PER_DEGREE: f64 = 1_000_000.0;

/// A geographic position stored in microdegrees.
///
/// Storing integer microdegrees makes positions `Eq + Hash`, so they can key
/// traffic, weather, and closure maps directly. One microdegree is roughly
/// 0.11 m of latitude, well below delivery-location resolution.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct GeoPoint {
    lat_micro: i64,
    lon_micro: i64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint {
            lat_micro: (lat * MICRODEGREES_PER_DEGREE).round() as i64,
            lon_micro: (lon * MICRODEGREES_PER_DEGREE).round() as i64,
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat_micro as f64 / MICRODEGREES_PER_DEGREE
    }

    pub fn lon(&self) -> f64 {
        self.lon_micro as f64 / MICRODEGREES_PER_DEGREE
    }

    pub fn is_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat()) && (-180.0..=180.0).contains(&self.lon())
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lon): (f64, f64)) -> Self {
        GeoPoint::new(lat, lon)
    }
}

impl From<GeoPoint> for (f64, f64) {
    fn from(point: GeoPoint) -> Self {
        (point.lat(), point.lon())
    }
}

impl From<&GeoPoint> for geo_types::Point {
    fn from(point: &GeoPoint) -> Self {
        geo_types::Point::new(point.lon(), point.lat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_degrees() {
        let point = GeoPoint::new(48.858222, 2.2945);
        assert_eq!(point.lat(), 48.858222);
        assert_eq!(point.lon(), 2.2945);
    }

    #[test]
    fn nearby_points_are_distinct_keys() {
        let a = GeoPoint::new(48.858222, 2.2945);
        let b = GeoPoint::new(48.858223, 2.2945);
        assert_ne!(a, b);
    }

    #[test]
    fn range_check() {
        assert!(GeoPoint::new(90.0, 180.0).is_in_range());
        assert!(!GeoPoint::new(90.1, 0.0).is_in_range());
        assert!(!GeoPoint::new(0.0, -180.5).is_in_range());
    }

    #[test]
    fn serializes_as_lat_lon_pair() {
        let point = GeoPoint::new(52.52, 13.405);
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, "[52.52,13.405]");

        let back: GeoPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, point);
    }
}
