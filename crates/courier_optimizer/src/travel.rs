use jiff::SignedDuration;

use crate::{
    environment::snapshot::{DirectedEdge, EnvironmentalSnapshot},
    problem::location::GeoPoint,
};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
const DEFAULT_AVERAGE_SPEED_KMH: f64 = 40.0;

/// Outcome of a travel-time query. A closed edge is `Blocked` rather than an
/// infinite duration, so no infinity can leak into cost sums downstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TravelOutcome {
    Blocked,
    Open(SignedDuration),
}

impl TravelOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, TravelOutcome::Blocked)
    }
}

/// Environment-sensitive travel-time estimate between two positions, based
/// on great-circle distance at a fixed average speed.
#[derive(Debug, Clone, Copy)]
pub struct TravelTimeModel {
    average_speed_kmh: f64,
}

impl Default for TravelTimeModel {
    fn default() -> Self {
        TravelTimeModel {
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
        }
    }
}

impl TravelTimeModel {
    pub fn new(average_speed_kmh: f64) -> Self {
        TravelTimeModel { average_speed_kmh }
    }

    /// Travel time under neutral conditions. Symmetric, zero for `a == a`.
    pub fn base_time(&self, from: GeoPoint, to: GeoPoint) -> SignedDuration {
        let meters = haversine_distance(&from, &to);
        let hours = meters / 1000.0 / self.average_speed_kmh;
        SignedDuration::from_secs_f64(hours * 3600.0)
    }

    /// Travel time under `snapshot`'s conditions: base time scaled by the
    /// edge's traffic factor and the worse of the two endpoint weather
    /// factors, or `Blocked` when the directed edge is closed.
    pub fn travel_time(
        &self,
        from: GeoPoint,
        to: GeoPoint,
        snapshot: &EnvironmentalSnapshot,
    ) -> TravelOutcome {
        let edge = DirectedEdge::new(from, to);
        if snapshot.is_closed(&edge) {
            return TravelOutcome::Blocked;
        }

        let traffic = snapshot.traffic_factor(&edge);
        let weather = snapshot
            .weather_factor(&from)
            .max(snapshot.weather_factor(&to));

        let base = self.base_time(from, to);
        TravelOutcome::Open(SignedDuration::from_secs_f64(
            base.as_secs_f64() * traffic * weather,
        ))
    }
}

fn haversine_distance(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let from: geo_types::Point = from.into();
    let to: geo_types::Point = to.into();

    let lat1_rad = from.y().to_radians();
    let lon1_rad = from.x().to_radians();
    let lat2_rad = to.y().to_radians();
    let lon2_rad = to.x().to_radians();

    let delta_lat = lat2_rad - lat1_rad;
    let delta_lon = lon2_rad - lon1_rad;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}
