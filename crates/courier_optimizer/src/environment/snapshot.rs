use fxhash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::problem::location::GeoPoint;

/// A directed road segment between two positions. Traffic factors and
/// closures are directional: (a, b) closed does not imply (b, a) closed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectedEdge {
    from: GeoPoint,
    to: GeoPoint,
}

impl DirectedEdge {
    pub fn new(from: GeoPoint, to: GeoPoint) -> Self {
        DirectedEdge { from, to }
    }

    pub fn from(&self) -> GeoPoint {
        self.from
    }

    pub fn to(&self) -> GeoPoint {
        self.to
    }
}

/// An immutable view of current traffic, weather, and closure conditions.
///
/// A snapshot is never patched in place: updates build a new snapshot and
/// publish it wholesale, so a cost evaluation always reads one consistent
/// view. Lookups default to a neutral 1.0 factor for unknown keys.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentalSnapshot {
    traffic: FxHashMap<DirectedEdge, f64>,
    weather: FxHashMap<GeoPoint, f64>,
    closures: FxHashSet<DirectedEdge>,
}

impl EnvironmentalSnapshot {
    pub fn new(
        traffic: FxHashMap<DirectedEdge, f64>,
        weather: FxHashMap<GeoPoint, f64>,
        closures: FxHashSet<DirectedEdge>,
    ) -> Self {
        EnvironmentalSnapshot {
            traffic,
            weather,
            closures,
        }
    }

    pub fn traffic_factor(&self, edge: &DirectedEdge) -> f64 {
        self.traffic.get(edge).copied().unwrap_or(1.0)
    }

    pub fn weather_factor(&self, point: &GeoPoint) -> f64 {
        self.weather.get(point).copied().unwrap_or(1.0)
    }

    pub fn is_closed(&self, edge: &DirectedEdge) -> bool {
        self.closures.contains(edge)
    }

    pub fn traffic(&self) -> &FxHashMap<DirectedEdge, f64> {
        &self.traffic
    }

    pub fn weather(&self) -> &FxHashMap<GeoPoint, f64> {
        &self.weather
    }

    pub fn closures(&self) -> &FxHashSet<DirectedEdge> {
        &self.closures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_default_to_neutral_factor() {
        let snapshot = EnvironmentalSnapshot::default();
        let a = GeoPoint::new(48.0, 2.0);
        let b = GeoPoint::new(48.1, 2.1);

        assert_eq!(snapshot.traffic_factor(&DirectedEdge::new(a, b)), 1.0);
        assert_eq!(snapshot.weather_factor(&a), 1.0);
        assert!(!snapshot.is_closed(&DirectedEdge::new(a, b)));
    }

    #[test]
    fn closures_are_directional() {
        let a = GeoPoint::new(48.0, 2.0);
        let b = GeoPoint::new(48.1, 2.1);
        let mut closures = FxHashSet::default();
        closures.insert(DirectedEdge::new(a, b));
        let snapshot =
            EnvironmentalSnapshot::new(FxHashMap::default(), FxHashMap::default(), closures);

        assert!(snapshot.is_closed(&DirectedEdge::new(a, b)));
        assert!(!snapshot.is_closed(&DirectedEdge::new(b, a)));
    }
}
