use fxhash::{FxHashMap, FxHashSet};
use jiff::{SignedDuration, Timestamp};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use courier_optimizer::{
    environment::{feed::EnvironmentalFeed, snapshot::DirectedEdge},
    problem::location::GeoPoint,
};

pub const DEFAULT_RECENCY_WINDOW: SignedDuration = SignedDuration::from_mins(15);

/// One observed traffic factor for a directed segment.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TrafficReading {
    pub from: GeoPoint,
    pub to: GeoPoint,
    pub factor: f64,
    pub recorded_at: Timestamp,
}

/// One observed weather factor for a position.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct WeatherReading {
    pub location: GeoPoint,
    pub factor: f64,
    pub recorded_at: Timestamp,
}

/// Feed over recorded readings, serving only those inside a recency window
/// so stale observations age out of the snapshot. The newest reading per
/// key wins.
pub struct RecordedFeed {
    traffic: Mutex<Vec<TrafficReading>>,
    weather: Mutex<Vec<WeatherReading>>,
    closures: Mutex<FxHashSet<DirectedEdge>>,
    recency_window: SignedDuration,
}

impl Default for RecordedFeed {
    fn default() -> Self {
        RecordedFeed::new(DEFAULT_RECENCY_WINDOW)
    }
}

impl RecordedFeed {
    pub fn new(recency_window: SignedDuration) -> Self {
        RecordedFeed {
            traffic: Mutex::new(Vec::new()),
            weather: Mutex::new(Vec::new()),
            closures: Mutex::new(FxHashSet::default()),
            recency_window,
        }
    }

    pub fn record_traffic(&self, reading: TrafficReading) {
        self.traffic.lock().push(reading);
    }

    pub fn record_weather(&self, reading: WeatherReading) {
        self.weather.lock().push(reading);
    }

    pub fn set_closures(&self, closures: FxHashSet<DirectedEdge>) {
        *self.closures.lock() = closures;
    }

    fn cutoff(&self) -> Timestamp {
        Timestamp::now() - self.recency_window
    }
}

impl EnvironmentalFeed for RecordedFeed {
    fn fetch_traffic(&self) -> Result<FxHashMap<DirectedEdge, f64>, anyhow::Error> {
        let cutoff = self.cutoff();
        let mut newest: FxHashMap<DirectedEdge, (Timestamp, f64)> = FxHashMap::default();
        for reading in self.traffic.lock().iter() {
            if reading.recorded_at < cutoff {
                continue;
            }
            let edge = DirectedEdge::new(reading.from, reading.to);
            let entry = newest.entry(edge).or_insert((reading.recorded_at, reading.factor));
            if reading.recorded_at >= entry.0 {
                *entry = (reading.recorded_at, reading.factor);
            }
        }
        Ok(newest
            .into_iter()
            .map(|(edge, (_, factor))| (edge, factor))
            .collect())
    }

    fn fetch_weather(&self) -> Result<FxHashMap<GeoPoint, f64>, anyhow::Error> {
        let cutoff = self.cutoff();
        let mut newest: FxHashMap<GeoPoint, (Timestamp, f64)> = FxHashMap::default();
        for reading in self.weather.lock().iter() {
            if reading.recorded_at < cutoff {
                continue;
            }
            let entry = newest
                .entry(reading.location)
                .or_insert((reading.recorded_at, reading.factor));
            if reading.recorded_at >= entry.0 {
                *entry = (reading.recorded_at, reading.factor);
            }
        }
        Ok(newest
            .into_iter()
            .map(|(location, (_, factor))| (location, factor))
            .collect())
    }

    fn fetch_closures(&self) -> Result<FxHashSet<DirectedEdge>, anyhow::Error> {
        Ok(self.closures.lock().clone())
    }
}
