use fxhash::{FxHashMap, FxHashSet};
use parking_lot::RwLock;

use crate::{
    environment::snapshot::{DirectedEdge, EnvironmentalSnapshot},
    problem::location::GeoPoint,
};

/// Source of live traffic, weather, and closure data. Implementations may
/// block (network, database); the monitor keeps fetches off the search loop.
pub trait EnvironmentalFeed: Send + Sync {
    fn fetch_traffic(&self) -> Result<FxHashMap<DirectedEdge, f64>, anyhow::Error>;

    fn fetch_weather(&self) -> Result<FxHashMap<GeoPoint, f64>, anyhow::Error>;

    fn fetch_closures(&self) -> Result<FxHashSet<DirectedEdge>, anyhow::Error>;

    /// One self-consistent bundle of all three feeds.
    fn fetch_snapshot(&self) -> Result<EnvironmentalSnapshot, anyhow::Error> {
        Ok(EnvironmentalSnapshot::new(
            self.fetch_traffic()?,
            self.fetch_weather()?,
            self.fetch_closures()?,
        ))
    }
}

/// A feed that serves whatever snapshot it was last given. Used in tests and
/// as a stand-in where no live data source is wired up.
#[derive(Default)]
pub struct StaticFeed {
    snapshot: RwLock<EnvironmentalSnapshot>,
}

impl StaticFeed {
    pub fn new(snapshot: EnvironmentalSnapshot) -> Self {
        StaticFeed {
            snapshot: RwLock::new(snapshot),
        }
    }

    pub fn set(&self, snapshot: EnvironmentalSnapshot) {
        *self.snapshot.write() = snapshot;
    }
}

impl EnvironmentalFeed for StaticFeed {
    fn fetch_traffic(&self) -> Result<FxHashMap<DirectedEdge, f64>, anyhow::Error> {
        Ok(self.snapshot.read().traffic().clone())
    }

    fn fetch_weather(&self) -> Result<FxHashMap<GeoPoint, f64>, anyhow::Error> {
        Ok(self.snapshot.read().weather().clone())
    }

    fn fetch_closures(&self) -> Result<FxHashSet<DirectedEdge>, anyhow::Error> {
        Ok(self.snapshot.read().closures().clone())
    }

    fn fetch_snapshot(&self) -> Result<EnvironmentalSnapshot, anyhow::Error> {
        Ok(self.snapshot.read().clone())
    }
}
