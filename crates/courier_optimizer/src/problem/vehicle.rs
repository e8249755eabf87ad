use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{define_index_newtype, problem::location::GeoPoint};

define_index_newtype!(VehicleIdx, Vehicle);

/// A delivery vehicle. Immutable for the duration of one optimization run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Vehicle {
    id: String,
    capacity: f64,
    location: GeoPoint,
    available_from: Timestamp,
}

impl Vehicle {
    pub fn new(
        id: impl Into<String>,
        capacity: f64,
        location: GeoPoint,
        available_from: Timestamp,
    ) -> Self {
        Vehicle {
            id: id.into(),
            capacity,
            location,
            available_from,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn available_from(&self) -> Timestamp {
        self.available_from
    }
}
