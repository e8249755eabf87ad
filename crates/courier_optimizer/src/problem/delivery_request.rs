use serde::{Deserialize, Serialize};

use crate::{
    define_index_newtype,
    problem::{location::GeoPoint, time_window::TimeWindow},
};

define_index_newtype!(RequestIdx, DeliveryRequest);

/// Urgency of a request, from 1 (most urgent) to 5 (least urgent).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MOST_URGENT: Priority = Priority(1);
    pub const LEAST_URGENT: Priority = Priority(5);

    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(Priority(value))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Weight applied to the travel component of the cost: priority 1 is
    /// weighted x1.8, priority 5 x1.0, so urgent requests pull the search
    /// toward short routes for them.
    pub fn travel_weight(&self) -> f64 {
        1.0 + (5 - self.0) as f64 * 0.2
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Priority::new(value).ok_or_else(|| format!("priority {value} outside 1..=5"))
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

/// An immutable delivery order. Created by the upstream service; the engine
/// never mutates one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeliveryRequest {
    id: String,
    location: GeoPoint,
    time_window: TimeWindow,
    load_size: f64,
    priority: Priority,
}

impl DeliveryRequest {
    pub fn new(
        id: impl Into<String>,
        location: GeoPoint,
        time_window: TimeWindow,
        load_size: f64,
        priority: Priority,
    ) -> Self {
        DeliveryRequest {
            id: id.into(),
            location,
            time_window,
            load_size,
            priority,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn time_window(&self) -> TimeWindow {
        self.time_window
    }

    pub fn load_size(&self) -> f64 {
        self.load_size
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_bounds() {
        assert!(Priority::new(0).is_none());
        assert!(Priority::new(6).is_none());
        assert_eq!(Priority::new(1), Some(Priority::MOST_URGENT));
        assert_eq!(Priority::new(5), Some(Priority::LEAST_URGENT));
    }

    #[test]
    fn travel_weight_scales_with_urgency() {
        assert_eq!(Priority::MOST_URGENT.travel_weight(), 1.8);
        assert_eq!(Priority::new(3).unwrap().travel_weight(), 1.4);
        assert_eq!(Priority::LEAST_URGENT.travel_weight(), 1.0);
    }

    #[test]
    fn priority_rejects_out_of_range_on_deserialize() {
        assert!(serde_json::from_str::<Priority>("3").is_ok());
        assert!(serde_json::from_str::<Priority>("0").is_err());
        assert!(serde_json::from_str::<Priority>("9").is_err());
    }
}
