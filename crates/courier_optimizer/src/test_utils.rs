use jiff::Timestamp;

use crate::problem::{
    delivery_request::{DeliveryRequest, Priority},
    dispatch_problem::{DispatchProblem, DispatchProblemBuilder},
    location::GeoPoint,
    time_window::TimeWindow,
    vehicle::Vehicle,
};

pub fn ts(iso: &str) -> Timestamp {
    iso.parse().expect("valid ISO timestamp")
}

/// A window spanning the whole working day of the fixtures.
pub fn day_window() -> TimeWindow {
    TimeWindow::new(ts("2025-06-10T00:00:00Z"), ts("2025-06-10T23:59:59Z"))
}

pub fn request_at(id: &str, location: GeoPoint) -> DeliveryRequest {
    DeliveryRequest::new(id, location, day_window(), 10.0, Priority::LEAST_URGENT)
}

pub fn basic_request(id: &str) -> DeliveryRequest {
    request_at(id, GeoPoint::new(48.8566, 2.3522))
}

pub fn basic_vehicle(id: &str, capacity: f64) -> Vehicle {
    Vehicle::new(
        id,
        capacity,
        GeoPoint::new(48.8566, 2.3522),
        ts("2025-06-10T08:00:00Z"),
    )
}

pub fn basic_problem(requests: Vec<DeliveryRequest>, vehicles: Vec<Vehicle>) -> DispatchProblem {
    let mut builder = DispatchProblemBuilder::default();
    builder.set_requests(requests).set_vehicles(vehicles);
    builder.build().expect("valid test problem")
}
