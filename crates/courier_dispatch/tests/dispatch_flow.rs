use std::sync::Arc;

use jiff::Timestamp;

use courier_dispatch::feeds::{RecordedFeed, TrafficReading};
use courier_dispatch::repository::{DeliveryStatus, InMemoryRepository};
use courier_dispatch::service::DispatchService;
use courier_optimizer::environment::feed::EnvironmentalFeed;
use courier_optimizer::environment::monitor::{
    DEFAULT_CHANGE_THRESHOLD, RealTimeMonitor, SnapshotStore,
};
use courier_optimizer::environment::snapshot::DirectedEdge;
use courier_optimizer::problem::delivery_request::{DeliveryRequest, Priority};
use courier_optimizer::problem::location::GeoPoint;
use courier_optimizer::problem::time_window::TimeWindow;
use courier_optimizer::problem::vehicle::Vehicle;
use courier_optimizer::solver::annealing::AnnealingParams;

fn window() -> TimeWindow {
    TimeWindow::new(
        "2025-06-10T00:00:00Z".parse().unwrap(),
        "2025-06-10T23:59:59Z".parse().unwrap(),
    )
}

fn depot() -> GeoPoint {
    GeoPoint::new(48.8500, 2.3500)
}

fn customer(n: u8) -> GeoPoint {
    GeoPoint::new(48.8500 + f64::from(n) * 0.002, 2.3500 + f64::from(n) * 0.001)
}

#[test]
fn full_cycle_over_recorded_conditions() {
    let repository = InMemoryRepository::default();
    for n in 1..=4 {
        repository.add_request(DeliveryRequest::new(
            format!("r{n}"),
            customer(n),
            window(),
            20.0,
            if n == 1 {
                Priority::MOST_URGENT
            } else {
                Priority::LEAST_URGENT
            },
        ));
    }
    repository.add_vehicle(Vehicle::new(
        "v1",
        100.0,
        depot(),
        "2025-06-10T08:00:00Z".parse::<Timestamp>().unwrap(),
    ));

    // Wire-format readings, as a live traffic collaborator would deliver
    // them.
    let feed = RecordedFeed::default();
    let reading: TrafficReading = serde_json::from_value(serde_json::json!({
        "from": [48.8500, 2.3500],
        "to": [48.8540, 2.3520],
        "factor": 1.8,
        "recorded_at": Timestamp::now(),
    }))
    .unwrap();
    feed.record_traffic(reading);

    let initial = feed.fetch_snapshot().unwrap();
    assert_eq!(
        initial.traffic_factor(&DirectedEdge::new(depot(), customer(2))),
        1.8
    );

    let store = SnapshotStore::new(initial);
    let monitor = RealTimeMonitor::new(Arc::new(feed), store, DEFAULT_CHANGE_THRESHOLD);
    let params = AnnealingParams {
        iterations: 100,
        ..AnnealingParams::default()
    };
    let mut service = DispatchService::new(repository, monitor, params, 99);

    let assignments = service.run_optimization().unwrap();

    let route = &assignments["v1"];
    assert_eq!(route.len(), 4);

    // Every request is recorded against the vehicle in storage.
    for n in 1..=4 {
        assert_eq!(
            service.repository().request_state(&format!("r{n}")),
            Some((DeliveryStatus::Assigned, Some("v1".to_owned())))
        );
    }

    // A second pass with unchanged conditions keeps the routes.
    let unchanged = service.reoptimize_if_needed(assignments.clone()).unwrap();
    assert_eq!(unchanged, assignments);
}
