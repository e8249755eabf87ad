use fxhash::FxHashMap;
use rand::{SeedableRng, rngs::SmallRng};
use tracing::{debug, info};

use courier_optimizer::{
    engine::{Assignments, optimize_with_monitor},
    environment::monitor::RealTimeMonitor,
    problem::{delivery_request::DeliveryRequest, vehicle::Vehicle},
    solver::annealing::AnnealingParams,
};

use crate::repository::DeliveryRepository;

/// Pulls pending work from storage, runs the engine against the currently
/// published snapshot, and writes assignments back.
pub struct DispatchService<R> {
    repository: R,
    monitor: RealTimeMonitor,
    params: AnnealingParams,
    rng: SmallRng,
}

impl<R: DeliveryRepository> DispatchService<R> {
    pub fn new(repository: R, monitor: RealTimeMonitor, params: AnnealingParams, seed: u64) -> Self {
        DispatchService {
            repository,
            monitor,
            params,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn monitor(&mut self) -> &mut RealTimeMonitor {
        &mut self.monitor
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// One full fetch, optimize, commit cycle over the pending requests.
    pub fn run_optimization(&mut self) -> Result<Assignments, anyhow::Error> {
        let requests = self.repository.fetch_pending_requests()?;
        let vehicles = self.repository.fetch_available_vehicles()?;
        self.plan_and_commit(requests, vehicles)
    }

    /// Re-runs the full search when conditions changed materially since the
    /// published snapshot; otherwise hands the current routes back
    /// untouched. The re-run covers the requests already routed plus any
    /// that turned pending in the meantime.
    pub fn reoptimize_if_needed(
        &mut self,
        current: Assignments,
    ) -> Result<Assignments, anyhow::Error> {
        if !self.monitor.check_now()? {
            debug!("conditions unchanged, keeping current routes");
            return Ok(current);
        }

        info!("material condition change, re-optimizing");
        let mut requests: FxHashMap<String, DeliveryRequest> = current
            .values()
            .flatten()
            .map(|request| (request.id().to_owned(), request.clone()))
            .collect();
        for request in self.repository.fetch_pending_requests()? {
            requests.entry(request.id().to_owned()).or_insert(request);
        }
        let mut requests: Vec<DeliveryRequest> = requests.into_values().collect();
        requests.sort_unstable_by(|a, b| a.id().cmp(b.id()));

        let vehicles = self.repository.fetch_available_vehicles()?;
        self.plan_and_commit(requests, vehicles)
    }

    fn plan_and_commit(
        &mut self,
        requests: Vec<DeliveryRequest>,
        vehicles: Vec<Vehicle>,
    ) -> Result<Assignments, anyhow::Error> {
        if requests.is_empty() {
            info!("nothing to assign");
            return Ok(Assignments::default());
        }

        let outcome = optimize_with_monitor(
            requests,
            vehicles,
            &mut self.monitor,
            self.params.clone(),
            &mut self.rng,
        )?;
        self.repository.commit_assignments(&outcome.assignments)?;

        info!(cost = outcome.cost, "assignments committed");
        Ok(outcome.assignments)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fxhash::FxHashSet;

    use courier_optimizer::environment::feed::StaticFeed;
    use courier_optimizer::environment::monitor::{DEFAULT_CHANGE_THRESHOLD, SnapshotStore};
    use courier_optimizer::environment::snapshot::{DirectedEdge, EnvironmentalSnapshot};
    use courier_optimizer::problem::delivery_request::Priority;
    use courier_optimizer::problem::location::GeoPoint;
    use courier_optimizer::problem::time_window::TimeWindow;
    use courier_optimizer::problem::vehicle::Vehicle;

    use super::*;
    use crate::repository::{DeliveryStatus, InMemoryRepository};

    fn day_window() -> TimeWindow {
        TimeWindow::new(
            "2025-06-10T00:00:00Z".parse().unwrap(),
            "2025-06-10T23:59:59Z".parse().unwrap(),
        )
    }

    fn seeded_repository() -> InMemoryRepository {
        let repository = InMemoryRepository::default();
        repository.add_request(DeliveryRequest::new(
            "r1",
            GeoPoint::new(48.8500, 2.3500),
            day_window(),
            30.0,
            Priority::LEAST_URGENT,
        ));
        repository.add_request(DeliveryRequest::new(
            "r2",
            GeoPoint::new(48.8520, 2.3510),
            day_window(),
            40.0,
            Priority::MOST_URGENT,
        ));
        repository.add_vehicle(Vehicle::new(
            "v1",
            100.0,
            GeoPoint::new(48.8500, 2.3500),
            "2025-06-10T08:00:00Z".parse().unwrap(),
        ));
        repository
    }

    fn service_over(
        repository: InMemoryRepository,
        feed: Arc<StaticFeed>,
    ) -> DispatchService<InMemoryRepository> {
        let store = SnapshotStore::new(EnvironmentalSnapshot::default());
        let monitor = RealTimeMonitor::new(feed, store, DEFAULT_CHANGE_THRESHOLD);
        let params = AnnealingParams {
            iterations: 50,
            ..AnnealingParams::default()
        };
        DispatchService::new(repository, monitor, params, 2427121)
    }

    #[test]
    fn run_optimization_commits_assignments() {
        let feed = Arc::new(StaticFeed::default());
        let mut service = service_over(seeded_repository(), feed);

        let assignments = service.run_optimization().unwrap();

        let assigned: usize = assignments.values().map(Vec::len).sum();
        assert_eq!(assigned, 2);
        assert_eq!(
            service.repository.request_state("r1"),
            Some((DeliveryStatus::Assigned, Some("v1".to_owned())))
        );
        assert_eq!(
            service.repository.request_state("r2"),
            Some((DeliveryStatus::Assigned, Some("v1".to_owned())))
        );

        // Nothing pending afterwards.
        assert!(service.repository.fetch_pending_requests().unwrap().is_empty());
    }

    #[test]
    fn reoptimize_returns_current_routes_when_nothing_changed() {
        let feed = Arc::new(StaticFeed::default());
        let mut service = service_over(seeded_repository(), feed);

        let committed = service.run_optimization().unwrap();
        let unchanged = service.reoptimize_if_needed(committed.clone()).unwrap();

        assert_eq!(unchanged, committed);
    }

    #[test]
    fn reoptimize_reruns_after_a_material_change() {
        let feed = Arc::new(StaticFeed::default());
        let mut service = service_over(seeded_repository(), Arc::clone(&feed));

        let committed = service.run_optimization().unwrap();

        // A new closure appears in the live feed.
        let mut closures = FxHashSet::default();
        closures.insert(DirectedEdge::new(
            GeoPoint::new(48.8500, 2.3500),
            GeoPoint::new(48.8520, 2.3510),
        ));
        feed.set(EnvironmentalSnapshot::new(
            Default::default(),
            Default::default(),
            closures,
        ));

        let updated = service.reoptimize_if_needed(committed).unwrap();

        // All previously routed requests stay routed after the re-run.
        let assigned: usize = updated.values().map(Vec::len).sum();
        assert_eq!(assigned, 2);
    }

    #[test]
    fn no_pending_work_is_a_noop() {
        let repository = InMemoryRepository::default();
        repository.add_vehicle(Vehicle::new(
            "v1",
            100.0,
            GeoPoint::new(48.85, 2.35),
            "2025-06-10T08:00:00Z".parse().unwrap(),
        ));
        let feed = Arc::new(StaticFeed::default());
        let mut service = service_over(repository, feed);

        assert!(service.run_optimization().unwrap().is_empty());
    }
}
