use std::sync::Arc;

use fxhash::FxHashMap;
use rand::rngs::SmallRng;
use tracing::info;

use crate::{
    environment::{monitor::RealTimeMonitor, snapshot::EnvironmentalSnapshot},
    error::EngineError,
    problem::{
        delivery_request::DeliveryRequest,
        dispatch_problem::{DispatchProblem, DispatchProblemBuilder},
        vehicle::Vehicle,
    },
    solver::{
        annealing::{AnnealingParams, AnnealingSearch},
        cost::CostEvaluator,
        solution::SolutionState,
    },
};

/// Vehicle id to its ordered deliveries: the engine's output and the
/// repository's commit input. Vehicles left without work map to empty lists.
pub type Assignments = FxHashMap<String, Vec<DeliveryRequest>>;

#[derive(Debug, Clone)]
pub struct OptimizeOutcome {
    pub assignments: Assignments,
    pub cost: f64,
}

/// Runs one full search over the given requests and vehicles under the given
/// snapshot. Pure with respect to its inputs aside from draws on `rng`.
pub fn optimize(
    requests: Vec<DeliveryRequest>,
    vehicles: Vec<Vehicle>,
    snapshot: Arc<EnvironmentalSnapshot>,
    params: AnnealingParams,
    rng: &mut SmallRng,
) -> Result<OptimizeOutcome, EngineError> {
    let problem = build_problem(requests, vehicles)?;
    run_search(&problem, snapshot, None, params, rng)
}

/// Like [`optimize`], but starts from the snapshot `monitor` has published
/// and polls it on the controller's cadence, so a material mid-run change
/// replaces the snapshot for the remainder of the run.
pub fn optimize_with_monitor(
    requests: Vec<DeliveryRequest>,
    vehicles: Vec<Vehicle>,
    monitor: &mut RealTimeMonitor,
    params: AnnealingParams,
    rng: &mut SmallRng,
) -> Result<OptimizeOutcome, EngineError> {
    let problem = build_problem(requests, vehicles)?;
    let snapshot = monitor.store().latest();
    run_search(&problem, snapshot, Some(monitor), params, rng)
}

fn build_problem(
    requests: Vec<DeliveryRequest>,
    vehicles: Vec<Vehicle>,
) -> Result<DispatchProblem, EngineError> {
    let mut builder = DispatchProblemBuilder::default();
    builder.set_requests(requests).set_vehicles(vehicles);
    Ok(builder.build()?)
}

fn run_search(
    problem: &DispatchProblem,
    snapshot: Arc<EnvironmentalSnapshot>,
    monitor: Option<&mut RealTimeMonitor>,
    params: AnnealingParams,
    rng: &mut SmallRng,
) -> Result<OptimizeOutcome, EngineError> {
    let search = AnnealingSearch::new(params, CostEvaluator::default())?;
    let outcome = search.run(problem, snapshot, monitor, rng)?;

    info!(
        requests = problem.requests().len(),
        vehicles = problem.vehicles().len(),
        cost = outcome.cost,
        "optimization finished"
    );

    Ok(OptimizeOutcome {
        assignments: to_assignments(&outcome.solution, problem),
        cost: outcome.cost,
    })
}

/// Converts an index-based solution back to external ids, including
/// vehicles with empty routes.
pub fn to_assignments(solution: &SolutionState, problem: &DispatchProblem) -> Assignments {
    problem
        .vehicle_indices()
        .map(|vehicle_idx| {
            let deliveries = solution
                .route(vehicle_idx)
                .iter()
                .map(|request_idx| problem.request(*request_idx).clone())
                .collect();
            (problem.vehicles()[vehicle_idx].id().to_owned(), deliveries)
        })
        .collect()
}
