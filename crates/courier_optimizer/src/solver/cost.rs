use thiserror::Error;

use crate::{
    environment::snapshot::EnvironmentalSnapshot,
    problem::{
        delivery_request::RequestIdx, dispatch_problem::DispatchProblem, vehicle::VehicleIdx,
    },
    solver::solution::SolutionState,
    travel::{TravelOutcome, TravelTimeModel},
};

pub const LATE_DELIVERY_PENALTY: f64 = 1000.0;
pub const OVERLOAD_PENALTY: f64 = 500.0;
pub const UNREACHABLE_PENALTY: f64 = 10_000.0;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationError {
    /// A route keyed by a vehicle outside the problem's vehicle table is a
    /// data-integrity fault, not a route to skip.
    #[error("route references vehicle index {0} outside the vehicle table")]
    UnknownVehicle(VehicleIdx),
}

/// Cost of a single route walk, with the number of blocked segments it
/// crossed so insertion heuristics can keep blocked candidates apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteCost {
    pub cost: f64,
    pub blocked_segments: usize,
}

/// Scores a solution against time windows, capacity, and priority-weighted
/// travel. Deterministic for fixed inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostEvaluator {
    model: TravelTimeModel,
}

impl CostEvaluator {
    pub fn new(model: TravelTimeModel) -> Self {
        CostEvaluator { model }
    }

    pub fn model(&self) -> &TravelTimeModel {
        &self.model
    }

    pub fn evaluate(
        &self,
        solution: &SolutionState,
        problem: &DispatchProblem,
        snapshot: &EnvironmentalSnapshot,
    ) -> Result<f64, EvaluationError> {
        let mut total = 0.0;
        // Fixed summation order keeps the result identical across clones of
        // the same state.
        for vehicle_idx in solution.vehicle_indices_sorted() {
            total += self
                .route_cost(vehicle_idx, solution.route(vehicle_idx), problem, snapshot)?
                .cost;
        }
        Ok(total)
    }

    /// Walks one route from the vehicle's starting location and availability
    /// time, accumulating weighted travel plus penalties.
    pub fn route_cost(
        &self,
        vehicle_idx: VehicleIdx,
        route: &[RequestIdx],
        problem: &DispatchProblem,
        snapshot: &EnvironmentalSnapshot,
    ) -> Result<RouteCost, EvaluationError> {
        let vehicle = problem
            .vehicle(vehicle_idx)
            .ok_or(EvaluationError::UnknownVehicle(vehicle_idx))?;

        let mut cost = 0.0;
        let mut blocked_segments = 0;
        let mut current_location = vehicle.location();
        let mut current_time = vehicle.available_from();
        let mut load = 0.0;

        for &request_idx in route {
            let request = problem.request(request_idx);

            let travel_minutes =
                match self
                    .model
                    .travel_time(current_location, request.location(), snapshot)
                {
                    TravelOutcome::Open(duration) => {
                        current_time = current_time + duration;
                        duration.as_secs_f64() / 60.0
                    }
                    TravelOutcome::Blocked => {
                        // A fixed penalty keeps the total finite and
                        // comparable; the clock does not advance across a
                        // segment with no usable duration.
                        cost += UNREACHABLE_PENALTY;
                        blocked_segments += 1;
                        0.0
                    }
                };

            let window = request.time_window();
            if current_time < window.start() {
                // Early arrival waits, without penalty.
                current_time = window.start();
            } else if !window.is_satisfied(current_time) {
                // Flat penalty per missed window, not per unit of lateness.
                cost += LATE_DELIVERY_PENALTY;
            }

            load += request.load_size();
            if load > vehicle.capacity() {
                cost += OVERLOAD_PENALTY;
            }

            cost += travel_minutes * request.priority().travel_weight();
            current_location = request.location();
        }

        Ok(RouteCost {
            cost,
            blocked_segments,
        })
    }
}
