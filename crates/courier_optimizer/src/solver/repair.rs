use crate::{
    environment::snapshot::EnvironmentalSnapshot,
    problem::{
        delivery_request::RequestIdx, dispatch_problem::DispatchProblem, vehicle::VehicleIdx,
    },
    solver::{
        cost::{CostEvaluator, EvaluationError},
        solution::SolutionState,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InsertionPoint {
    vehicle_idx: VehicleIdx,
    position: usize,
}

/// Reinserts removed requests at their cheapest positions, most urgent
/// request first. Every request is placed; a candidate position that crosses
/// a closed edge only wins when no open alternative exists anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheapestInsertionRepair;

impl CheapestInsertionRepair {
    pub fn repair(
        &self,
        solution: &mut SolutionState,
        mut removed: Vec<RequestIdx>,
        evaluator: &CostEvaluator,
        problem: &DispatchProblem,
        snapshot: &EnvironmentalSnapshot,
    ) -> Result<(), EvaluationError> {
        // Fixed insertion order: urgency first, then request id, so a run is
        // reproducible for a given seed.
        removed.sort_unstable_by(|a, b| {
            let first = problem.request(*a);
            let second = problem.request(*b);
            first
                .priority()
                .cmp(&second.priority())
                .then_with(|| first.id().cmp(second.id()))
        });

        for request_idx in removed {
            let insertion = self.best_insertion(solution, request_idx, evaluator, problem, snapshot)?;
            solution.insert(insertion.vehicle_idx, insertion.position, request_idx);
        }

        Ok(())
    }

    /// Prices every position in every route by marginal route cost. Strict
    /// improvement comparisons keep ties on the lowest vehicle index, then
    /// the earliest position.
    fn best_insertion(
        &self,
        solution: &SolutionState,
        request_idx: RequestIdx,
        evaluator: &CostEvaluator,
        problem: &DispatchProblem,
        snapshot: &EnvironmentalSnapshot,
    ) -> Result<InsertionPoint, EvaluationError> {
        let mut best_open: Option<(f64, InsertionPoint)> = None;
        let mut best_blocked: Option<(f64, InsertionPoint)> = None;

        for vehicle_idx in solution.vehicle_indices_sorted() {
            let route = solution.route(vehicle_idx);
            let base = evaluator.route_cost(vehicle_idx, route, problem, snapshot)?;

            let mut candidate = Vec::with_capacity(route.len() + 1);
            for position in 0..=route.len() {
                candidate.clear();
                candidate.extend_from_slice(&route[..position]);
                candidate.push(request_idx);
                candidate.extend_from_slice(&route[position..]);

                let priced = evaluator.route_cost(vehicle_idx, &candidate, problem, snapshot)?;
                let marginal = priced.cost - base.cost;
                let insertion = InsertionPoint {
                    vehicle_idx,
                    position,
                };

                // An insertion that adds a blocked segment competes only
                // against other blocked candidates.
                let slot = if priced.blocked_segments > base.blocked_segments {
                    &mut best_blocked
                } else {
                    &mut best_open
                };
                if slot.is_none_or(|(best_marginal, _)| marginal < best_marginal) {
                    *slot = Some((marginal, insertion));
                }
            }
        }

        match best_open.or(best_blocked) {
            Some((_, insertion)) => Ok(insertion),
            // Unreachable once the fleet is known non-empty: every route
            // offers at least the append position.
            None => panic!("no insertion position for request {request_idx}"),
        }
    }
}
