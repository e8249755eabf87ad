use std::sync::Arc;

use rand::{Rng, rngs::SmallRng};
use tracing::debug;

use crate::{
    environment::{monitor::RealTimeMonitor, snapshot::EnvironmentalSnapshot},
    error::EngineError,
    problem::dispatch_problem::DispatchProblem,
    solver::{
        cost::CostEvaluator,
        destroy::{DEFAULT_MAX_RATIO, DEFAULT_MIN_RATIO, RandomDestroy},
        repair::CheapestInsertionRepair,
        solution::SolutionState,
    },
};

#[derive(Debug, Clone)]
pub struct AnnealingParams {
    pub iterations: usize,
    pub initial_temperature: f64,
    pub cooling_rate: f64,
    /// Lower bound keeping `exp(-delta / temperature)` numerically defined
    /// as the temperature decays geometrically toward zero.
    pub temperature_floor: f64,
    /// The monitor is polled every this many iterations.
    pub monitor_interval: usize,
    pub destroy_min_ratio: f64,
    pub destroy_max_ratio: f64,
}

impl Default for AnnealingParams {
    fn default() -> Self {
        AnnealingParams {
            iterations: 1000,
            initial_temperature: 100.0,
            cooling_rate: 0.95,
            temperature_floor: 1e-6,
            monitor_interval: 10,
            destroy_min_ratio: DEFAULT_MIN_RATIO,
            destroy_max_ratio: DEFAULT_MAX_RATIO,
        }
    }
}

impl AnnealingParams {
    fn validate(&self) -> Result<(), EngineError> {
        if self.iterations == 0 {
            return Err(EngineError::InvalidParams("iterations must be positive".into()));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(EngineError::InvalidParams(format!(
                "cooling rate {} outside (0, 1)",
                self.cooling_rate
            )));
        }
        if !(self.initial_temperature > 0.0) {
            return Err(EngineError::InvalidParams(format!(
                "initial temperature {} must be positive",
                self.initial_temperature
            )));
        }
        if !(self.temperature_floor > 0.0) {
            return Err(EngineError::InvalidParams(format!(
                "temperature floor {} must be positive",
                self.temperature_floor
            )));
        }
        if self.monitor_interval == 0 {
            return Err(EngineError::InvalidParams(
                "monitor interval must be positive".into(),
            ));
        }
        if !(0.0 < self.destroy_min_ratio
            && self.destroy_min_ratio <= self.destroy_max_ratio
            && self.destroy_max_ratio <= 1.0)
        {
            return Err(EngineError::InvalidParams(format!(
                "destroy ratios ({}, {}) must satisfy 0 < min <= max <= 1",
                self.destroy_min_ratio, self.destroy_max_ratio
            )));
        }
        Ok(())
    }
}

/// The best solution a search run observed, with its cost under the snapshot
/// that was current when the run finished.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub solution: SolutionState,
    pub cost: f64,
}

/// Metropolis criterion: improvements are always taken, regressions with
/// probability `exp(-delta / temperature)`.
pub fn metropolis_accepts<R: Rng>(delta: f64, temperature: f64, rng: &mut R) -> bool {
    delta < 0.0 || rng.random::<f64>() < (-delta / temperature).exp()
}

/// Destroy/repair/accept loop over a fixed iteration budget.
///
/// The budget is the only termination condition, bounding worst-case run
/// time. Each run owns its solution state and RNG exclusively; only the
/// snapshot is shared, and only through whole-`Arc` replacement.
pub struct AnnealingSearch {
    params: AnnealingParams,
    evaluator: CostEvaluator,
    destroy: RandomDestroy,
    repair: CheapestInsertionRepair,
}

impl AnnealingSearch {
    pub fn new(params: AnnealingParams, evaluator: CostEvaluator) -> Result<Self, EngineError> {
        params.validate()?;
        let destroy = RandomDestroy::new(params.destroy_min_ratio, params.destroy_max_ratio);
        Ok(AnnealingSearch {
            params,
            evaluator,
            destroy,
            repair: CheapestInsertionRepair,
        })
    }

    pub fn run(
        &self,
        problem: &DispatchProblem,
        initial_snapshot: Arc<EnvironmentalSnapshot>,
        mut monitor: Option<&mut RealTimeMonitor>,
        rng: &mut SmallRng,
    ) -> Result<SearchOutcome, EngineError> {
        if problem.vehicles().is_empty() && !problem.requests().is_empty() {
            return Err(EngineError::EmptyFleet);
        }

        let mut snapshot = initial_snapshot;

        // Construction: the repair operator placing every request into the
        // empty state doubles as the initial-solution heuristic.
        let mut current = SolutionState::empty(problem);
        self.repair.repair(
            &mut current,
            problem.request_indices().collect(),
            &self.evaluator,
            problem,
            &snapshot,
        )?;
        let mut current_cost = self.evaluator.evaluate(&current, problem, &snapshot)?;

        let mut best = current.clone();
        let mut best_cost = current_cost;
        debug!(cost = best_cost, "constructed initial solution");

        let mut temperature = self.params.initial_temperature;

        for iteration in 1..=self.params.iterations {
            let mut candidate = current.clone();
            let removed = self.destroy.destroy(&mut candidate, rng);
            self.repair
                .repair(&mut candidate, removed, &self.evaluator, problem, &snapshot)?;
            debug_assert_eq!(
                candidate.assigned_fingerprint(),
                current.assigned_fingerprint(),
                "destroy/repair lost or duplicated a request"
            );

            let candidate_cost = self.evaluator.evaluate(&candidate, problem, &snapshot)?;
            let delta = candidate_cost - current_cost;

            if metropolis_accepts(delta, temperature, rng) {
                current = candidate;
                current_cost = candidate_cost;

                if current_cost < best_cost {
                    best = current.clone();
                    best_cost = current_cost;
                    debug!(iteration, cost = best_cost, "new best solution");
                }
            }

            if iteration.is_multiple_of(self.params.monitor_interval)
                && let Some(monitor) = monitor.as_deref_mut()
                && monitor.poll()
            {
                // Conditions changed materially: all further evaluations in
                // this run read the replacement snapshot, and the costs
                // steering acceptance are re-anchored to it.
                snapshot = monitor.store().latest();
                current_cost = self.evaluator.evaluate(&current, problem, &snapshot)?;
                best_cost = self.evaluator.evaluate(&best, problem, &snapshot)?;
                debug!(iteration, "snapshot replaced mid-run");
            }

            temperature = (temperature * self.params.cooling_rate).max(self.params.temperature_floor);
        }

        debug!(cost = best_cost, "search budget exhausted");
        Ok(SearchOutcome {
            solution: best,
            cost: best_cost,
        })
    }
}
