use rand::Rng;

use crate::{problem::delivery_request::RequestIdx, solver::solution::SolutionState};

pub const DEFAULT_MIN_RATIO: f64 = 0.1;
pub const DEFAULT_MAX_RATIO: f64 = 0.3;

/// Removes a uniformly sampled subset of the assigned requests, leaving the
/// order of the remainder intact. The subset size is drawn per call from a
/// ratio range of the assigned count, always at least one.
#[derive(Debug, Clone, Copy)]
pub struct RandomDestroy {
    min_ratio: f64,
    max_ratio: f64,
}

impl Default for RandomDestroy {
    fn default() -> Self {
        RandomDestroy {
            min_ratio: DEFAULT_MIN_RATIO,
            max_ratio: DEFAULT_MAX_RATIO,
        }
    }
}

impl RandomDestroy {
    pub fn new(min_ratio: f64, max_ratio: f64) -> Self {
        RandomDestroy {
            min_ratio,
            max_ratio,
        }
    }

    pub fn destroy<R: Rng>(&self, solution: &mut SolutionState, rng: &mut R) -> Vec<RequestIdx> {
        let assigned_count = solution.assigned_count();
        if assigned_count == 0 {
            return Vec::new();
        }

        let min = ((assigned_count as f64 * self.min_ratio).ceil() as usize).max(1);
        let max = ((assigned_count as f64 * self.max_ratio).floor() as usize)
            .clamp(min, assigned_count);
        let count = rng.random_range(min..=max);

        // Sorted candidate order keeps the draw reproducible for a fixed
        // seed, independent of map iteration order.
        let candidates = solution.assigned_fingerprint();
        let removed: Vec<RequestIdx> = rand::seq::index::sample(rng, candidates.len(), count)
            .into_iter()
            .map(|sampled| candidates[sampled])
            .collect();

        solution.remove_requests(&removed);
        removed
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use super::*;
    use crate::problem::vehicle::VehicleIdx;
    use crate::solver::solution::SolutionState;
    use crate::test_utils::{basic_problem, basic_request, basic_vehicle};

    fn ten_request_state() -> (crate::problem::dispatch_problem::DispatchProblem, SolutionState)
    {
        let problem = basic_problem(
            (0..10).map(|n| basic_request(&format!("r{n}"))).collect(),
            vec![basic_vehicle("v1", 1000.0), basic_vehicle("v2", 1000.0)],
        );
        let mut state = SolutionState::empty(&problem);
        for (position, request_idx) in problem.request_indices().enumerate() {
            let vehicle = VehicleIdx::new(position % 2);
            state.insert(vehicle, position / 2, request_idx);
        }
        (problem, state)
    }

    #[test]
    fn removes_between_ratios_and_returns_removed() {
        let (_, mut state) = ten_request_state();
        let mut rng = SmallRng::seed_from_u64(7);

        let removed = RandomDestroy::default().destroy(&mut state, &mut rng);

        assert!((1..=3).contains(&removed.len()), "removed {}", removed.len());
        assert_eq!(state.assigned_count(), 10 - removed.len());
        for request_idx in &removed {
            assert!(!state.assigned_requests().any(|assigned| assigned == *request_idx));
        }
    }

    #[test]
    fn removes_at_least_one_from_tiny_solutions() {
        let problem = basic_problem(
            vec![basic_request("r1")],
            vec![basic_vehicle("v1", 1000.0)],
        );
        let mut state = SolutionState::empty(&problem);
        state.insert(VehicleIdx::new(0), 0, RequestIdx::new(0));
        let mut rng = SmallRng::seed_from_u64(7);

        let removed = RandomDestroy::default().destroy(&mut state, &mut rng);
        assert_eq!(removed.len(), 1);
        assert_eq!(state.assigned_count(), 0);
    }

    #[test]
    fn noop_on_empty_solution() {
        let (_, mut state) = ten_request_state();
        state.remove_requests(&state.assigned_fingerprint());
        let mut rng = SmallRng::seed_from_u64(7);

        assert!(RandomDestroy::default().destroy(&mut state, &mut rng).is_empty());
    }

    #[test]
    fn reproducible_under_a_fixed_seed() {
        let (_, mut first_state) = ten_request_state();
        let (_, mut second_state) = ten_request_state();

        let first = RandomDestroy::default()
            .destroy(&mut first_state, &mut SmallRng::seed_from_u64(99));
        let second = RandomDestroy::default()
            .destroy(&mut second_state, &mut SmallRng::seed_from_u64(99));

        assert_eq!(first, second);
    }
}
