use fxhash::{FxHashMap, FxHashSet};

use crate::problem::{
    delivery_request::RequestIdx, dispatch_problem::DispatchProblem, vehicle::VehicleIdx,
};

/// Per-vehicle ordered route assignment, the object the search mutates.
///
/// Invariant: every assigned request appears in exactly one route at exactly
/// one position. Destroy/repair cycles must preserve the assigned multiset.
/// A state is owned by a single search run and cloned, never shared.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionState {
    routes: FxHashMap<VehicleIdx, Vec<RequestIdx>>,
}

impl SolutionState {
    /// Every vehicle mapped to an empty route.
    pub fn empty(problem: &DispatchProblem) -> Self {
        SolutionState {
            routes: problem
                .vehicle_indices()
                .map(|vehicle_idx| (vehicle_idx, Vec::new()))
                .collect(),
        }
    }

    pub fn routes(&self) -> &FxHashMap<VehicleIdx, Vec<RequestIdx>> {
        &self.routes
    }

    pub fn route(&self, vehicle_idx: VehicleIdx) -> &[RequestIdx] {
        self.routes
            .get(&vehicle_idx)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Vehicle indices in ascending order, for deterministic walks.
    pub fn vehicle_indices_sorted(&self) -> Vec<VehicleIdx> {
        let mut indices: Vec<_> = self.routes.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    pub fn assigned_count(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn assigned_requests(&self) -> impl Iterator<Item = RequestIdx> + '_ {
        self.routes.values().flatten().copied()
    }

    /// Sorted assigned request indices; equal fingerprints mean equal
    /// assigned multisets.
    pub fn assigned_fingerprint(&self) -> Vec<RequestIdx> {
        let mut assigned: Vec<_> = self.assigned_requests().collect();
        assigned.sort_unstable();
        assigned
    }

    pub fn insert(&mut self, vehicle_idx: VehicleIdx, position: usize, request_idx: RequestIdx) {
        self.routes
            .entry(vehicle_idx)
            .or_default()
            .insert(position, request_idx);
    }

    /// Removes the given requests from whichever routes hold them, keeping
    /// the order of the remainder.
    pub fn remove_requests(&mut self, removed: &[RequestIdx]) {
        let removed: FxHashSet<RequestIdx> = removed.iter().copied().collect();
        for route in self.routes.values_mut() {
            route.retain(|request_idx| !removed.contains(request_idx));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{basic_problem, basic_request, basic_vehicle};

    #[test]
    fn empty_state_maps_every_vehicle() {
        let problem = basic_problem(
            vec![basic_request("r1")],
            vec![basic_vehicle("v1", 100.0), basic_vehicle("v2", 100.0)],
        );
        let state = SolutionState::empty(&problem);

        assert_eq!(state.routes().len(), 2);
        assert_eq!(state.assigned_count(), 0);
    }

    #[test]
    fn remove_preserves_remainder_order() {
        let problem = basic_problem(
            vec![
                basic_request("r1"),
                basic_request("r2"),
                basic_request("r3"),
            ],
            vec![basic_vehicle("v1", 100.0)],
        );
        let mut state = SolutionState::empty(&problem);
        let v1 = VehicleIdx::new(0);
        state.insert(v1, 0, RequestIdx::new(0));
        state.insert(v1, 1, RequestIdx::new(1));
        state.insert(v1, 2, RequestIdx::new(2));

        state.remove_requests(&[RequestIdx::new(1)]);

        assert_eq!(state.route(v1), &[RequestIdx::new(0), RequestIdx::new(2)]);
    }

    #[test]
    fn fingerprint_is_order_insensitive() {
        let problem = basic_problem(
            vec![basic_request("r1"), basic_request("r2")],
            vec![basic_vehicle("v1", 100.0), basic_vehicle("v2", 100.0)],
        );
        let mut a = SolutionState::empty(&problem);
        a.insert(VehicleIdx::new(0), 0, RequestIdx::new(0));
        a.insert(VehicleIdx::new(1), 0, RequestIdx::new(1));

        let mut b = SolutionState::empty(&problem);
        b.insert(VehicleIdx::new(1), 0, RequestIdx::new(0));
        b.insert(VehicleIdx::new(0), 0, RequestIdx::new(1));

        assert_eq!(a.assigned_fingerprint(), b.assigned_fingerprint());
    }
}
