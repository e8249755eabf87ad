use fxhash::FxHashMap;
use thiserror::Error;

use crate::problem::{
    delivery_request::{DeliveryRequest, RequestIdx},
    vehicle::{Vehicle, VehicleIdx},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("request {id}: latitude {lat} outside [-90, 90] or longitude {lon} outside [-180, 180]")]
    RequestLocationOutOfRange { id: String, lat: f64, lon: f64 },
    #[error("vehicle {id}: latitude {lat} outside [-90, 90] or longitude {lon} outside [-180, 180]")]
    VehicleLocationOutOfRange { id: String, lat: f64, lon: f64 },
    #[error("request {0}: time window ends before it starts")]
    InvertedTimeWindow(String),
    #[error("request {id}: load size {load} must be positive")]
    NonPositiveLoad { id: String, load: f64 },
    #[error("vehicle {id}: capacity {capacity} must be positive")]
    NonPositiveCapacity { id: String, capacity: f64 },
    #[error("duplicate request id {0}")]
    DuplicateRequestId(String),
    #[error("duplicate vehicle id {0}")]
    DuplicateVehicleId(String),
}

/// One optimization run's validated input: requests and vehicles interned
/// behind dense indices so routes can store `RequestIdx` instead of clones.
#[derive(Debug, Clone)]
pub struct DispatchProblem {
    requests: Vec<DeliveryRequest>,
    vehicles: Vec<Vehicle>,
    request_ids: FxHashMap<String, RequestIdx>,
    vehicle_ids: FxHashMap<String, VehicleIdx>,
}

impl DispatchProblem {
    pub fn requests(&self) -> &[DeliveryRequest] {
        &self.requests
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn request(&self, idx: RequestIdx) -> &DeliveryRequest {
        &self.requests[idx]
    }

    pub fn vehicle(&self, idx: VehicleIdx) -> Option<&Vehicle> {
        self.vehicles.get(idx.get())
    }

    pub fn request_idx(&self, id: &str) -> Option<RequestIdx> {
        self.request_ids.get(id).copied()
    }

    pub fn vehicle_idx(&self, id: &str) -> Option<VehicleIdx> {
        self.vehicle_ids.get(id).copied()
    }

    pub fn request_indices(&self) -> impl Iterator<Item = RequestIdx> {
        (0..self.requests.len()).map(RequestIdx::new)
    }

    pub fn vehicle_indices(&self) -> impl Iterator<Item = VehicleIdx> {
        (0..self.vehicles.len()).map(VehicleIdx::new)
    }
}

#[derive(Default)]
pub struct DispatchProblemBuilder {
    requests: Vec<DeliveryRequest>,
    vehicles: Vec<Vehicle>,
}

impl DispatchProblemBuilder {
    pub fn set_requests(&mut self, requests: Vec<DeliveryRequest>) -> &mut Self {
        self.requests = requests;
        self
    }

    pub fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) -> &mut Self {
        self.vehicles = vehicles;
        self
    }

    /// Validates the ingested data. Everything past this point assumes the
    /// checks here have run.
    pub fn build(self) -> Result<DispatchProblem, ProblemError> {
        let mut request_ids = FxHashMap::default();
        for (index, request) in self.requests.iter().enumerate() {
            if !request.location().is_in_range() {
                return Err(ProblemError::RequestLocationOutOfRange {
                    id: request.id().to_owned(),
                    lat: request.location().lat(),
                    lon: request.location().lon(),
                });
            }
            if request.time_window().is_inverted() {
                return Err(ProblemError::InvertedTimeWindow(request.id().to_owned()));
            }
            if request.load_size() <= 0.0 {
                return Err(ProblemError::NonPositiveLoad {
                    id: request.id().to_owned(),
                    load: request.load_size(),
                });
            }
            if request_ids
                .insert(request.id().to_owned(), RequestIdx::new(index))
                .is_some()
            {
                return Err(ProblemError::DuplicateRequestId(request.id().to_owned()));
            }
        }

        let mut vehicle_ids = FxHashMap::default();
        for (index, vehicle) in self.vehicles.iter().enumerate() {
            if !vehicle.location().is_in_range() {
                return Err(ProblemError::VehicleLocationOutOfRange {
                    id: vehicle.id().to_owned(),
                    lat: vehicle.location().lat(),
                    lon: vehicle.location().lon(),
                });
            }
            if vehicle.capacity() <= 0.0 {
                return Err(ProblemError::NonPositiveCapacity {
                    id: vehicle.id().to_owned(),
                    capacity: vehicle.capacity(),
                });
            }
            if vehicle_ids
                .insert(vehicle.id().to_owned(), VehicleIdx::new(index))
                .is_some()
            {
                return Err(ProblemError::DuplicateVehicleId(vehicle.id().to_owned()));
            }
        }

        Ok(DispatchProblem {
            requests: self.requests,
            vehicles: self.vehicles,
            request_ids,
            vehicle_ids,
        })
    }
}
