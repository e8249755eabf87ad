use anyhow::bail;
use fxhash::FxHashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use courier_optimizer::{
    engine::Assignments,
    problem::{delivery_request::DeliveryRequest, vehicle::Vehicle},
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    Busy,
}

/// Storage boundary for the dispatch service. The engine itself never sees
/// this; it receives plain collections fetched through here.
pub trait DeliveryRepository: Send + Sync {
    fn fetch_pending_requests(&self) -> Result<Vec<DeliveryRequest>, anyhow::Error>;

    fn fetch_available_vehicles(&self) -> Result<Vec<Vehicle>, anyhow::Error>;

    /// Records each assigned delivery against its vehicle and moves pending
    /// rows to `Assigned`.
    fn commit_assignments(&self, assignments: &Assignments) -> Result<(), anyhow::Error>;
}

#[derive(Debug, Clone)]
struct RequestRow {
    request: DeliveryRequest,
    status: DeliveryStatus,
    vehicle_id: Option<String>,
}

#[derive(Debug, Clone)]
struct VehicleRow {
    vehicle: Vehicle,
    status: VehicleStatus,
}

/// Reference repository over in-process tables, used in tests and
/// single-process deployments.
#[derive(Default)]
pub struct InMemoryRepository {
    requests: Mutex<FxHashMap<String, RequestRow>>,
    vehicles: Mutex<FxHashMap<String, VehicleRow>>,
}

impl InMemoryRepository {
    pub fn add_request(&self, request: DeliveryRequest) {
        self.requests.lock().insert(
            request.id().to_owned(),
            RequestRow {
                request,
                status: DeliveryStatus::Pending,
                vehicle_id: None,
            },
        );
    }

    pub fn add_vehicle(&self, vehicle: Vehicle) {
        self.vehicles.lock().insert(
            vehicle.id().to_owned(),
            VehicleRow {
                vehicle,
                status: VehicleStatus::Available,
            },
        );
    }

    pub fn set_vehicle_status(&self, vehicle_id: &str, status: VehicleStatus) {
        if let Some(row) = self.vehicles.lock().get_mut(vehicle_id) {
            row.status = status;
        }
    }

    pub fn request_state(&self, request_id: &str) -> Option<(DeliveryStatus, Option<String>)> {
        self.requests
            .lock()
            .get(request_id)
            .map(|row| (row.status, row.vehicle_id.clone()))
    }
}

impl DeliveryRepository for InMemoryRepository {
    fn fetch_pending_requests(&self) -> Result<Vec<DeliveryRequest>, anyhow::Error> {
        let mut pending: Vec<DeliveryRequest> = self
            .requests
            .lock()
            .values()
            .filter(|row| row.status == DeliveryStatus::Pending)
            .map(|row| row.request.clone())
            .collect();
        // Stable order out of the hash table.
        pending.sort_unstable_by(|a, b| a.id().cmp(b.id()));
        Ok(pending)
    }

    fn fetch_available_vehicles(&self) -> Result<Vec<Vehicle>, anyhow::Error> {
        let mut available: Vec<Vehicle> = self
            .vehicles
            .lock()
            .values()
            .filter(|row| row.status == VehicleStatus::Available)
            .map(|row| row.vehicle.clone())
            .collect();
        available.sort_unstable_by(|a, b| a.id().cmp(b.id()));
        Ok(available)
    }

    fn commit_assignments(&self, assignments: &Assignments) -> Result<(), anyhow::Error> {
        let vehicles = self.vehicles.lock();
        let mut requests = self.requests.lock();

        for (vehicle_id, deliveries) in assignments {
            if !vehicles.contains_key(vehicle_id) {
                bail!("cannot commit to unknown vehicle {vehicle_id}");
            }

            for delivery in deliveries {
                let Some(row) = requests.get_mut(delivery.id()) else {
                    bail!("cannot commit unknown request {}", delivery.id());
                };
                match row.status {
                    DeliveryStatus::Pending | DeliveryStatus::Assigned => {
                        row.status = DeliveryStatus::Assigned;
                        row.vehicle_id = Some(vehicle_id.clone());
                    }
                    DeliveryStatus::InProgress | DeliveryStatus::Completed => {
                        bail!(
                            "request {} is already {:?}, refusing to reassign",
                            delivery.id(),
                            row.status
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
