//! Repository trait definitions for fleet state
//!
//! Implementations must be `Send + Sync`; the maintenance service shares them
//! across threads and serializes writes per vehicle itself.

use upkeep_types::{Result, ServiceType, Severity};

use crate::model::{Alert, FuelLog, ServiceRecord, Trip, Vehicle, WorkOrder};
use crate::service::ReconcilePlan;

/// Vehicle state store: authoritative current mileage per vehicle
pub trait VehicleRepository: Send + Sync {
    /// Get a vehicle, `NotFound` if unknown
    fn get(&self, vehicle_id: &str) -> Result<Vehicle>;

    /// Find a vehicle by registration plate
    fn find_by_plate(&self, plate: &str) -> Result<Option<Vehicle>>;

    /// Add or replace a vehicle
    fn insert(&self, vehicle: Vehicle) -> Result<()>;

    /// Set the odometer reading; `InvalidMileage` if it would decrease
    fn update_mileage(&self, vehicle_id: &str, mileage: u64) -> Result<Vehicle>;

    /// All vehicles sorted by plate
    fn list(&self) -> Result<Vec<Vehicle>>;

    fn get_mileage(&self, vehicle_id: &str) -> Result<u64> {
        Ok(self.get(vehicle_id)?.current_mileage)
    }
}

/// Append-only service history ledger
pub trait ServiceRecordRepository: Send + Sync {
    fn append(&self, record: ServiceRecord) -> Result<()>;

    /// Records for one slot, in append order
    fn query(&self, vehicle_id: &str, service_type: &ServiceType) -> Result<Vec<ServiceRecord>>;

    /// All records for a vehicle, newest service first
    fn for_vehicle(&self, vehicle_id: &str) -> Result<Vec<ServiceRecord>>;

    /// Highest mileage at which the service was performed, 0 if never
    fn last_service_mileage(&self, vehicle_id: &str, service_type: &ServiceType) -> Result<u64> {
        Ok(self
            .query(vehicle_id, service_type)?
            .iter()
            .map(|r| r.mileage_at_service)
            .max()
            .unwrap_or(0))
    }
}

/// Alert set holding Active and Resolved alerts
pub trait AlertRepository: Send + Sync {
    /// Raise or refresh the Active alert for a slot, keeping at most one
    fn upsert_for_slot(
        &self,
        vehicle_id: &str,
        service_type: &ServiceType,
        severity: Severity,
        message: &str,
    ) -> Result<Alert>;

    /// Mark an alert Resolved by a user; no-op if already resolved
    fn resolve(&self, alert_id: &str) -> Result<Alert>;

    fn get(&self, alert_id: &str) -> Result<Alert>;

    /// Active alerts, most severe first
    fn list_active(&self) -> Result<Vec<Alert>>;

    /// Active alerts of one severity
    fn list_by_severity(&self, severity: Severity) -> Result<Vec<Alert>>;

    fn active_for_vehicle(&self, vehicle_id: &str) -> Result<Vec<Alert>>;

    /// Every alert including resolved history, newest first
    fn all(&self) -> Result<Vec<Alert>>;

    /// Apply a reconciliation plan atomically; returns the touched alerts
    fn apply(&self, plan: &ReconcilePlan) -> Result<Vec<Alert>>;
}

pub trait TripRepository: Send + Sync {
    fn insert(&self, trip: Trip) -> Result<()>;

    fn get(&self, trip_id: &str) -> Result<Trip>;

    fn update(&self, trip: Trip) -> Result<()>;

    /// Trips, optionally for one vehicle, newest first
    fn list(&self, vehicle_id: Option<&str>) -> Result<Vec<Trip>>;
}

pub trait FuelLogRepository: Send + Sync {
    fn append(&self, log: FuelLog) -> Result<()>;

    /// Logs, optionally for one vehicle, newest first
    fn list(&self, vehicle_id: Option<&str>) -> Result<Vec<FuelLog>>;
}

pub trait WorkOrderRepository: Send + Sync {
    fn insert(&self, order: WorkOrder) -> Result<()>;

    fn get(&self, order_id: &str) -> Result<WorkOrder>;

    fn update(&self, order: WorkOrder) -> Result<()>;

    /// Orders, optionally for one vehicle, newest first
    fn list(&self, vehicle_id: Option<&str>) -> Result<Vec<WorkOrder>>;
}
