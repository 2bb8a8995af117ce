//! In-memory stores implementing the domain repository traits
//!
//! Each store owns its data behind a `RwLock` so a single instance can be
//! shared between threads. Stores are built from, and exported to, a
//! [`FleetSnapshot`]; persisting the snapshot is left to the caller.

pub mod alerts;
pub mod ledger;
pub mod logs;
pub mod vehicles;

pub use alerts::AlertSet;
pub use ledger::ServiceLedger;
pub use logs::{FuelLedger, TripLog, WorkOrderBook};
pub use vehicles::VehicleStore;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use upkeep_domain::model::{Alert, FuelLog, ServiceRecord, Trip, Vehicle, WorkOrder};
use upkeep_types::{Error, Result};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable image of every store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
    #[serde(default)]
    pub service_records: Vec<ServiceRecord>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub trips: Vec<Trip>,
    #[serde(default)]
    pub fuel_logs: Vec<FuelLog>,
    #[serde(default)]
    pub work_orders: Vec<WorkOrder>,
}

/// All stores of one fleet, shared by reference count
#[derive(Clone, Default)]
pub struct MemoryFleet {
    pub vehicles: Arc<VehicleStore>,
    pub ledger: Arc<ServiceLedger>,
    pub alerts: Arc<AlertSet>,
    pub trips: Arc<TripLog>,
    pub fuel: Arc<FuelLedger>,
    pub work_orders: Arc<WorkOrderBook>,
}

impl MemoryFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: FleetSnapshot) -> Self {
        tracing::debug!(
            vehicles = snapshot.vehicles.len(),
            records = snapshot.service_records.len(),
            alerts = snapshot.alerts.len(),
            "loading fleet snapshot"
        );
        Self {
            vehicles: Arc::new(VehicleStore::from_vehicles(snapshot.vehicles)),
            ledger: Arc::new(ServiceLedger::from_records(snapshot.service_records)),
            alerts: Arc::new(AlertSet::from_alerts(snapshot.alerts)),
            trips: Arc::new(TripLog::from_entries(snapshot.trips)),
            fuel: Arc::new(FuelLedger::from_entries(snapshot.fuel_logs)),
            work_orders: Arc::new(WorkOrderBook::from_entries(snapshot.work_orders)),
        }
    }

    pub fn snapshot(&self) -> Result<FleetSnapshot> {
        Ok(FleetSnapshot {
            version: SNAPSHOT_VERSION,
            vehicles: self.vehicles.snapshot()?,
            service_records: self.ledger.snapshot()?,
            alerts: self.alerts.snapshot()?,
            trips: self.trips.snapshot()?,
            fuel_logs: self.fuel.snapshot()?,
            work_orders: self.work_orders.snapshot()?,
        })
    }
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| Error::Store("store lock poisoned".to_string()))
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| Error::Store("store lock poisoned".to_string()))
}
