//! Repository adapters for persistence layer

use std::path::{Path, PathBuf};
use std::sync::Arc;

use upkeep_domain::repository::{
    AlertRepository, FuelLogRepository, ServiceRecordRepository, TripRepository,
    VehicleRepository, WorkOrderRepository,
};
use upkeep_infra::persistence::SnapshotFile;
use upkeep_store::MemoryFleet;
use upkeep_types::Result;

use crate::config::Config;

/// Repository handles injected into the maintenance service
#[derive(Clone)]
pub struct Repositories {
    pub vehicles: Arc<dyn VehicleRepository>,
    pub ledger: Arc<dyn ServiceRecordRepository>,
    pub alerts: Arc<dyn AlertRepository>,
    pub trips: Arc<dyn TripRepository>,
    pub fuel: Arc<dyn FuelLogRepository>,
    pub work_orders: Arc<dyn WorkOrderRepository>,
}

impl Repositories {
    /// Fresh, empty in-memory stores
    pub fn in_memory() -> Self {
        Self::from_fleet(&MemoryFleet::new())
    }

    pub fn from_fleet(fleet: &MemoryFleet) -> Self {
        Self {
            vehicles: fleet.vehicles.clone(),
            ledger: fleet.ledger.clone(),
            alerts: fleet.alerts.clone(),
            trips: fleet.trips.clone(),
            fuel: fleet.fuel.clone(),
            work_orders: fleet.work_orders.clone(),
        }
    }
}

/// In-memory fleet loaded from, and saved back to, a snapshot file
pub struct FleetWorkspace {
    file: SnapshotFile,
    fleet: MemoryFleet,
}

impl FleetWorkspace {
    /// Open the snapshot in the configured store directory
    pub fn open(config: &Config) -> Result<Self> {
        Self::open_at(config.store_dir()?)
    }

    /// Open the snapshot at a custom directory
    pub fn open_at(store_dir: PathBuf) -> Result<Self> {
        let file = SnapshotFile::open(store_dir)?;
        let fleet = MemoryFleet::from_snapshot(file.load()?);
        Ok(Self { file, fleet })
    }

    pub fn repositories(&self) -> Repositories {
        Repositories::from_fleet(&self.fleet)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Write the current state of every store to disk
    pub fn save(&self) -> Result<()> {
        let snapshot = self.fleet.snapshot()?;
        self.file.save(&snapshot)?;
        tracing::debug!(path = %self.file.path().display(), "fleet snapshot saved");
        Ok(())
    }
}
