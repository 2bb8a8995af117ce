//! Trip, fuel and work order logs

use std::sync::RwLock;

use upkeep_domain::model::{FuelLog, Trip, WorkOrder};
use upkeep_domain::repository::{FuelLogRepository, TripRepository, WorkOrderRepository};
use upkeep_types::{EntityKind, Error, Result};

use crate::{read, write};

#[derive(Debug, Default)]
pub struct TripLog {
    trips: RwLock<Vec<Trip>>,
}

impl TripLog {
    pub fn from_entries(trips: Vec<Trip>) -> Self {
        Self {
            trips: RwLock::new(trips),
        }
    }

    pub fn snapshot(&self) -> Result<Vec<Trip>> {
        Ok(read(&self.trips)?.clone())
    }
}

impl TripRepository for TripLog {
    fn insert(&self, trip: Trip) -> Result<()> {
        write(&self.trips)?.push(trip);
        Ok(())
    }

    fn get(&self, trip_id: &str) -> Result<Trip> {
        read(&self.trips)?
            .iter()
            .find(|t| t.id == trip_id)
            .cloned()
            .ok_or_else(|| Error::not_found(EntityKind::Trip, trip_id))
    }

    fn update(&self, trip: Trip) -> Result<()> {
        let mut trips = write(&self.trips)?;
        let slot = trips
            .iter_mut()
            .find(|t| t.id == trip.id)
            .ok_or_else(|| Error::not_found(EntityKind::Trip, trip.id.clone()))?;
        *slot = trip;
        Ok(())
    }

    fn list(&self, vehicle_id: Option<&str>) -> Result<Vec<Trip>> {
        let mut trips: Vec<_> = read(&self.trips)?
            .iter()
            .filter(|t| vehicle_id.map_or(true, |id| t.vehicle_id == id))
            .cloned()
            .collect();
        trips.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(trips)
    }
}

#[derive(Debug, Default)]
pub struct FuelLedger {
    logs: RwLock<Vec<FuelLog>>,
}

impl FuelLedger {
    pub fn from_entries(logs: Vec<FuelLog>) -> Self {
        Self {
            logs: RwLock::new(logs),
        }
    }

    pub fn snapshot(&self) -> Result<Vec<FuelLog>> {
        Ok(read(&self.logs)?.clone())
    }
}

impl FuelLogRepository for FuelLedger {
    fn append(&self, log: FuelLog) -> Result<()> {
        write(&self.logs)?.push(log);
        Ok(())
    }

    fn list(&self, vehicle_id: Option<&str>) -> Result<Vec<FuelLog>> {
        let mut logs: Vec<_> = read(&self.logs)?
            .iter()
            .filter(|l| vehicle_id.map_or(true, |id| l.vehicle_id == id))
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.logged_at.cmp(&a.logged_at));
        Ok(logs)
    }
}

#[derive(Debug, Default)]
pub struct WorkOrderBook {
    orders: RwLock<Vec<WorkOrder>>,
}

impl WorkOrderBook {
    pub fn from_entries(orders: Vec<WorkOrder>) -> Self {
        Self {
            orders: RwLock::new(orders),
        }
    }

    pub fn snapshot(&self) -> Result<Vec<WorkOrder>> {
        Ok(read(&self.orders)?.clone())
    }
}

impl WorkOrderRepository for WorkOrderBook {
    fn insert(&self, order: WorkOrder) -> Result<()> {
        write(&self.orders)?.push(order);
        Ok(())
    }

    fn get(&self, order_id: &str) -> Result<WorkOrder> {
        read(&self.orders)?
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
            .ok_or_else(|| Error::not_found(EntityKind::WorkOrder, order_id))
    }

    fn update(&self, order: WorkOrder) -> Result<()> {
        let mut orders = write(&self.orders)?;
        let slot = orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or_else(|| Error::not_found(EntityKind::WorkOrder, order.id.clone()))?;
        *slot = order;
        Ok(())
    }

    fn list(&self, vehicle_id: Option<&str>) -> Result<Vec<WorkOrder>> {
        let mut orders: Vec<_> = read(&self.orders)?
            .iter()
            .filter(|o| vehicle_id.map_or(true, |id| o.vehicle_id == id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}
