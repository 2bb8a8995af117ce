//! Vehicle store: current odometer reading per vehicle

use std::collections::HashMap;
use std::sync::RwLock;

use upkeep_domain::model::Vehicle;
use upkeep_domain::repository::VehicleRepository;
use upkeep_types::{EntityKind, Error, Result};

use crate::{read, write};

#[derive(Debug, Default)]
pub struct VehicleStore {
    vehicles: RwLock<HashMap<String, Vehicle>>,
}

impl VehicleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vehicles(vehicles: Vec<Vehicle>) -> Self {
        Self {
            vehicles: RwLock::new(vehicles.into_iter().map(|v| (v.id.clone(), v)).collect()),
        }
    }

    /// Vehicles sorted by plate
    pub fn snapshot(&self) -> Result<Vec<Vehicle>> {
        let mut vehicles: Vec<_> = read(&self.vehicles)?.values().cloned().collect();
        vehicles.sort_by(|a, b| a.plate.cmp(&b.plate).then_with(|| a.id.cmp(&b.id)));
        Ok(vehicles)
    }
}

impl VehicleRepository for VehicleStore {
    fn get(&self, vehicle_id: &str) -> Result<Vehicle> {
        read(&self.vehicles)?
            .get(vehicle_id)
            .cloned()
            .ok_or_else(|| Error::not_found(EntityKind::Vehicle, vehicle_id))
    }

    fn find_by_plate(&self, plate: &str) -> Result<Option<Vehicle>> {
        let wanted = normalize_plate(plate);
        Ok(read(&self.vehicles)?
            .values()
            .find(|v| normalize_plate(&v.plate) == wanted)
            .cloned())
    }

    fn insert(&self, vehicle: Vehicle) -> Result<()> {
        write(&self.vehicles)?.insert(vehicle.id.clone(), vehicle);
        Ok(())
    }

    fn update_mileage(&self, vehicle_id: &str, mileage: u64) -> Result<Vehicle> {
        let mut vehicles = write(&self.vehicles)?;
        let vehicle = vehicles
            .get_mut(vehicle_id)
            .ok_or_else(|| Error::not_found(EntityKind::Vehicle, vehicle_id))?;
        vehicle.set_mileage(mileage)?;
        Ok(vehicle.clone())
    }

    fn list(&self) -> Result<Vec<Vehicle>> {
        self.snapshot()
    }
}

fn normalize_plate(plate: &str) -> String {
    plate
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}
