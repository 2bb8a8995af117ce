//! Vehicle state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use upkeep_types::{Error, Result, VehicleClass};

/// A fleet vehicle and its current odometer reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Unique identifier
    pub id: String,
    /// Registration plate, shown in alert messages
    pub plate: String,
    /// Class selecting the interval table
    pub class: VehicleClass,
    /// Odometer reading in km, never decreases
    #[serde(default)]
    pub current_mileage: u64,
    /// When registered
    pub registered_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(plate: impl Into<String>, class: VehicleClass) -> Self {
        Self {
            id: super::new_id("veh"),
            plate: plate.into(),
            class,
            current_mileage: 0,
            registered_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_mileage(mut self, mileage: u64) -> Self {
        self.current_mileage = mileage;
        self
    }

    /// Reject odometer readings below the current one
    pub fn check_mileage(&self, new_mileage: u64) -> Result<()> {
        if new_mileage < self.current_mileage {
            return Err(Error::InvalidMileage {
                vehicle_id: self.id.clone(),
                current: self.current_mileage,
                attempted: new_mileage,
            });
        }
        Ok(())
    }

    /// Apply a new odometer reading
    pub fn set_mileage(&mut self, new_mileage: u64) -> Result<()> {
        self.check_mileage(new_mileage)?;
        self.current_mileage = new_mileage;
        Ok(())
    }
}
