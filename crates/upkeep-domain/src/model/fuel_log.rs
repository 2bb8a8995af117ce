//! Fuel log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelLog {
    pub id: String,
    pub vehicle_id: String,
    pub liters: f64,
    pub cost: f64,
    /// Odometer reading at fill-up, feeds the vehicle's mileage
    #[serde(default)]
    pub odometer: Option<u64>,
    pub logged_at: DateTime<Utc>,
}

impl FuelLog {
    pub fn new(vehicle_id: impl Into<String>, liters: f64, cost: f64) -> Self {
        Self {
            id: super::new_id("fuel"),
            vehicle_id: vehicle_id.into(),
            liters,
            cost,
            odometer: None,
            logged_at: Utc::now(),
        }
    }

    pub fn with_odometer(mut self, odometer: u64) -> Self {
        self.odometer = Some(odometer);
        self
    }

    pub fn with_logged_at(mut self, logged_at: DateTime<Utc>) -> Self {
        self.logged_at = logged_at;
        self
    }

    /// Cost per liter, 0 when no fuel was recorded
    pub fn cost_per_liter(&self) -> f64 {
        if self.liters > 0.0 {
            self.cost / self.liters
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_per_liter() {
        let log = FuelLog::new("veh_1", 40.0, 600.0);
        assert!((log.cost_per_liter() - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cost_per_liter_without_fuel() {
        let log = FuelLog::new("veh_1", 0.0, 25.0);
        assert_eq!(log.cost_per_liter(), 0.0);
    }
}
