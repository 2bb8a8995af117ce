//! Odometer trips

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use upkeep_types::{EntityKind, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripStatus {
    InProgress,
    Completed,
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TripStatus::InProgress => write!(f, "In Progress"),
            TripStatus::Completed => write!(f, "Completed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub vehicle_id: String,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    pub start_odometer: u64,
    #[serde(default)]
    pub end_odometer: Option<u64>,
    #[serde(default)]
    pub distance: Option<u64>,
    pub status: TripStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Trip {
    pub fn start(vehicle_id: impl Into<String>, start_odometer: u64) -> Self {
        Self {
            id: super::new_id("trip"),
            vehicle_id: vehicle_id.into(),
            driver: None,
            purpose: None,
            start_odometer,
            end_odometer: None,
            distance: None,
            status: TripStatus::InProgress,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Close the trip at `end_odometer` and return the distance driven
    pub fn complete(&mut self, end_odometer: u64, now: DateTime<Utc>) -> Result<u64> {
        if self.status != TripStatus::InProgress {
            return Err(Error::InvalidTransition {
                kind: EntityKind::Trip,
                id: self.id.clone(),
                from: self.status.to_string(),
                to: TripStatus::Completed.to_string(),
            });
        }
        if end_odometer < self.start_odometer {
            return Err(Error::InvalidMileage {
                vehicle_id: self.vehicle_id.clone(),
                current: self.start_odometer,
                attempted: end_odometer,
            });
        }
        let distance = end_odometer - self.start_odometer;
        self.end_odometer = Some(end_odometer);
        self.distance = Some(distance);
        self.status = TripStatus::Completed;
        self.ended_at = Some(now);
        Ok(distance)
    }
}
