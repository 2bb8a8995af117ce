//! Error types for fleet-upkeep

use serde::Serialize;
use thiserror::Error;

use crate::VehicleClass;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid interval table: {0}")]
    InvalidIntervals(String),
}

/// Kind of entity a lookup failed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityKind {
    Vehicle,
    Alert,
    Trip,
    WorkOrder,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Vehicle => write!(f, "Vehicle"),
            EntityKind::Alert => write!(f, "Alert"),
            EntityKind::Trip => write!(f, "Trip"),
            EntityKind::WorkOrder => write!(f, "Work order"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Invalid mileage for vehicle {vehicle_id}: {attempted} km is below the current reading of {current} km")]
    InvalidMileage {
        vehicle_id: String,
        current: u64,
        attempted: u64,
    },

    #[error("Invalid transition for {kind} {id}: {from} -> {to}")]
    InvalidTransition {
        kind: EntityKind,
        id: String,
        from: String,
        to: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl Error {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// True for the `NotFound` variant of the given kind
    pub fn is_not_found(&self, expected: EntityKind) -> bool {
        matches!(self, Error::NotFound { kind, .. } if *kind == expected)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal conditions raised while evaluating a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum Warning {
    #[error("Vehicle {vehicle_id} has unrecognized class '{class}', using the {fallback} interval table")]
    UnrecognizedVehicleClass {
        vehicle_id: String,
        class: String,
        fallback: VehicleClass,
    },
}
