//! Shared vocabulary: vehicle classes, service types and alert severities

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Vehicle class, selects the service interval table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VehicleClass {
    Car,
    Van,
    Bus,
    Truck,
    /// Anything else, kept verbatim
    Unrecognized(String),
}

impl VehicleClass {
    /// Parse a class name (case-insensitive)
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "car" => VehicleClass::Car,
            "van" => VehicleClass::Van,
            "bus" => VehicleClass::Bus,
            "truck" => VehicleClass::Truck,
            _ => VehicleClass::Unrecognized(value.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            VehicleClass::Car => "Car",
            VehicleClass::Van => "Van",
            VehicleClass::Bus => "Bus",
            VehicleClass::Truck => "Truck",
            VehicleClass::Unrecognized(name) => name.as_str(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, VehicleClass::Unrecognized(_))
    }
}

impl From<String> for VehicleClass {
    fn from(value: String) -> Self {
        VehicleClass::parse(&value)
    }
}

impl From<VehicleClass> for String {
    fn from(value: VehicleClass) -> Self {
        value.label().to_string()
    }
}

impl std::fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Category of maintenance action with its own interval
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceType {
    OilChange,
    BrakeCheck,
    AirFilter,
    MajorService,
    /// Service type introduced through configuration (normalized key)
    Other(String),
}

impl ServiceType {
    pub const BUILT_IN: [ServiceType; 4] = [
        ServiceType::OilChange,
        ServiceType::BrakeCheck,
        ServiceType::AirFilter,
        ServiceType::MajorService,
    ];

    /// Parse a key ("oil_change") or a label ("Oil Change", "Brake Service")
    pub fn parse(value: &str) -> Self {
        let key = normalize_key(value);
        match key.as_str() {
            "oil_change" => ServiceType::OilChange,
            "brake_check" | "brake_service" => ServiceType::BrakeCheck,
            "air_filter" | "air_filter_tune_up" => ServiceType::AirFilter,
            "major_service" => ServiceType::MajorService,
            _ => ServiceType::Other(key),
        }
    }

    /// Canonical configuration key
    pub fn key(&self) -> &str {
        match self {
            ServiceType::OilChange => "oil_change",
            ServiceType::BrakeCheck => "brake_check",
            ServiceType::AirFilter => "air_filter",
            ServiceType::MajorService => "major_service",
            ServiceType::Other(key) => key.as_str(),
        }
    }

    /// Human-readable label used in alert messages
    pub fn label(&self) -> &str {
        match self {
            ServiceType::OilChange => "Oil Change",
            ServiceType::BrakeCheck => "Brake Check",
            ServiceType::AirFilter => "Air Filter / Tune Up",
            ServiceType::MajorService => "Major Service",
            ServiceType::Other(key) => key.as_str(),
        }
    }
}

fn normalize_key(value: &str) -> String {
    let mut key = String::with_capacity(value.len());
    for c in value.trim().chars() {
        if c.is_alphanumeric() {
            key.extend(c.to_lowercase());
        } else if !key.is_empty() && !key.ends_with('_') {
            key.push('_');
        }
    }
    while key.ends_with('_') {
        key.pop();
    }
    key
}

impl From<String> for ServiceType {
    fn from(value: String) -> Self {
        ServiceType::parse(&value)
    }
}

impl From<ServiceType> for String {
    fn from(value: ServiceType) -> Self {
        value.key().to_string()
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Alert severity, ordered from least to most urgent
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize,
)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// One level up, saturating at Critical
    pub fn escalate(self) -> Self {
        match self {
            Severity::Low => Severity::Medium,
            Severity::Medium => Severity::High,
            Severity::High | Severity::Critical => Severity::Critical,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
