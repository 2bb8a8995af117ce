//! Service interval table per vehicle class
//!
//! Static configuration loaded once at startup. The defaults mirror the
//! intervals the workshop has been running with; warning windows and the
//! escalated set are tunable.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use upkeep_types::{ConfigError, ServiceType, VehicleClass};

/// Intervals in km keyed by service type
pub type Intervals = BTreeMap<ServiceType, u64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceIntervalTable {
    /// Class whose intervals apply to unrecognized classes
    #[serde(default = "default_class")]
    pub default_class: VehicleClass,

    /// Warning window for service types without an entry in `warning_km`
    #[serde(default = "default_warning_km")]
    pub default_warning_km: u64,

    /// Service types whose Overdue alerts are Critical instead of High
    #[serde(default = "default_escalated")]
    pub escalated: BTreeSet<ServiceType>,

    #[serde(default = "default_warnings")]
    pub warning_km: BTreeMap<ServiceType, u64>,

    pub intervals: BTreeMap<VehicleClass, Intervals>,
}

/// Intervals resolved for one vehicle class
#[derive(Debug, Clone, Copy)]
pub struct ClassIntervals<'a> {
    /// Class the intervals were taken from
    pub class: &'a VehicleClass,
    pub intervals: Option<&'a Intervals>,
    /// True when the requested class was not in the table
    pub fell_back: bool,
}

fn default_class() -> VehicleClass {
    VehicleClass::Car
}

fn default_warning_km() -> u64 {
    500
}

fn default_warnings() -> BTreeMap<ServiceType, u64> {
    BTreeMap::from([
        (ServiceType::OilChange, 500),
        (ServiceType::BrakeCheck, 500),
        (ServiceType::AirFilter, 500),
        (ServiceType::MajorService, 2000),
    ])
}

fn default_escalated() -> BTreeSet<ServiceType> {
    BTreeSet::from([ServiceType::MajorService])
}

fn intervals(oil: u64, brake: u64, air: u64, major: u64) -> Intervals {
    BTreeMap::from([
        (ServiceType::OilChange, oil),
        (ServiceType::BrakeCheck, brake),
        (ServiceType::AirFilter, air),
        (ServiceType::MajorService, major),
    ])
}

impl Default for ServiceIntervalTable {
    fn default() -> Self {
        Self {
            default_class: default_class(),
            default_warning_km: default_warning_km(),
            warning_km: default_warnings(),
            escalated: default_escalated(),
            intervals: BTreeMap::from([
                (VehicleClass::Car, intervals(5_000, 10_000, 15_000, 30_000)),
                (VehicleClass::Van, intervals(5_000, 10_000, 12_000, 40_000)),
                (VehicleClass::Bus, intervals(5_000, 10_000, 12_000, 40_000)),
                (VehicleClass::Truck, intervals(5_000, 10_000, 12_000, 40_000)),
            ]),
        }
    }
}

impl ServiceIntervalTable {
    /// Intervals for `class`, falling back to the default class
    pub fn intervals_for<'a>(&'a self, class: &'a VehicleClass) -> ClassIntervals<'a> {
        match self.intervals.get(class) {
            Some(found) => ClassIntervals {
                class,
                intervals: Some(found),
                fell_back: false,
            },
            None => ClassIntervals {
                class: &self.default_class,
                intervals: self.intervals.get(&self.default_class),
                fell_back: true,
            },
        }
    }

    pub fn warning_for(&self, service_type: &ServiceType) -> u64 {
        self.warning_km
            .get(service_type)
            .copied()
            .unwrap_or(self.default_warning_km)
    }

    pub fn is_escalated(&self, service_type: &ServiceType) -> bool {
        self.escalated.contains(service_type)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.intervals.is_empty() {
            return Err(ConfigError::InvalidIntervals(
                "no vehicle classes defined".to_string(),
            ));
        }
        if !self.intervals.contains_key(&self.default_class) {
            return Err(ConfigError::InvalidIntervals(format!(
                "default class '{}' has no intervals",
                self.default_class
            )));
        }
        for (class, table) in &self.intervals {
            for (service_type, km) in table {
                if *km == 0 {
                    return Err(ConfigError::InvalidIntervals(format!(
                        "{} interval for {} must be positive",
                        service_type.key(),
                        class
                    )));
                }
            }
        }
        Ok(())
    }
}
