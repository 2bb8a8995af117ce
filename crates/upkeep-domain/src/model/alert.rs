//! Service-due alerts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use upkeep_types::{ServiceType, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    Active,
    Resolved,
}

/// Why an alert left the Active state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Marked done by a user
    Acknowledged,
    /// A qualifying service record was appended for the slot
    Serviced,
    /// The slot evaluated OK
    Cleared,
    /// Replaced by an alert of a different severity
    Superseded,
}

impl Resolution {
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Acknowledged => "acknowledged",
            Resolution::Serviced => "serviced",
            Resolution::Cleared => "cleared",
            Resolution::Superseded => "superseded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub vehicle_id: String,
    pub service_type: ServiceType,
    pub severity: Severity,
    pub message: String,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolution: Option<Resolution>,
}

impl Alert {
    /// Create a new Active alert for a slot
    pub fn open(
        vehicle_id: impl Into<String>,
        service_type: ServiceType,
        severity: Severity,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: super::new_id("alt"),
            vehicle_id: vehicle_id.into(),
            service_type,
            severity,
            message: message.into(),
            status: AlertStatus::Active,
            created_at: now,
            resolved_at: None,
            resolution: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }

    pub fn occupies(&self, vehicle_id: &str, service_type: &ServiceType) -> bool {
        self.is_active() && self.vehicle_id == vehicle_id && &self.service_type == service_type
    }

    /// Move to Resolved. Returns false if it already was.
    pub fn resolve(&mut self, resolution: Resolution, now: DateTime<Utc>) -> bool {
        if !self.is_active() {
            return false;
        }
        self.status = AlertStatus::Resolved;
        self.resolved_at = Some(now);
        self.resolution = Some(resolution);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_idempotent() {
        let now = Utc::now();
        let mut alert = Alert::open(
            "veh_1",
            ServiceType::OilChange,
            Severity::High,
            "overdue",
            now,
        );
        assert!(alert.resolve(Resolution::Acknowledged, now));
        let first = alert.resolved_at;
        assert!(!alert.resolve(Resolution::Cleared, Utc::now()));
        assert_eq!(alert.resolved_at, first);
        assert_eq!(alert.resolution, Some(Resolution::Acknowledged));
    }
}
