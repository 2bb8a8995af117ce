use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use upkeep_types::ServiceType;

/// A completed maintenance event. Immutable once appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: String,
    pub vehicle_id: String,
    pub service_type: ServiceType,
    pub mileage_at_service: u64,
    pub performed_at: DateTime<Utc>,
    /// Work order that produced this record, if any
    #[serde(default)]
    pub work_order_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ServiceRecord {
    pub fn new(
        vehicle_id: impl Into<String>,
        service_type: ServiceType,
        mileage_at_service: u64,
        performed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: super::new_id("mnt"),
            vehicle_id: vehicle_id.into(),
            service_type,
            mileage_at_service,
            performed_at,
            work_order_id: None,
            notes: None,
        }
    }

    pub fn with_work_order(mut self, work_order_id: impl Into<String>) -> Self {
        self.work_order_id = Some(work_order_id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
