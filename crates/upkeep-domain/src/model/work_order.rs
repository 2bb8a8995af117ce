//! Workshop work orders

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use upkeep_types::{EntityKind, Error, Result, ServiceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkOrderStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl WorkOrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Completed | WorkOrderStatus::Cancelled)
    }

    /// Orders only move forward: Pending -> InProgress -> Completed/Cancelled
    pub fn can_move_to(&self, next: WorkOrderStatus) -> bool {
        match self {
            WorkOrderStatus::Pending => next != WorkOrderStatus::Pending,
            WorkOrderStatus::InProgress => next.is_terminal(),
            WorkOrderStatus::Completed | WorkOrderStatus::Cancelled => false,
        }
    }
}

impl std::fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkOrderStatus::Pending => write!(f, "Pending"),
            WorkOrderStatus::InProgress => write!(f, "In Progress"),
            WorkOrderStatus::Completed => write!(f, "Completed"),
            WorkOrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: String,
    pub vehicle_id: String,
    pub description: String,
    /// Service performed; completion appends a ledger record when known
    #[serde(default)]
    pub service_type: Option<ServiceType>,
    #[serde(default)]
    pub total_cost: f64,
    pub status: WorkOrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkOrder {
    /// Open a pending work order. Without an explicit service type the
    /// description is parsed, and only built-in types are accepted from it.
    pub fn new(
        vehicle_id: impl Into<String>,
        description: impl Into<String>,
        service_type: Option<ServiceType>,
    ) -> Self {
        let description = description.into();
        let service_type = service_type.or_else(|| {
            let parsed = ServiceType::parse(&description);
            ServiceType::BUILT_IN.contains(&parsed).then_some(parsed)
        });
        Self {
            id: super::new_id("wo"),
            vehicle_id: vehicle_id.into(),
            description,
            service_type,
            total_cost: 0.0,
            status: WorkOrderStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn with_cost(mut self, total_cost: f64) -> Self {
        self.total_cost = total_cost;
        self
    }

    /// Move to `next`. Returns true when this call completed the order.
    pub fn transition(&mut self, next: WorkOrderStatus, now: DateTime<Utc>) -> Result<bool> {
        if !self.status.can_move_to(next) {
            return Err(Error::InvalidTransition {
                kind: EntityKind::WorkOrder,
                id: self.id.clone(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        if next == WorkOrderStatus::Completed {
            self.completed_at = Some(now);
            return Ok(true);
        }
        Ok(false)
    }
}
