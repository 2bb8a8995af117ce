mod maintenance_service;

pub use maintenance_service::{
    EvaluationReport, FuelOutcome, ImportSummary, MaintenanceService, ServiceOutcome, TripOutcome,
    WorkOrderOutcome,
};
