//! Service-due evaluation
//!
//! Turns a vehicle's odometer state into a due state per tracked service
//! type, then diffs that against the vehicle's Active alerts. The evaluator
//! does not mutate anything: it returns a [`ReconcilePlan`] which the alert
//! store applies in one step.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use upkeep_types::{ServiceType, Severity, VehicleClass, Warning};

use crate::model::{Alert, Resolution, ServiceIntervalTable, Vehicle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DueState {
    Ok,
    DueSoon,
    Overdue,
}

impl DueState {
    pub fn label(&self) -> &'static str {
        match self {
            DueState::Ok => "OK",
            DueState::DueSoon => "Due soon",
            DueState::Overdue => "Overdue",
        }
    }
}

/// Classification of one (vehicle, service type) slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotStatus {
    pub service_type: ServiceType,
    pub interval_km: u64,
    pub last_service_km: u64,
    /// Negative when a service was logged above the current reading
    pub km_since_service: i64,
    /// Zero or negative once overdue
    pub km_until_due: i64,
    pub state: DueState,
    pub severity: Option<Severity>,
}

impl SlotStatus {
    /// Alert text for this slot, None when the slot is OK
    pub fn message(&self, plate: &str) -> Option<String> {
        match self.state {
            DueState::Ok => None,
            DueState::DueSoon => Some(format!(
                "{} - {} due in {} km",
                plate,
                self.service_type.label(),
                self.km_until_due
            )),
            DueState::Overdue => Some(format!(
                "{} - {} is OVERDUE ({} km past due)",
                plate,
                self.service_type.label(),
                self.km_until_due.unsigned_abs()
            )),
        }
    }
}

/// Classify a single slot.
///
/// Overdue once `km_until_due <= 0` (High, or Critical when escalated),
/// DueSoon inside the warning window (Medium), OK otherwise.
pub fn classify_slot(
    service_type: &ServiceType,
    current_mileage: u64,
    last_service_km: u64,
    interval_km: u64,
    warning_km: u64,
    escalated: bool,
) -> SlotStatus {
    let since = i128::from(current_mileage) - i128::from(last_service_km);
    let until_due = i128::from(interval_km) - since;

    let (state, severity) = if until_due <= 0 {
        let severity = if escalated {
            Severity::High.escalate()
        } else {
            Severity::High
        };
        (DueState::Overdue, Some(severity))
    } else if until_due <= i128::from(warning_km) {
        (DueState::DueSoon, Some(Severity::Medium))
    } else {
        (DueState::Ok, None)
    };

    SlotStatus {
        service_type: service_type.clone(),
        interval_km,
        last_service_km,
        km_since_service: saturate(since),
        km_until_due: saturate(until_due),
        state,
        severity,
    }
}

fn saturate(km: i128) -> i64 {
    i64::try_from(km).unwrap_or(if km < 0 { i64::MIN } else { i64::MAX })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SlotAction {
    /// Raise a new Active alert; the slot has none
    Open { severity: Severity, message: String },
    /// Same severity, new text; the alert keeps its id
    Refresh { alert_id: String, message: String },
    /// Resolve the current alert as superseded and raise one at a new severity
    Replace {
        alert_id: String,
        severity: Severity,
        message: String,
    },
    /// Resolve the current alert
    Close {
        alert_id: String,
        resolution: Resolution,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotChange {
    pub service_type: ServiceType,
    pub action: SlotAction,
}

/// Diff between computed due states and the Active alerts of one vehicle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcilePlan {
    pub vehicle_id: String,
    pub changes: Vec<SlotChange>,
}

impl ReconcilePlan {
    pub fn new(vehicle_id: impl Into<String>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            changes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn push(&mut self, service_type: &ServiceType, action: SlotAction) {
        self.changes.push(SlotChange {
            service_type: service_type.clone(),
            action,
        });
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub vehicle_id: String,
    /// Class whose intervals were used
    pub class_used: VehicleClass,
    pub current_mileage: u64,
    pub slots: Vec<SlotStatus>,
    pub plan: ReconcilePlan,
    pub warnings: Vec<Warning>,
}

impl Evaluation {
    pub fn slot(&self, service_type: &ServiceType) -> Option<&SlotStatus> {
        self.slots.iter().find(|s| &s.service_type == service_type)
    }
}

pub struct AlertEvaluator<'a> {
    table: &'a ServiceIntervalTable,
}

impl<'a> AlertEvaluator<'a> {
    pub fn new(table: &'a ServiceIntervalTable) -> Self {
        Self { table }
    }

    /// Evaluate every tracked slot of `vehicle`.
    ///
    /// `last_service` maps service type to last-service mileage; missing
    /// entries count as never serviced. `active` may contain alerts for other
    /// vehicles, they are ignored. `serviced` holds the slots that just received
    /// a qualifying service record; their Active alerts are closed as Serviced
    /// before the fresh classification is applied.
    pub fn evaluate(
        &self,
        vehicle: &Vehicle,
        last_service: &BTreeMap<ServiceType, u64>,
        active: &[Alert],
        serviced: &BTreeSet<ServiceType>,
    ) -> Evaluation {
        let resolved = self.table.intervals_for(&vehicle.class);
        let mut warnings = Vec::new();
        if resolved.fell_back {
            warnings.push(Warning::UnrecognizedVehicleClass {
                vehicle_id: vehicle.id.clone(),
                class: vehicle.class.label().to_string(),
                fallback: resolved.class.clone(),
            });
        }

        let mut slots = Vec::new();
        let mut plan = ReconcilePlan::new(vehicle.id.clone());

        for (service_type, interval_km) in resolved.intervals.into_iter().flatten() {
            let status = classify_slot(
                service_type,
                vehicle.current_mileage,
                last_service.get(service_type).copied().unwrap_or(0),
                *interval_km,
                self.table.warning_for(service_type),
                self.table.is_escalated(service_type),
            );

            let mut occupants = active
                .iter()
                .filter(|a| a.occupies(&vehicle.id, service_type));
            let mut existing = occupants.next();
            for extra in occupants {
                plan.push(
                    service_type,
                    SlotAction::Close {
                        alert_id: extra.id.clone(),
                        resolution: Resolution::Superseded,
                    },
                );
            }

            if serviced.contains(service_type) {
                if let Some(alert) = existing.take() {
                    plan.push(
                        service_type,
                        SlotAction::Close {
                            alert_id: alert.id.clone(),
                            resolution: Resolution::Serviced,
                        },
                    );
                }
            }

            let wanted = status.severity.zip(status.message(&vehicle.plate));
            match (wanted, existing) {
                (None, None) => {}
                (None, Some(alert)) => plan.push(
                    service_type,
                    SlotAction::Close {
                        alert_id: alert.id.clone(),
                        resolution: Resolution::Cleared,
                    },
                ),
                (Some((severity, message)), None) => {
                    plan.push(service_type, SlotAction::Open { severity, message })
                }
                (Some((severity, message)), Some(alert)) if alert.severity == severity => {
                    if alert.message != message {
                        plan.push(
                            service_type,
                            SlotAction::Refresh {
                                alert_id: alert.id.clone(),
                                message,
                            },
                        );
                    }
                }
                (Some((severity, message)), Some(alert)) => plan.push(
                    service_type,
                    SlotAction::Replace {
                        alert_id: alert.id.clone(),
                        severity,
                        message,
                    },
                ),
            }

            slots.push(status);
        }

        Evaluation {
            vehicle_id: vehicle.id.clone(),
            class_used: resolved.class.clone(),
            current_mileage: vehicle.current_mileage,
            slots,
            plan,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn van(mileage: u64) -> Vehicle {
        Vehicle::new("B 7001 VAN", VehicleClass::Van)
            .with_id("veh_van")
            .with_mileage(mileage)
    }

    /// Minimal plan application for exercising idempotence without a store
    fn apply(active: &mut Vec<Alert>, plan: &ReconcilePlan) {
        let now = Utc::now();
        for change in &plan.changes {
            match &change.action {
                SlotAction::Open { severity, message } => active.push(Alert::open(
                    plan.vehicle_id.clone(),
                    change.service_type.clone(),
                    *severity,
                    message.clone(),
                    now,
                )),
                SlotAction::Refresh { alert_id, message } => {
                    if let Some(a) = active.iter_mut().find(|a| &a.id == alert_id) {
                        a.message = message.clone();
                    }
                }
                SlotAction::Replace {
                    alert_id,
                    severity,
                    message,
                } => {
                    active.retain(|a| &a.id != alert_id);
                    active.push(Alert::open(
                        plan.vehicle_id.clone(),
                        change.service_type.clone(),
                        *severity,
                        message.clone(),
                        now,
                    ));
                }
                SlotAction::Close { alert_id, .. } => active.retain(|a| &a.id != alert_id),
            }
        }
    }

    #[test]
    fn test_overdue_at_interval() {
        let table = ServiceIntervalTable::default();
        let eval = AlertEvaluator::new(&table).evaluate(&van(5_000), &BTreeMap::new(), &[], &BTreeSet::new());
        let oil = eval.slot(&ServiceType::OilChange).unwrap();
        assert_eq!(oil.state, DueState::Overdue);
        assert_eq!(oil.severity, Some(Severity::High));
        assert_eq!(oil.km_until_due, 0);
    }

    #[test]
    fn test_due_soon_inside_warning_window() {
        let table = ServiceIntervalTable::default();
        let eval = AlertEvaluator::new(&table).evaluate(&van(4_600), &BTreeMap::new(), &[], &BTreeSet::new());
        let oil = eval.slot(&ServiceType::OilChange).unwrap();
        assert_eq!(oil.state, DueState::DueSoon);
        assert_eq!(oil.severity, Some(Severity::Medium));
        assert_eq!(oil.km_until_due, 400);
        assert_eq!(
            oil.message("B 7001 VAN").unwrap(),
            "B 7001 VAN - Oil Change due in 400 km"
        );
    }

    #[test]
    fn test_major_service_escalates_to_critical() {
        let status = classify_slot(&ServiceType::MajorService, 41_000, 0, 40_000, 2_000, true);
        assert_eq!(status.state, DueState::Overdue);
        assert_eq!(status.severity, Some(Severity::Critical));
        assert_eq!(
            status.message("X").unwrap(),
            "X - Major Service is OVERDUE (1000 km past due)"
        );
    }

    #[test]
    fn test_major_service_warning_window_is_wider() {
        let status = classify_slot(&ServiceType::MajorService, 38_500, 0, 40_000, 2_000, true);
        assert_eq!(status.state, DueState::DueSoon);
        assert_eq!(status.severity, Some(Severity::Medium));
    }

    #[test]
    fn test_service_above_current_mileage_is_ok() {
        let status = classify_slot(&ServiceType::OilChange, 1_000, 1_500, 5_000, 500, false);
        assert_eq!(status.km_since_service, -500);
        assert_eq!(status.state, DueState::Ok);
    }

    #[test]
    fn test_huge_odometer_saturates_instead_of_wrapping() {
        let status = classify_slot(&ServiceType::OilChange, u64::MAX, 0, 5_000, 500, false);
        assert_eq!(status.state, DueState::Overdue);
        assert_eq!(status.km_since_service, i64::MAX);
        assert_eq!(status.km_until_due, i64::MIN);

        let status = classify_slot(&ServiceType::OilChange, 1 << 63, 0, 5_000, 500, false);
        assert_eq!(status.state, DueState::Overdue);

        let status = classify_slot(&ServiceType::OilChange, 0, u64::MAX, 5_000, 500, false);
        assert_eq!(status.state, DueState::Ok);
        assert_eq!(status.km_since_service, i64::MIN);
    }

    #[test]
    fn test_last_service_resets_slot() {
        let table = ServiceIntervalTable::default();
        let last = BTreeMap::from([(ServiceType::OilChange, 4_600)]);
        let eval = AlertEvaluator::new(&table).evaluate(&van(4_600), &last, &[], &BTreeSet::new());
        assert_eq!(
            eval.slot(&ServiceType::OilChange).unwrap().state,
            DueState::Ok
        );
    }

    #[test]
    fn test_unrecognized_class_warns_and_uses_default() {
        let table = ServiceIntervalTable::default();
        let vehicle = Vehicle::new("T 1", VehicleClass::parse("Tractor")).with_mileage(14_800);
        let eval = AlertEvaluator::new(&table).evaluate(&vehicle, &BTreeMap::new(), &[], &BTreeSet::new());
        assert_eq!(eval.class_used, VehicleClass::Car);
        assert_eq!(eval.warnings.len(), 1);
        assert_eq!(eval.slots.len(), 4);
        // Car air filter interval is 15000
        assert_eq!(
            eval.slot(&ServiceType::AirFilter).unwrap().state,
            DueState::DueSoon
        );
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let table = ServiceIntervalTable::default();
        let evaluator = AlertEvaluator::new(&table);
        let vehicle = van(9_800);
        let mut active = Vec::new();

        let first = evaluator.evaluate(&vehicle, &BTreeMap::new(), &active, &BTreeSet::new());
        assert!(!first.plan.is_empty());
        apply(&mut active, &first.plan);

        let second = evaluator.evaluate(&vehicle, &BTreeMap::new(), &active, &BTreeSet::new());
        assert!(second.plan.is_empty());
    }

    #[test]
    fn test_severity_change_replaces_alert() {
        let table = ServiceIntervalTable::default();
        let evaluator = AlertEvaluator::new(&table);
        let mut active = Vec::new();

        let due = evaluator.evaluate(&van(4_600), &BTreeMap::new(), &active, &BTreeSet::new());
        apply(&mut active, &due.plan);
        let old_id = active
            .iter()
            .find(|a| a.service_type == ServiceType::OilChange)
            .unwrap()
            .id
            .clone();

        let overdue = evaluator.evaluate(&van(5_100), &BTreeMap::new(), &active, &BTreeSet::new());
        let oil_change = overdue
            .plan
            .changes
            .iter()
            .find(|c| c.service_type == ServiceType::OilChange)
            .unwrap();
        assert_eq!(
            oil_change.action,
            SlotAction::Replace {
                alert_id: old_id,
                severity: Severity::High,
                message: "B 7001 VAN - Oil Change is OVERDUE (100 km past due)".to_string(),
            }
        );
    }

    #[test]
    fn test_same_severity_refreshes_message() {
        let table = ServiceIntervalTable::default();
        let evaluator = AlertEvaluator::new(&table);
        let mut active = Vec::new();
        let initial = evaluator.evaluate(&van(4_600), &BTreeMap::new(), &active, &BTreeSet::new());
        apply(&mut active, &initial.plan);

        let later = evaluator.evaluate(&van(4_700), &BTreeMap::new(), &active, &BTreeSet::new());
        assert!(later.plan.changes.iter().any(|c| matches!(
            &c.action,
            SlotAction::Refresh { message, .. } if message.ends_with("due in 300 km")
        )));
    }

    #[test]
    fn test_serviced_slot_closes_then_reopens_if_still_due() {
        let table = ServiceIntervalTable::default();
        let evaluator = AlertEvaluator::new(&table);
        let mut active = Vec::new();
        let initial = evaluator.evaluate(&van(12_000), &BTreeMap::new(), &active, &BTreeSet::new());
        apply(&mut active, &initial.plan);

        // Oil changed at 6000 but vehicle is now at 12000: still overdue
        let last = BTreeMap::from([(ServiceType::OilChange, 6_000)]);
        let eval = evaluator.evaluate(&van(12_000), &last, &active, &BTreeSet::from([ServiceType::OilChange]));
        let actions: Vec<_> = eval
            .plan
            .changes
            .iter()
            .filter(|c| c.service_type == ServiceType::OilChange)
            .map(|c| &c.action)
            .collect();
        assert_eq!(actions.len(), 2);
        assert!(matches!(
            actions[0],
            SlotAction::Close {
                resolution: Resolution::Serviced,
                ..
            }
        ));
        assert!(matches!(
            actions[1],
            SlotAction::Open {
                severity: Severity::High,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_active_alerts_are_collapsed() {
        let table = ServiceIntervalTable::default();
        let now = Utc::now();
        let active = vec![
            Alert::open("veh_van", ServiceType::OilChange, Severity::High, "a", now),
            Alert::open("veh_van", ServiceType::OilChange, Severity::High, "b", now),
        ];
        let eval = AlertEvaluator::new(&table).evaluate(&van(5_000), &BTreeMap::new(), &active, &BTreeSet::new());
        let closes = eval
            .plan
            .changes
            .iter()
            .filter(|c| {
                matches!(
                    c.action,
                    SlotAction::Close {
                        resolution: Resolution::Superseded,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(closes, 1);
    }
}
