//! Alert set: Active and Resolved alerts with one Active alert per slot

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use upkeep_domain::model::{Alert, Resolution};
use upkeep_domain::repository::AlertRepository;
use upkeep_domain::service::{ReconcilePlan, SlotAction, SlotChange};
use upkeep_types::{EntityKind, Error, Result, ServiceType, Severity};

use crate::{read, write};

#[derive(Debug, Default)]
pub struct AlertSet {
    alerts: RwLock<Vec<Alert>>,
}

impl AlertSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_alerts(alerts: Vec<Alert>) -> Self {
        Self {
            alerts: RwLock::new(alerts),
        }
    }

    /// Alerts in insertion order
    pub fn snapshot(&self) -> Result<Vec<Alert>> {
        Ok(read(&self.alerts)?.clone())
    }

    fn sorted_active(&self, keep: impl Fn(&Alert) -> bool) -> Result<Vec<Alert>> {
        let mut active: Vec<_> = read(&self.alerts)?
            .iter()
            .filter(|a| a.is_active() && keep(a))
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(active)
    }
}

impl AlertRepository for AlertSet {
    fn upsert_for_slot(
        &self,
        vehicle_id: &str,
        service_type: &ServiceType,
        severity: Severity,
        message: &str,
    ) -> Result<Alert> {
        let mut alerts = write(&self.alerts)?;
        let action = match alerts.iter().find(|a| a.occupies(vehicle_id, service_type)) {
            Some(current) if current.severity == severity => SlotAction::Refresh {
                alert_id: current.id.clone(),
                message: message.to_string(),
            },
            Some(current) => SlotAction::Replace {
                alert_id: current.id.clone(),
                severity,
                message: message.to_string(),
            },
            None => SlotAction::Open {
                severity,
                message: message.to_string(),
            },
        };
        let mut plan = ReconcilePlan::new(vehicle_id);
        plan.changes.push(SlotChange {
            service_type: service_type.clone(),
            action,
        });

        apply_locked(&mut alerts, &plan, Utc::now())?
            .into_iter()
            .rev()
            .find(|a| a.is_active())
            .ok_or_else(|| Error::Store("upsert left the slot without an active alert".to_string()))
    }

    fn resolve(&self, alert_id: &str) -> Result<Alert> {
        let mut alerts = write(&self.alerts)?;
        let alert = alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| Error::not_found(EntityKind::Alert, alert_id))?;
        if alert.resolve(Resolution::Acknowledged, Utc::now()) {
            tracing::info!(alert_id, vehicle_id = %alert.vehicle_id, "alert acknowledged");
        }
        Ok(alert.clone())
    }

    fn get(&self, alert_id: &str) -> Result<Alert> {
        read(&self.alerts)?
            .iter()
            .find(|a| a.id == alert_id)
            .cloned()
            .ok_or_else(|| Error::not_found(EntityKind::Alert, alert_id))
    }

    fn list_active(&self) -> Result<Vec<Alert>> {
        self.sorted_active(|_| true)
    }

    fn list_by_severity(&self, severity: Severity) -> Result<Vec<Alert>> {
        self.sorted_active(|a| a.severity == severity)
    }

    fn active_for_vehicle(&self, vehicle_id: &str) -> Result<Vec<Alert>> {
        self.sorted_active(|a| a.vehicle_id == vehicle_id)
    }

    fn all(&self) -> Result<Vec<Alert>> {
        let mut alerts = self.snapshot()?;
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    fn apply(&self, plan: &ReconcilePlan) -> Result<Vec<Alert>> {
        if plan.is_empty() {
            return Ok(Vec::new());
        }
        let mut alerts = write(&self.alerts)?;
        apply_locked(&mut alerts, plan, Utc::now())
    }
}

/// Check the whole plan against the current alerts before touching any.
///
/// Every referenced alert must be Active in the named slot, and an Open may
/// only target a slot that is empty at that point of the plan.
fn validate(alerts: &[Alert], plan: &ReconcilePlan) -> Result<()> {
    let mut active: HashMap<&str, &ServiceType> = alerts
        .iter()
        .filter(|a| a.is_active() && a.vehicle_id == plan.vehicle_id)
        .map(|a| (a.id.as_str(), &a.service_type))
        .collect();
    let mut occupancy: HashMap<&ServiceType, usize> = HashMap::new();
    for service_type in active.values() {
        *occupancy.entry(*service_type).or_default() += 1;
    }

    let stale = |alert_id: &str, service_type: &ServiceType| {
        Error::Store(format!(
            "stale reconcile plan for vehicle {}: alert {} is not active for {}",
            plan.vehicle_id,
            alert_id,
            service_type.key()
        ))
    };

    for change in &plan.changes {
        let service_type = &change.service_type;
        match &change.action {
            SlotAction::Open { .. } => {
                let count = occupancy.entry(service_type).or_default();
                if *count > 0 {
                    return Err(Error::Store(format!(
                        "vehicle {} already has an active {} alert",
                        plan.vehicle_id,
                        service_type.key()
                    )));
                }
                *count += 1;
            }
            SlotAction::Refresh { alert_id, .. } | SlotAction::Replace { alert_id, .. } => {
                if active.get(alert_id.as_str()) != Some(&service_type) {
                    return Err(stale(alert_id, service_type));
                }
            }
            SlotAction::Close { alert_id, .. } => {
                if active.remove(alert_id.as_str()) != Some(service_type) {
                    return Err(stale(alert_id, service_type));
                }
                if let Some(count) = occupancy.get_mut(service_type) {
                    *count = count.saturating_sub(1);
                }
            }
        }
    }
    Ok(())
}

fn apply_locked(
    alerts: &mut Vec<Alert>,
    plan: &ReconcilePlan,
    now: DateTime<Utc>,
) -> Result<Vec<Alert>> {
    validate(alerts, plan)?;

    let mut touched = Vec::with_capacity(plan.changes.len());
    for change in &plan.changes {
        match &change.action {
            SlotAction::Open { severity, message } => {
                let alert = Alert::open(
                    plan.vehicle_id.clone(),
                    change.service_type.clone(),
                    *severity,
                    message.clone(),
                    now,
                );
                tracing::info!(
                    vehicle_id = %plan.vehicle_id,
                    service = change.service_type.key(),
                    severity = %severity,
                    "alert raised"
                );
                touched.push(alert.clone());
                alerts.push(alert);
            }
            SlotAction::Refresh { alert_id, message } => {
                if let Some(alert) = alerts.iter_mut().find(|a| &a.id == alert_id) {
                    alert.message = message.clone();
                    touched.push(alert.clone());
                }
            }
            SlotAction::Replace {
                alert_id,
                severity,
                message,
            } => {
                if let Some(alert) = alerts.iter_mut().find(|a| &a.id == alert_id) {
                    alert.resolve(Resolution::Superseded, now);
                    touched.push(alert.clone());
                }
                let alert = Alert::open(
                    plan.vehicle_id.clone(),
                    change.service_type.clone(),
                    *severity,
                    message.clone(),
                    now,
                );
                tracing::info!(
                    vehicle_id = %plan.vehicle_id,
                    service = change.service_type.key(),
                    severity = %severity,
                    "alert severity changed"
                );
                touched.push(alert.clone());
                alerts.push(alert);
            }
            SlotAction::Close {
                alert_id,
                resolution,
            } => {
                if let Some(alert) = alerts.iter_mut().find(|a| &a.id == alert_id) {
                    alert.resolve(*resolution, now);
                    tracing::info!(
                        vehicle_id = %plan.vehicle_id,
                        service = change.service_type.key(),
                        resolution = resolution.label(),
                        "alert resolved"
                    );
                    touched.push(alert.clone());
                }
            }
        }
    }
    Ok(touched)
}
