//! Maintenance Service - service-due alerting for the fleet
//!
//! Every write that can move a vehicle's due state (odometer readings from
//! any source, service records, completed work orders) is followed by an
//! evaluation of that vehicle, and the resulting plan is applied to the alert
//! set. Operations on one vehicle are serialized through a per-vehicle lock;
//! different vehicles proceed in parallel.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use upkeep_domain::model::{
    Alert, FuelLog, ServiceIntervalTable, ServiceRecord, Trip, TripStatus, Vehicle, WorkOrder,
    WorkOrderStatus,
};
use upkeep_domain::service::{AlertEvaluator, Evaluation};
use upkeep_infra::service_csv::ServiceImportRow;
use upkeep_types::{EntityKind, Error, Result, ServiceType, VehicleClass};

use crate::repository::Repositories;

/// Evaluation of one vehicle together with the alerts it touched
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub evaluation: Evaluation,
    /// Alerts opened, refreshed or resolved by this evaluation
    pub applied: Vec<Alert>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceOutcome {
    pub record: ServiceRecord,
    pub report: EvaluationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripOutcome {
    pub trip: Trip,
    pub report: EvaluationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct FuelOutcome {
    pub log: FuelLog,
    /// Present when the log carried an odometer reading
    pub report: Option<EvaluationReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkOrderOutcome {
    pub order: WorkOrder,
    /// Ledger record appended when the order was completed
    pub service: Option<ServiceOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub reports: Vec<EvaluationReport>,
}

/// Lock table: one mutex per vehicle id
#[derive(Default)]
struct VehicleLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl VehicleLocks {
    fn lock_for(&self, vehicle_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut table = self
            .table
            .lock()
            .map_err(|_| Error::Store("vehicle lock table poisoned".to_string()))?;
        Ok(table.entry(vehicle_id.to_string()).or_default().clone())
    }
}

fn acquire(lock: &Mutex<()>) -> Result<MutexGuard<'_, ()>> {
    lock.lock()
        .map_err(|_| Error::Store("vehicle lock poisoned".to_string()))
}

pub struct MaintenanceService {
    repos: Repositories,
    table: Arc<ServiceIntervalTable>,
    locks: VehicleLocks,
    registration: Mutex<()>,
}

impl MaintenanceService {
    pub fn new(repos: Repositories, table: ServiceIntervalTable) -> Self {
        Self {
            repos,
            table: Arc::new(table),
            locks: VehicleLocks::default(),
            registration: Mutex::new(()),
        }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Run `f` while holding the lock of `vehicle_id`
    fn with_vehicle<T>(&self, vehicle_id: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.locks.lock_for(vehicle_id)?;
        let _guard = acquire(&lock)?;
        f()
    }

    /// Look a vehicle up by id, falling back to its plate
    pub fn resolve_vehicle(&self, key: &str) -> Result<Vehicle> {
        match self.repos.vehicles.get(key) {
            Ok(vehicle) => Ok(vehicle),
            Err(err) if err.is_not_found(EntityKind::Vehicle) => self
                .repos
                .vehicles
                .find_by_plate(key)?
                .ok_or_else(|| Error::not_found(EntityKind::Vehicle, key)),
            Err(err) => Err(err),
        }
    }

    /// Add a vehicle to the fleet. Plates are unique.
    pub fn register_vehicle(
        &self,
        plate: &str,
        class: VehicleClass,
        mileage: u64,
    ) -> Result<Vehicle> {
        let plate = plate.trim();
        if plate.is_empty() {
            return Err(Error::InvalidInput("plate must not be empty".to_string()));
        }

        let _guard = acquire(&self.registration)?;
        if let Some(existing) = self.repos.vehicles.find_by_plate(plate)? {
            return Err(Error::InvalidInput(format!(
                "plate {} is already registered as {}",
                plate, existing.id
            )));
        }
        if !class.is_recognized() {
            tracing::warn!(
                plate,
                class = %class,
                fallback = %self.table.default_class,
                "registering vehicle with unrecognized class"
            );
        }

        let vehicle = Vehicle::new(plate, class).with_mileage(mileage);
        self.repos.vehicles.insert(vehicle.clone())?;
        tracing::info!(vehicle_id = %vehicle.id, plate, mileage, "vehicle registered");
        Ok(vehicle)
    }

    /// Record a new odometer reading and re-evaluate the vehicle
    pub fn on_mileage_changed(&self, vehicle_id: &str, new_mileage: u64) -> Result<EvaluationReport> {
        self.with_vehicle(vehicle_id, || {
            self.repos.vehicles.update_mileage(vehicle_id, new_mileage)?;
            tracing::debug!(vehicle_id, mileage = new_mileage, "mileage updated");
            self.evaluate_locked(vehicle_id, &BTreeSet::new())
        })
    }

    /// Append a service record and re-evaluate the vehicle
    pub fn on_service_completed(
        &self,
        vehicle_id: &str,
        service_type: ServiceType,
        mileage: u64,
        performed_at: DateTime<Utc>,
    ) -> Result<ServiceOutcome> {
        let record = ServiceRecord::new(vehicle_id, service_type, mileage, performed_at);
        self.record_service(record)
    }

    /// Append a fully built service record (notes, work order link) and
    /// re-evaluate the vehicle
    pub fn record_service(&self, record: ServiceRecord) -> Result<ServiceOutcome> {
        let vehicle_id = record.vehicle_id.clone();
        self.with_vehicle(&vehicle_id, || self.record_service_locked(record))
    }

    fn record_service_locked(&self, record: ServiceRecord) -> Result<ServiceOutcome> {
        // vehicle must exist before anything is appended
        self.repos.vehicles.get(&record.vehicle_id)?;

        let previous = self
            .repos
            .ledger
            .last_service_mileage(&record.vehicle_id, &record.service_type)?;
        let qualifying = record.mileage_at_service >= previous;
        self.repos.ledger.append(record.clone())?;
        tracing::info!(
            vehicle_id = %record.vehicle_id,
            service = record.service_type.key(),
            mileage = record.mileage_at_service,
            qualifying,
            "service recorded"
        );

        let mut serviced = BTreeSet::new();
        if qualifying {
            serviced.insert(record.service_type.clone());
        }
        let report = self.evaluate_locked(&record.vehicle_id, &serviced)?;
        Ok(ServiceOutcome { record, report })
    }

    /// Re-evaluate one vehicle and reconcile its alerts
    pub fn evaluate(&self, vehicle_id: &str) -> Result<EvaluationReport> {
        self.with_vehicle(vehicle_id, || self.evaluate_locked(vehicle_id, &BTreeSet::new()))
    }

    /// Re-evaluate every vehicle, each under its own lock
    pub fn evaluate_all(&self) -> Result<Vec<EvaluationReport>> {
        let vehicles = self.repos.vehicles.list()?;
        let mut reports = Vec::with_capacity(vehicles.len());
        for vehicle in vehicles {
            reports.push(self.evaluate(&vehicle.id)?);
        }
        Ok(reports)
    }

    /// Due state of every slot without touching the alert set
    pub fn status(&self, vehicle_id: &str) -> Result<Evaluation> {
        self.with_vehicle(vehicle_id, || self.compute_locked(vehicle_id, &BTreeSet::new()))
    }

    fn compute_locked(
        &self,
        vehicle_id: &str,
        serviced: &BTreeSet<ServiceType>,
    ) -> Result<Evaluation> {
        let vehicle = self.repos.vehicles.get(vehicle_id)?;

        let mut last_service: BTreeMap<ServiceType, u64> = BTreeMap::new();
        for record in self.repos.ledger.for_vehicle(vehicle_id)? {
            let entry = last_service.entry(record.service_type).or_insert(0);
            *entry = (*entry).max(record.mileage_at_service);
        }
        let active = self.repos.alerts.active_for_vehicle(vehicle_id)?;

        Ok(AlertEvaluator::new(&self.table).evaluate(&vehicle, &last_service, &active, serviced))
    }

    fn evaluate_locked(
        &self,
        vehicle_id: &str,
        serviced: &BTreeSet<ServiceType>,
    ) -> Result<EvaluationReport> {
        let evaluation = self.compute_locked(vehicle_id, serviced)?;
        for warning in &evaluation.warnings {
            tracing::warn!("{}", warning);
        }

        let applied = self.repos.alerts.apply(&evaluation.plan)?;
        tracing::debug!(
            vehicle_id,
            mileage = evaluation.current_mileage,
            changes = evaluation.plan.changes.len(),
            "vehicle evaluated"
        );
        Ok(EvaluationReport {
            evaluation,
            applied,
        })
    }

    /// Mark an alert resolved. A slot still due is raised again on the next
    /// evaluation.
    pub fn resolve_alert(&self, alert_id: &str) -> Result<Alert> {
        let alert = self.repos.alerts.get(alert_id)?;
        self.with_vehicle(&alert.vehicle_id, || self.repos.alerts.resolve(alert_id))
    }

    /// Start a trip at the vehicle's current odometer reading
    pub fn start_trip(
        &self,
        vehicle_id: &str,
        driver: Option<String>,
        purpose: Option<String>,
    ) -> Result<Trip> {
        self.with_vehicle(vehicle_id, || {
            let vehicle = self.repos.vehicles.get(vehicle_id)?;
            let open = self
                .repos
                .trips
                .list(Some(vehicle_id))?
                .into_iter()
                .find(|t| t.status == TripStatus::InProgress);
            if let Some(open) = open {
                return Err(Error::InvalidInput(format!(
                    "vehicle {} already has trip {} in progress",
                    vehicle.plate, open.id
                )));
            }

            let mut trip = Trip::start(vehicle_id, vehicle.current_mileage);
            if let Some(driver) = driver {
                trip = trip.with_driver(driver);
            }
            if let Some(purpose) = purpose {
                trip = trip.with_purpose(purpose);
            }
            self.repos.trips.insert(trip.clone())?;
            tracing::info!(trip_id = %trip.id, vehicle_id, start = trip.start_odometer, "trip started");
            Ok(trip)
        })
    }

    /// Close a trip; its end odometer becomes the vehicle's mileage
    pub fn end_trip(&self, trip_id: &str, end_odometer: u64) -> Result<TripOutcome> {
        let vehicle_id = self.repos.trips.get(trip_id)?.vehicle_id;
        self.with_vehicle(&vehicle_id, || {
            let mut trip = self.repos.trips.get(trip_id)?;
            self.repos.vehicles.get(&vehicle_id)?.check_mileage(end_odometer)?;
            let distance = trip.complete(end_odometer, Utc::now())?;

            self.repos.vehicles.update_mileage(&vehicle_id, end_odometer)?;
            self.repos.trips.update(trip.clone())?;
            tracing::info!(trip_id, vehicle_id = %vehicle_id, distance, "trip completed");

            let report = self.evaluate_locked(&vehicle_id, &BTreeSet::new())?;
            Ok(TripOutcome { trip, report })
        })
    }

    /// Append a fuel log. An odometer reading on the log updates the
    /// vehicle's mileage first; a lower reading rejects the whole log.
    pub fn record_fuel_log(
        &self,
        vehicle_id: &str,
        liters: f64,
        cost: f64,
        odometer: Option<u64>,
    ) -> Result<FuelOutcome> {
        if !liters.is_finite() || liters <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "liters must be positive, got {}",
                liters
            )));
        }
        if !cost.is_finite() || cost < 0.0 {
            return Err(Error::InvalidInput(format!(
                "cost must not be negative, got {}",
                cost
            )));
        }

        self.with_vehicle(vehicle_id, || {
            self.repos.vehicles.get(vehicle_id)?;
            let mut log = FuelLog::new(vehicle_id, liters, cost);
            if let Some(reading) = odometer {
                self.repos.vehicles.update_mileage(vehicle_id, reading)?;
                log = log.with_odometer(reading);
            }
            self.repos.fuel.append(log.clone())?;
            tracing::info!(vehicle_id, liters, cost, "fuel logged");

            let report = match odometer {
                Some(_) => Some(self.evaluate_locked(vehicle_id, &BTreeSet::new())?),
                None => None,
            };
            Ok(FuelOutcome { log, report })
        })
    }

    pub fn open_work_order(
        &self,
        vehicle_id: &str,
        description: &str,
        service_type: Option<ServiceType>,
        total_cost: Option<f64>,
    ) -> Result<WorkOrder> {
        if description.trim().is_empty() {
            return Err(Error::InvalidInput(
                "work order description must not be empty".to_string(),
            ));
        }
        self.with_vehicle(vehicle_id, || {
            self.repos.vehicles.get(vehicle_id)?;
            let mut order = WorkOrder::new(vehicle_id, description.trim(), service_type);
            if let Some(cost) = total_cost {
                order = order.with_cost(cost);
            }
            self.repos.work_orders.insert(order.clone())?;
            tracing::info!(work_order_id = %order.id, vehicle_id, "work order opened");
            Ok(order)
        })
    }

    /// Move a work order along its lifecycle. Completing an order with a
    /// known service type appends a ledger record at the vehicle's current
    /// mileage.
    pub fn update_work_order_status(
        &self,
        order_id: &str,
        status: WorkOrderStatus,
    ) -> Result<WorkOrderOutcome> {
        let vehicle_id = self.repos.work_orders.get(order_id)?.vehicle_id;
        self.with_vehicle(&vehicle_id, || {
            let mut order = self.repos.work_orders.get(order_id)?;
            let now = Utc::now();
            let completed = order.transition(status, now)?;
            self.repos.work_orders.update(order.clone())?;
            tracing::info!(work_order_id = order_id, status = %order.status, "work order updated");

            let service = match (completed, order.service_type.clone()) {
                (true, Some(service_type)) => {
                    let mileage = self.repos.vehicles.get_mileage(&vehicle_id)?;
                    let record = ServiceRecord::new(&vehicle_id, service_type, mileage, now)
                        .with_work_order(order_id)
                        .with_notes(order.description.clone());
                    Some(self.record_service_locked(record)?)
                }
                _ => None,
            };
            Ok(WorkOrderOutcome { order, service })
        })
    }

    /// Append imported history rows and evaluate each touched vehicle once.
    ///
    /// Every row's vehicle is resolved before anything is written, so an
    /// unknown vehicle rejects the whole import.
    pub fn import_service_history(&self, rows: Vec<ServiceImportRow>) -> Result<ImportSummary> {
        let mut by_vehicle: BTreeMap<String, Vec<ServiceRecord>> = BTreeMap::new();
        for row in rows {
            let vehicle = self.resolve_vehicle(&row.vehicle).map_err(|err| {
                if err.is_not_found(EntityKind::Vehicle) {
                    Error::Import(format!("row {}: unknown vehicle '{}'", row.row, row.vehicle))
                } else {
                    err
                }
            })?;
            let mut record =
                ServiceRecord::new(&vehicle.id, row.service_type, row.mileage, row.performed_at);
            if let Some(notes) = row.notes {
                record = record.with_notes(notes);
            }
            by_vehicle.entry(vehicle.id).or_default().push(record);
        }

        let mut imported = 0;
        let mut reports = Vec::with_capacity(by_vehicle.len());
        for (vehicle_id, records) in by_vehicle {
            let report = self.with_vehicle(&vehicle_id, || {
                // qualifying is judged against the history before this import
                let mut previous = BTreeMap::new();
                for record in &records {
                    if !previous.contains_key(&record.service_type) {
                        let km = self
                            .repos
                            .ledger
                            .last_service_mileage(&vehicle_id, &record.service_type)?;
                        previous.insert(record.service_type.clone(), km);
                    }
                }

                let mut serviced = BTreeSet::new();
                for record in records {
                    let last = previous.get(&record.service_type).copied().unwrap_or(0);
                    if record.mileage_at_service >= last {
                        serviced.insert(record.service_type.clone());
                    }
                    self.repos.ledger.append(record)?;
                    imported += 1;
                }
                self.evaluate_locked(&vehicle_id, &serviced)
            })?;
            reports.push(report);
        }
        tracing::info!(imported, vehicles = reports.len(), "service history imported");
        Ok(ImportSummary { imported, reports })
    }
}
