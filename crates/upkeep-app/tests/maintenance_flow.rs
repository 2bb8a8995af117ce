//! End-to-end flows through the maintenance service

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use chrono::Utc;
use tempfile::tempdir;
use upkeep_app::{FleetWorkspace, MaintenanceService, Repositories};
use upkeep_domain::model::{Resolution, ServiceIntervalTable, WorkOrderStatus};
use upkeep_domain::service::DueState;
use upkeep_infra::service_csv::parse_service_history;
use upkeep_types::{EntityKind, Error, ServiceType, Severity, VehicleClass};

fn service() -> MaintenanceService {
    MaintenanceService::new(Repositories::in_memory(), ServiceIntervalTable::default())
}

fn assert_one_active_per_slot(svc: &MaintenanceService) {
    let active = svc.repositories().alerts.list_active().unwrap();
    let mut seen = HashSet::new();
    for alert in &active {
        let slot = (alert.vehicle_id.clone(), alert.service_type.clone());
        assert!(seen.insert(slot.clone()), "duplicate active alert for {:?}", slot);
    }
}

#[test]
fn van_at_interval_is_overdue_high() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 0).unwrap();

    let report = svc.on_mileage_changed(&van.id, 5_000).unwrap();
    let oil = report.evaluation.slot(&ServiceType::OilChange).unwrap();
    assert_eq!(oil.state, DueState::Overdue);
    assert_eq!(oil.severity, Some(Severity::High));

    let active = svc.repositories().alerts.active_for_vehicle(&van.id).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].service_type, ServiceType::OilChange);
    assert_eq!(active[0].message, "B 7001 VAN - Oil Change is OVERDUE (0 km past due)");
}

#[test]
fn van_inside_warning_window_is_due_soon() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 0).unwrap();

    let report = svc.on_mileage_changed(&van.id, 4_600).unwrap();
    let oil = report.evaluation.slot(&ServiceType::OilChange).unwrap();
    assert_eq!(oil.state, DueState::DueSoon);
    assert_eq!(oil.km_until_due, 400);

    let alerts = svc.repositories().alerts.list_by_severity(Severity::Medium).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].message, "B 7001 VAN - Oil Change due in 400 km");
}

#[test]
fn service_record_clears_alert() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 0).unwrap();
    svc.on_mileage_changed(&van.id, 4_600).unwrap();
    let before = svc.repositories().alerts.active_for_vehicle(&van.id).unwrap();
    assert_eq!(before.len(), 1);

    let outcome = svc
        .on_service_completed(&van.id, ServiceType::OilChange, 4_600, Utc::now())
        .unwrap();
    let oil = outcome.report.evaluation.slot(&ServiceType::OilChange).unwrap();
    assert_eq!(oil.state, DueState::Ok);

    let old = svc.repositories().alerts.get(&before[0].id).unwrap();
    assert!(!old.is_active());
    assert_eq!(old.resolution, Some(Resolution::Serviced));
    assert!(svc
        .repositories()
        .alerts
        .active_for_vehicle(&van.id)
        .unwrap()
        .is_empty());
}

#[test]
fn manually_resolved_alert_reappears_while_due() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 0).unwrap();
    svc.on_mileage_changed(&van.id, 5_200).unwrap();
    let first = svc.repositories().alerts.active_for_vehicle(&van.id).unwrap();
    assert_eq!(first.len(), 1);

    let resolved = svc.resolve_alert(&first[0].id).unwrap();
    assert_eq!(resolved.resolution, Some(Resolution::Acknowledged));
    // resolving again is a no-op
    let again = svc.resolve_alert(&first[0].id).unwrap();
    assert_eq!(again.resolved_at, resolved.resolved_at);

    svc.evaluate(&van.id).unwrap();
    let second = svc.repositories().alerts.active_for_vehicle(&van.id).unwrap();
    assert_eq!(second.len(), 1);
    assert_ne!(second[0].id, first[0].id);
    assert_eq!(second[0].severity, Severity::High);
}

#[test]
fn lower_mileage_is_rejected_without_changes() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 0).unwrap();
    svc.on_mileage_changed(&van.id, 4_600).unwrap();
    let alerts_before = svc.repositories().alerts.all().unwrap();

    let err = svc.on_mileage_changed(&van.id, 4_000).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidMileage {
            current: 4_600,
            attempted: 4_000,
            ..
        }
    ));
    assert_eq!(svc.repositories().vehicles.get_mileage(&van.id).unwrap(), 4_600);
    assert_eq!(svc.repositories().alerts.all().unwrap(), alerts_before);
}

#[test]
fn evaluate_is_idempotent() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 0).unwrap();
    svc.on_mileage_changed(&van.id, 11_900).unwrap();
    let first = svc.repositories().alerts.all().unwrap();

    let report = svc.evaluate(&van.id).unwrap();
    assert!(report.evaluation.plan.is_empty());
    assert!(report.applied.is_empty());
    assert_eq!(svc.repositories().alerts.all().unwrap(), first);
}

#[test]
fn severity_change_replaces_alert() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 0).unwrap();
    svc.on_mileage_changed(&van.id, 4_700).unwrap();
    let due_soon = svc.repositories().alerts.active_for_vehicle(&van.id).unwrap();
    assert_eq!(due_soon[0].severity, Severity::Medium);

    svc.on_mileage_changed(&van.id, 5_100).unwrap();
    let overdue = svc.repositories().alerts.active_for_vehicle(&van.id).unwrap();
    let oil: Vec<_> = overdue
        .iter()
        .filter(|a| a.service_type == ServiceType::OilChange)
        .collect();
    assert_eq!(oil.len(), 1);
    assert_eq!(oil[0].severity, Severity::High);

    let old = svc.repositories().alerts.get(&due_soon[0].id).unwrap();
    assert_eq!(old.resolution, Some(Resolution::Superseded));
    assert_one_active_per_slot(&svc);
}

#[test]
fn major_service_escalates_to_critical() {
    let svc = service();
    let car = svc.register_vehicle("B 1 CAR", VehicleClass::Car, 0).unwrap();
    let report = svc.on_mileage_changed(&car.id, 30_000).unwrap();
    let major = report.evaluation.slot(&ServiceType::MajorService).unwrap();
    assert_eq!(major.state, DueState::Overdue);
    assert_eq!(major.severity, Some(Severity::Critical));
    let critical = svc.repositories().alerts.list_by_severity(Severity::Critical).unwrap();
    assert_eq!(critical.len(), 1);
    // every other slot is overdue too
    assert_eq!(svc.repositories().alerts.list_active().unwrap()[0].severity, Severity::Critical);
}

#[test]
fn unrecognized_class_uses_default_table_with_warning() {
    let svc = service();
    let tractor = svc
        .register_vehicle("TR 9", VehicleClass::parse("Tractor"), 0)
        .unwrap();
    let report = svc.on_mileage_changed(&tractor.id, 15_000).unwrap();
    assert_eq!(report.evaluation.warnings.len(), 1);
    assert_eq!(report.evaluation.class_used, VehicleClass::Car);
    let air = report.evaluation.slot(&ServiceType::AirFilter).unwrap();
    assert_eq!(air.interval_km, 15_000);
    assert_eq!(air.state, DueState::Overdue);
}

#[test]
fn long_sequence_keeps_one_active_alert_per_slot() {
    let svc = service();
    let bus = svc.register_vehicle("BUS 12", VehicleClass::Bus, 0).unwrap();
    for km in (0..=45_000).step_by(1_750) {
        svc.on_mileage_changed(&bus.id, km).unwrap();
        if km % 7_000 == 0 {
            svc.on_service_completed(&bus.id, ServiceType::OilChange, km, Utc::now())
                .unwrap();
        }
        if km % 10_500 == 0 {
            let active = svc.repositories().alerts.active_for_vehicle(&bus.id).unwrap();
            if let Some(alert) = active.first() {
                svc.resolve_alert(&alert.id).unwrap();
            }
        }
        svc.evaluate(&bus.id).unwrap();
        assert_one_active_per_slot(&svc);
    }
}

#[test]
fn trip_end_feeds_mileage() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 4_000).unwrap();
    let trip = svc
        .start_trip(&van.id, Some("Sari".to_string()), Some("Depot run".to_string()))
        .unwrap();
    assert_eq!(trip.start_odometer, 4_000);

    let outcome = svc.end_trip(&trip.id, 4_650).unwrap();
    assert_eq!(outcome.trip.distance, Some(650));
    assert_eq!(svc.repositories().vehicles.get_mileage(&van.id).unwrap(), 4_650);
    let oil = outcome.report.evaluation.slot(&ServiceType::OilChange).unwrap();
    assert_eq!(oil.state, DueState::DueSoon);

    let err = svc.end_trip(&trip.id, 4_700).unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[test]
fn trip_end_below_current_mileage_is_rejected() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 1_000).unwrap();
    let trip = svc.start_trip(&van.id, None, None).unwrap();
    svc.on_mileage_changed(&van.id, 1_500).unwrap();

    let err = svc.end_trip(&trip.id, 1_200).unwrap_err();
    assert!(matches!(err, Error::InvalidMileage { .. }));
    let stored = svc.repositories().trips.get(&trip.id).unwrap();
    assert!(stored.end_odometer.is_none());
}

#[test]
fn fuel_log_with_lower_odometer_is_not_appended() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 8_000).unwrap();

    let err = svc
        .record_fuel_log(&van.id, 40.0, 62.5, Some(7_900))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidMileage { .. }));
    assert!(svc.repositories().fuel.list(Some(&van.id)).unwrap().is_empty());

    let outcome = svc.record_fuel_log(&van.id, 40.0, 62.5, Some(9_800)).unwrap();
    assert!(outcome.report.is_some());
    assert_eq!(svc.repositories().vehicles.get_mileage(&van.id).unwrap(), 9_800);
    assert_eq!(svc.repositories().fuel.list(None).unwrap().len(), 1);
}

#[test]
fn completed_work_order_appends_linked_record() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 0).unwrap();
    svc.on_mileage_changed(&van.id, 10_200).unwrap();

    let order = svc
        .open_work_order(&van.id, "Brake Service", None, Some(350.0))
        .unwrap();
    assert_eq!(order.service_type, Some(ServiceType::BrakeCheck));

    let progress = svc
        .update_work_order_status(&order.id, WorkOrderStatus::InProgress)
        .unwrap();
    assert!(progress.service.is_none());

    let done = svc
        .update_work_order_status(&order.id, WorkOrderStatus::Completed)
        .unwrap();
    let service = done.service.unwrap();
    assert_eq!(service.record.work_order_id.as_deref(), Some(order.id.as_str()));
    assert_eq!(service.record.mileage_at_service, 10_200);
    let brake = service.report.evaluation.slot(&ServiceType::BrakeCheck).unwrap();
    assert_eq!(brake.state, DueState::Ok);

    let err = svc
        .update_work_order_status(&order.id, WorkOrderStatus::Cancelled)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[test]
fn unknown_ids_are_not_found() {
    let svc = service();
    assert!(svc
        .evaluate("veh_missing")
        .unwrap_err()
        .is_not_found(EntityKind::Vehicle));
    assert!(svc
        .resolve_alert("alt_missing")
        .unwrap_err()
        .is_not_found(EntityKind::Alert));
    assert!(svc
        .end_trip("trip_missing", 10)
        .unwrap_err()
        .is_not_found(EntityKind::Trip));
    assert!(svc
        .update_work_order_status("wo_missing", WorkOrderStatus::Completed)
        .unwrap_err()
        .is_not_found(EntityKind::WorkOrder));
}

#[test]
fn csv_import_rejects_unknown_vehicle_before_writing() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 6_000).unwrap();
    let csv = "vehicle,service_type,mileage,date\n\
               B 7001 VAN,oil_change,5000,2024-01-01\n\
               GHOST 1,oil_change,5000,2024-01-01\n";
    let rows = parse_service_history(csv.as_bytes()).unwrap();

    let err = svc.import_service_history(rows).unwrap_err();
    assert!(matches!(err, Error::Import(ref msg) if msg.contains("row 3")));
    assert!(svc.repositories().ledger.for_vehicle(&van.id).unwrap().is_empty());
}

#[test]
fn csv_import_appends_and_evaluates() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 0).unwrap();
    svc.on_mileage_changed(&van.id, 5_300).unwrap();
    assert_eq!(svc.repositories().alerts.list_active().unwrap().len(), 1);

    let csv = format!(
        "vehicle,service_type,mileage,date\n{},Oil Change,5000,2024-01-01\n",
        van.id
    );
    let rows = parse_service_history(csv.as_bytes()).unwrap();
    let summary = svc.import_service_history(rows).unwrap();
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.reports.len(), 1);
    assert!(svc.repositories().alerts.list_active().unwrap().is_empty());
}

#[test]
fn csv_import_closes_alert_as_serviced_like_a_recorded_service() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 0).unwrap();
    svc.on_mileage_changed(&van.id, 12_000).unwrap();
    let old = svc
        .repositories()
        .alerts
        .active_for_vehicle(&van.id)
        .unwrap()
        .into_iter()
        .find(|a| a.service_type == ServiceType::OilChange)
        .unwrap();

    // oil at 6000 with the van at 12000 leaves the slot overdue
    let csv = "plate,service,odometer,date\n\
               B 7001 VAN,oil_change,6000,2024-02-01\n\
               B 7001 VAN,brake_check,1000,2024-02-01\n";
    let rows = parse_service_history(csv.as_bytes()).unwrap();
    svc.import_service_history(rows).unwrap();

    let alerts = &svc.repositories().alerts;
    assert_eq!(
        alerts.get(&old.id).unwrap().resolution,
        Some(Resolution::Serviced)
    );
    let reopened = alerts
        .active_for_vehicle(&van.id)
        .unwrap()
        .into_iter()
        .find(|a| a.service_type == ServiceType::OilChange)
        .unwrap();
    assert_ne!(reopened.id, old.id);
    assert_eq!(reopened.severity, Severity::High);
    assert_one_active_per_slot(&svc);
}

#[test]
fn csv_import_of_back_dated_row_does_not_service_slot() {
    let svc = service();
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 0).unwrap();
    svc.on_service_completed(&van.id, ServiceType::OilChange, 6_000, Utc::now())
        .unwrap();
    svc.on_mileage_changed(&van.id, 11_000).unwrap();
    let old = svc
        .repositories()
        .alerts
        .active_for_vehicle(&van.id)
        .unwrap()
        .into_iter()
        .find(|a| a.service_type == ServiceType::OilChange)
        .unwrap();

    let csv = "vehicle,service_type,mileage,date\nB 7001 VAN,oil_change,3000,2023-06-01\n";
    svc.import_service_history(parse_service_history(csv.as_bytes()).unwrap())
        .unwrap();

    let alert = svc.repositories().alerts.get(&old.id).unwrap();
    assert_eq!(alert.resolution, None);
}

#[test]
fn vehicles_evaluate_in_parallel() {
    let svc = Arc::new(service());
    let ids: Vec<String> = (0..8)
        .map(|n| {
            svc.register_vehicle(&format!("B {} VAN", n), VehicleClass::Van, 0)
                .unwrap()
                .id
        })
        .collect();

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let svc = Arc::clone(&svc);
            thread::spawn(move || {
                for km in (500..=12_000).step_by(500) {
                    svc.on_mileage_changed(&id, km).unwrap();
                    svc.evaluate(&id).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_one_active_per_slot(&svc);
    for id in &ids {
        assert_eq!(svc.repositories().vehicles.get_mileage(id).unwrap(), 12_000);
        let active = svc.repositories().alerts.active_for_vehicle(id).unwrap();
        // oil and brake overdue, air filter at 12_000 overdue, major not yet
        assert_eq!(active.len(), 3);
    }
}

#[test]
fn same_vehicle_from_many_threads_stays_consistent() {
    let svc = Arc::new(service());
    let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 0).unwrap();
    svc.on_mileage_changed(&van.id, 5_500).unwrap();

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let svc = Arc::clone(&svc);
            let id = van.id.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    svc.evaluate(&id).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_one_active_per_slot(&svc);
    assert_eq!(svc.repositories().alerts.all().unwrap().len(), 1);
}

#[test]
fn workspace_round_trips_through_disk() {
    let dir = tempdir().unwrap();
    let (van_id, alert_id) = {
        let workspace = FleetWorkspace::open_at(dir.path().to_path_buf()).unwrap();
        let svc = MaintenanceService::new(workspace.repositories(), ServiceIntervalTable::default());
        let van = svc.register_vehicle("B 7001 VAN", VehicleClass::Van, 0).unwrap();
        svc.on_mileage_changed(&van.id, 5_100).unwrap();
        svc.record_fuel_log(&van.id, 35.0, 55.0, None).unwrap();
        let alert = svc.repositories().alerts.list_active().unwrap().remove(0);
        workspace.save().unwrap();
        (van.id, alert.id)
    };

    let workspace = FleetWorkspace::open_at(dir.path().to_path_buf()).unwrap();
    let svc = MaintenanceService::new(workspace.repositories(), ServiceIntervalTable::default());
    assert_eq!(svc.repositories().vehicles.get_mileage(&van_id).unwrap(), 5_100);
    assert_eq!(svc.repositories().fuel.list(Some(&van_id)).unwrap().len(), 1);

    // reloaded alert is reconciled in place, not duplicated
    let report = svc.evaluate(&van_id).unwrap();
    assert!(report.applied.is_empty());
    let active = svc.repositories().alerts.active_for_vehicle(&van_id).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, alert_id);
}
