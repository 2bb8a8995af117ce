//! Output formatting module

use serde::Serialize;
use upkeep_app::app::EvaluationReport;
use upkeep_domain::model::{Alert, FuelLog, ServiceRecord, Trip, Vehicle, WorkOrder};
use upkeep_domain::service::{DueState, Evaluation, SlotAction};
use upkeep_types::{OutputFormat, Result};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    println!("{}", content);
    Ok(())
}

fn short_date(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

pub fn output_vehicle(format: OutputFormat, vehicle: &Vehicle) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(vehicle);
    }
    println!("Registered {} ({})", vehicle.plate, vehicle.id);
    println!("Class:    {}", vehicle.class);
    println!("Mileage:  {} km", vehicle.current_mileage);
    Ok(())
}

pub fn output_vehicles(format: OutputFormat, vehicles: &[Vehicle]) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(vehicles);
    }
    if vehicles.is_empty() {
        println!("No vehicles registered.");
        return Ok(());
    }
    println!("{:<18} {:<16} {:<8} {:>10}", "ID", "Plate", "Class", "Mileage");
    println!("{}", "-".repeat(55));
    for v in vehicles {
        println!(
            "{:<18} {:<16} {:<8} {:>10}",
            v.id,
            v.plate,
            v.class.label(),
            v.current_mileage
        );
    }
    println!("\nTotal: {} vehicles", vehicles.len());
    Ok(())
}

#[derive(Serialize)]
struct VehicleDetail<'a> {
    vehicle: &'a Vehicle,
    evaluation: &'a Evaluation,
    active_alerts: &'a [Alert],
}

pub fn output_vehicle_detail(
    format: OutputFormat,
    vehicle: &Vehicle,
    evaluation: &Evaluation,
    active_alerts: &[Alert],
) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&VehicleDetail {
            vehicle,
            evaluation,
            active_alerts,
        });
    }

    println!("\n{} ({})", vehicle.plate, vehicle.id);
    println!("{}", "=".repeat(40));
    println!("Class:       {}", vehicle.class);
    if evaluation.class_used != vehicle.class {
        println!("Intervals:   {} (fallback)", evaluation.class_used);
    }
    println!("Mileage:     {} km", vehicle.current_mileage);
    println!("Registered:  {}", short_date(&vehicle.registered_at));

    print_slots(evaluation);

    if !active_alerts.is_empty() {
        println!("\nActive alerts:");
        for alert in active_alerts {
            println!("  [{}] {} ({})", alert.severity, alert.message, alert.id);
        }
    }
    Ok(())
}

fn print_slots(evaluation: &Evaluation) {
    println!(
        "\n{:<22} {:>9} {:>12} {:>10}  {}",
        "Service", "Interval", "Last done", "Due in", "State"
    );
    println!("{}", "-".repeat(66));
    for slot in &evaluation.slots {
        let state = match (slot.state, slot.severity) {
            (DueState::Ok, _) | (_, None) => slot.state.label().to_string(),
            (state, Some(severity)) => format!("{} ({})", state.label(), severity),
        };
        println!(
            "{:<22} {:>9} {:>12} {:>10}  {}",
            slot.service_type.label(),
            slot.interval_km,
            slot.last_service_km,
            slot.km_until_due,
            state
        );
    }
}

pub fn output_reports(
    format: OutputFormat,
    reports: &[EvaluationReport],
    verbose: bool,
) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(reports);
    }
    if reports.is_empty() {
        println!("No vehicles to evaluate.");
        return Ok(());
    }

    for report in reports {
        let evaluation = &report.evaluation;
        let due = evaluation
            .slots
            .iter()
            .filter(|s| s.state != DueState::Ok)
            .count();
        println!(
            "{} @ {} km: {} of {} services due, {} alert changes",
            evaluation.vehicle_id,
            evaluation.current_mileage,
            due,
            evaluation.slots.len(),
            evaluation.plan.changes.len()
        );
        for warning in &evaluation.warnings {
            println!("  warning: {}", warning);
        }
        for change in &evaluation.plan.changes {
            let what = match &change.action {
                SlotAction::Open { severity, message } => format!("raised [{}] {}", severity, message),
                SlotAction::Refresh { message, .. } => format!("updated {}", message),
                SlotAction::Replace {
                    severity, message, ..
                } => format!("now [{}] {}", severity, message),
                SlotAction::Close { resolution, .. } => {
                    format!("{} closed ({})", change.service_type.label(), resolution.label())
                }
            };
            println!("  {}", what);
        }
        if verbose {
            print_slots(evaluation);
            println!();
        }
    }
    Ok(())
}

pub fn output_alert(format: OutputFormat, alert: &Alert) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(alert);
    }
    let state = match alert.resolution {
        Some(resolution) => format!("resolved ({})", resolution.label()),
        None => "active".to_string(),
    };
    println!("Alert {}: {}", alert.id, state);
    println!("  [{}] {}", alert.severity, alert.message);
    Ok(())
}

pub fn output_alerts(format: OutputFormat, alerts: &[Alert]) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(alerts);
    }
    if alerts.is_empty() {
        println!("No alerts.");
        return Ok(());
    }
    println!(
        "{:<18} {:<9} {:<11} {:<12} {}",
        "ID", "Severity", "Status", "Raised", "Message"
    );
    println!("{}", "-".repeat(90));
    for alert in alerts {
        let status = match alert.resolution {
            Some(resolution) => resolution.label(),
            None => "active",
        };
        println!(
            "{:<18} {:<9} {:<11} {:<12} {}",
            alert.id,
            alert.severity.label(),
            status,
            short_date(&alert.created_at),
            alert.message
        );
    }
    println!("\nTotal: {} alerts", alerts.len());
    Ok(())
}

pub fn output_service_records(format: OutputFormat, records: &[ServiceRecord]) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(records);
    }
    if records.is_empty() {
        println!("No service records.");
        return Ok(());
    }
    println!(
        "{:<12} {:<22} {:>10}  {}",
        "Date", "Service", "Mileage", "Notes"
    );
    println!("{}", "-".repeat(66));
    for record in records {
        println!(
            "{:<12} {:<22} {:>10}  {}",
            short_date(&record.performed_at),
            record.service_type.label(),
            record.mileage_at_service,
            record.notes.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub fn output_trips(format: OutputFormat, trips: &[Trip]) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(trips);
    }
    if trips.is_empty() {
        println!("No trips.");
        return Ok(());
    }
    println!(
        "{:<18} {:<18} {:<12} {:>9} {:>9} {:>8}  {}",
        "ID", "Vehicle", "Status", "Start", "End", "Km", "Driver"
    );
    println!("{}", "-".repeat(90));
    for trip in trips {
        println!(
            "{:<18} {:<18} {:<12} {:>9} {:>9} {:>8}  {}",
            trip.id,
            trip.vehicle_id,
            trip.status.to_string(),
            trip.start_odometer,
            trip.end_odometer.map(|km| km.to_string()).unwrap_or_default(),
            trip.distance.map(|km| km.to_string()).unwrap_or_default(),
            trip.driver.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub fn output_fuel_logs(format: OutputFormat, logs: &[FuelLog]) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(logs);
    }
    if logs.is_empty() {
        println!("No fuel logs.");
        return Ok(());
    }
    println!(
        "{:<12} {:<18} {:>8} {:>10} {:>8} {:>10}",
        "Date", "Vehicle", "Liters", "Cost", "Per L", "Odometer"
    );
    println!("{}", "-".repeat(70));
    let mut liters = 0.0;
    let mut cost = 0.0;
    for log in logs {
        liters += log.liters;
        cost += log.cost;
        println!(
            "{:<12} {:<18} {:>8.1} {:>10.2} {:>8.2} {:>10}",
            short_date(&log.logged_at),
            log.vehicle_id,
            log.liters,
            log.cost,
            log.cost_per_liter(),
            log.odometer.map(|km| km.to_string()).unwrap_or_default()
        );
    }
    println!("\nTotal: {:.1} L, {:.2}", liters, cost);
    Ok(())
}

pub fn output_work_orders(format: OutputFormat, orders: &[WorkOrder]) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(orders);
    }
    if orders.is_empty() {
        println!("No work orders.");
        return Ok(());
    }
    println!(
        "{:<18} {:<18} {:<12} {:>9}  {}",
        "ID", "Vehicle", "Status", "Cost", "Description"
    );
    println!("{}", "-".repeat(80));
    for order in orders {
        println!(
            "{:<18} {:<18} {:<12} {:>9.2}  {}",
            order.id,
            order.vehicle_id,
            order.status.to_string(),
            order.total_cost,
            order.description
        );
    }
    Ok(())
}

/// Print any serializable result: JSON, or a one-line confirmation
pub fn output_done<T: Serialize>(format: OutputFormat, value: &T, message: &str) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(value);
    }
    println!("{}", message);
    Ok(())
}
