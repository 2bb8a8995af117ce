//! Command handlers

use chrono::Utc;
use upkeep_app::{Config, FleetWorkspace, MaintenanceService};
use upkeep_domain::model::{Alert, ServiceRecord};
use upkeep_infra::interval_table_loader;
use upkeep_infra::service_csv::{load_service_history, parse_date};
use upkeep_types::{Error, OutputFormat, Result, ServiceType, VehicleClass};

use crate::cli::{
    AlertCommand, Cli, Commands, FuelCommand, ServiceCommand, TripCommand, VehicleCommand,
    WorkOrderCommand,
};
use crate::output::{
    output_alert, output_alerts, output_done, output_fuel_logs, output_reports,
    output_service_records, output_trips, output_vehicle, output_vehicle_detail, output_vehicles,
    output_work_orders,
};
use std::path::{Path, PathBuf};

pub fn execute(cli: Cli) -> Result<()> {
    // Load config
    let mut config = Config::load()?;

    // Override from CLI args
    if let Some(ref dir) = cli.store_dir {
        config.store_dir = Some(dir.clone());
    }
    if let Some(ref path) = cli.intervals {
        config.intervals_path = Some(path.clone());
    }
    let format = cli.format.unwrap_or(config.output_format);

    if let Commands::Config {
        show,
        set_store_dir,
        set_intervals,
        set_output,
        print_intervals,
        reset,
    } = &cli.command
    {
        return cmd_config(
            &config,
            *show,
            set_store_dir.clone(),
            set_intervals.clone(),
            *set_output,
            *print_intervals,
            *reset,
        );
    }

    let workspace = FleetWorkspace::open(&config)?;
    let service = MaintenanceService::new(workspace.repositories(), config.interval_table()?);
    tracing::debug!(snapshot = %workspace.path().display(), "fleet loaded");

    let ctx = Context {
        service: &service,
        format,
        verbose: cli.verbose,
    };

    match &cli.command {
        Commands::Vehicle { action } => cmd_vehicle(&ctx, action)?,
        Commands::Mileage { vehicle, km } => cmd_mileage(&ctx, vehicle, *km)?,
        Commands::Service { action } => cmd_service(&ctx, action)?,
        Commands::Evaluate { vehicle } => cmd_evaluate(&ctx, vehicle.as_deref())?,
        Commands::Alerts { action } => cmd_alerts(&ctx, action)?,
        Commands::Trip { action } => cmd_trip(&ctx, action)?,
        Commands::Fuel { action } => cmd_fuel(&ctx, action)?,
        Commands::WorkOrder { action } => cmd_work_order(&ctx, action)?,
        Commands::Config { .. } => {}
    }

    if cli.command.mutates() {
        workspace.save()?;
    }
    Ok(())
}

struct Context<'a> {
    service: &'a MaintenanceService,
    format: OutputFormat,
    verbose: bool,
}

impl Context<'_> {
    fn vehicle_id(&self, key: &str) -> Result<String> {
        Ok(self.service.resolve_vehicle(key)?.id)
    }

    fn vehicle_filter(&self, key: Option<&str>) -> Result<Option<String>> {
        key.map(|k| self.vehicle_id(k)).transpose()
    }
}

fn cmd_vehicle(ctx: &Context, action: &VehicleCommand) -> Result<()> {
    let repos = ctx.service.repositories();
    match action {
        VehicleCommand::Add {
            plate,
            class,
            mileage,
        } => {
            let vehicle =
                ctx.service
                    .register_vehicle(plate, VehicleClass::parse(class), *mileage)?;
            let report = ctx.service.evaluate(&vehicle.id)?;
            output_vehicle(ctx.format, &vehicle)?;
            if ctx.format == OutputFormat::Table && !report.evaluation.plan.is_empty() {
                output_reports(ctx.format, &[report], ctx.verbose)?;
            }
        }
        VehicleCommand::List => {
            output_vehicles(ctx.format, &repos.vehicles.list()?)?;
        }
        VehicleCommand::Show { vehicle } => {
            let vehicle = ctx.service.resolve_vehicle(vehicle)?;
            let evaluation = ctx.service.status(&vehicle.id)?;
            let active = repos.alerts.active_for_vehicle(&vehicle.id)?;
            output_vehicle_detail(ctx.format, &vehicle, &evaluation, &active)?;
        }
    }
    Ok(())
}

fn cmd_mileage(ctx: &Context, vehicle: &str, km: u64) -> Result<()> {
    let vehicle_id = ctx.vehicle_id(vehicle)?;
    let report = ctx.service.on_mileage_changed(&vehicle_id, km)?;
    output_reports(ctx.format, &[report], ctx.verbose)
}

fn cmd_service(ctx: &Context, action: &ServiceCommand) -> Result<()> {
    match action {
        ServiceCommand::Record {
            vehicle,
            service_type,
            mileage,
            date,
            notes,
        } => {
            let vehicle = ctx.service.resolve_vehicle(vehicle)?;
            let service_type = ServiceType::parse(service_type);
            if service_type.key().is_empty() {
                return Err(Error::InvalidInput("service type must not be empty".to_string()));
            }
            let performed_at = match date {
                Some(text) => parse_date(text)
                    .ok_or_else(|| Error::InvalidInput(format!("invalid date: {}", text)))?,
                None => Utc::now(),
            };
            let mileage = mileage.unwrap_or(vehicle.current_mileage);

            let outcome = match notes {
                Some(notes) => {
                    let record =
                        ServiceRecord::new(&vehicle.id, service_type, mileage, performed_at)
                            .with_notes(notes.clone());
                    ctx.service.record_service(record)?
                }
                None => ctx.service.on_service_completed(
                    &vehicle.id,
                    service_type,
                    mileage,
                    performed_at,
                )?,
            };

            if ctx.format == OutputFormat::Json {
                return output_done(ctx.format, &outcome, "");
            }
            println!(
                "Recorded {} for {} at {} km",
                outcome.record.service_type.label(),
                vehicle.plate,
                outcome.record.mileage_at_service
            );
            output_reports(ctx.format, &[outcome.report], ctx.verbose)
        }
        ServiceCommand::History { vehicle } => {
            let vehicle_id = ctx.vehicle_id(vehicle)?;
            let records = ctx.service.repositories().ledger.for_vehicle(&vehicle_id)?;
            output_service_records(ctx.format, &records)
        }
        ServiceCommand::Import { file } => cmd_import(ctx, file),
    }
}

fn cmd_import(ctx: &Context, file: &Path) -> Result<()> {
    let rows = load_service_history(file)?;
    let summary = ctx.service.import_service_history(rows)?;
    if ctx.format == OutputFormat::Json {
        return output_done(ctx.format, &summary, "");
    }
    println!(
        "Imported {} service records for {} vehicles from {}",
        summary.imported,
        summary.reports.len(),
        file.display()
    );
    output_reports(ctx.format, &summary.reports, ctx.verbose)
}

fn cmd_evaluate(ctx: &Context, vehicle: Option<&str>) -> Result<()> {
    let reports = match vehicle {
        Some(key) => vec![ctx.service.evaluate(&ctx.vehicle_id(key)?)?],
        None => ctx.service.evaluate_all()?,
    };
    output_reports(ctx.format, &reports, ctx.verbose)
}

fn cmd_alerts(ctx: &Context, action: &AlertCommand) -> Result<()> {
    let alerts = &ctx.service.repositories().alerts;
    match action {
        AlertCommand::List {
            severity,
            all,
            vehicle,
        } => {
            let vehicle_id = ctx.vehicle_filter(vehicle.as_deref())?;
            let mut list: Vec<Alert> = match (*all, *severity) {
                (true, Some(severity)) => alerts
                    .all()?
                    .into_iter()
                    .filter(|a| a.severity == severity)
                    .collect(),
                (true, None) => alerts.all()?,
                (false, Some(severity)) => alerts.list_by_severity(severity)?,
                (false, None) => alerts.list_active()?,
            };
            if let Some(ref id) = vehicle_id {
                list.retain(|a| &a.vehicle_id == id);
            }
            output_alerts(ctx.format, &list)
        }
        AlertCommand::Resolve { alert_id } => {
            let alert = ctx.service.resolve_alert(alert_id)?;
            output_alert(ctx.format, &alert)
        }
    }
}

fn cmd_trip(ctx: &Context, action: &TripCommand) -> Result<()> {
    match action {
        TripCommand::Start {
            vehicle,
            driver,
            purpose,
        } => {
            let vehicle_id = ctx.vehicle_id(vehicle)?;
            let trip = ctx
                .service
                .start_trip(&vehicle_id, driver.clone(), purpose.clone())?;
            output_done(
                ctx.format,
                &trip,
                &format!("Started trip {} at {} km", trip.id, trip.start_odometer),
            )
        }
        TripCommand::End { trip_id, odometer } => {
            let outcome = ctx.service.end_trip(trip_id, *odometer)?;
            if ctx.format == OutputFormat::Json {
                return output_done(ctx.format, &outcome, "");
            }
            println!(
                "Completed trip {}: {} km",
                outcome.trip.id,
                outcome.trip.distance.unwrap_or(0)
            );
            output_reports(ctx.format, &[outcome.report], ctx.verbose)
        }
        TripCommand::List { vehicle } => {
            let vehicle_id = ctx.vehicle_filter(vehicle.as_deref())?;
            let trips = ctx.service.repositories().trips.list(vehicle_id.as_deref())?;
            output_trips(ctx.format, &trips)
        }
    }
}

fn cmd_fuel(ctx: &Context, action: &FuelCommand) -> Result<()> {
    match action {
        FuelCommand::Add {
            vehicle,
            liters,
            cost,
            odometer,
        } => {
            let vehicle_id = ctx.vehicle_id(vehicle)?;
            let outcome = ctx
                .service
                .record_fuel_log(&vehicle_id, *liters, *cost, *odometer)?;
            if ctx.format == OutputFormat::Json {
                return output_done(ctx.format, &outcome, "");
            }
            println!(
                "Logged {:.1} L for {:.2} ({:.2} per L)",
                outcome.log.liters,
                outcome.log.cost,
                outcome.log.cost_per_liter()
            );
            match outcome.report {
                Some(report) => output_reports(ctx.format, &[report], ctx.verbose),
                None => Ok(()),
            }
        }
        FuelCommand::List { vehicle } => {
            let vehicle_id = ctx.vehicle_filter(vehicle.as_deref())?;
            let logs = ctx.service.repositories().fuel.list(vehicle_id.as_deref())?;
            output_fuel_logs(ctx.format, &logs)
        }
    }
}

fn cmd_work_order(ctx: &Context, action: &WorkOrderCommand) -> Result<()> {
    match action {
        WorkOrderCommand::Open {
            vehicle,
            description,
            service_type,
            cost,
        } => {
            let vehicle_id = ctx.vehicle_id(vehicle)?;
            let service_type = service_type.as_deref().map(ServiceType::parse);
            let order = ctx
                .service
                .open_work_order(&vehicle_id, description, service_type, *cost)?;
            let tracked = order
                .service_type
                .as_ref()
                .map(|t| t.label().to_string())
                .unwrap_or_else(|| "no service record on completion".to_string());
            output_done(
                ctx.format,
                &order,
                &format!("Opened work order {} ({})", order.id, tracked),
            )
        }
        WorkOrderCommand::Status { order_id, status } => {
            let outcome = ctx
                .service
                .update_work_order_status(order_id, (*status).into())?;
            if ctx.format == OutputFormat::Json {
                return output_done(ctx.format, &outcome, "");
            }
            println!("Work order {} is now {}", outcome.order.id, outcome.order.status);
            match outcome.service {
                Some(service) => {
                    println!(
                        "Recorded {} at {} km",
                        service.record.service_type.label(),
                        service.record.mileage_at_service
                    );
                    output_reports(ctx.format, &[service.report], ctx.verbose)
                }
                None => Ok(()),
            }
        }
        WorkOrderCommand::List { vehicle } => {
            let vehicle_id = ctx.vehicle_filter(vehicle.as_deref())?;
            let orders = ctx
                .service
                .repositories()
                .work_orders
                .list(vehicle_id.as_deref())?;
            output_work_orders(ctx.format, &orders)
        }
    }
}

fn cmd_config(
    current: &Config,
    show: bool,
    set_store_dir: Option<PathBuf>,
    set_intervals: Option<PathBuf>,
    set_output: Option<OutputFormat>,
    print_intervals: bool,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    if print_intervals {
        let table = current.interval_table()?;
        print!("{}", interval_table_loader::to_toml_string(&table)?);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(dir) = set_store_dir {
        config.store_dir = Some(dir);
        modified = true;
    }

    if let Some(path) = set_intervals {
        // reject a broken table before it is saved
        Config {
            intervals_path: Some(path.clone()),
            ..Default::default()
        }
        .interval_table()?;
        config.intervals_path = Some(path);
        modified = true;
    }

    if let Some(output_format) = set_output {
        config.output_format = output_format;
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration saved");
    }

    if show || !modified {
        println!("\n{}", config);
    }

    Ok(())
}
