//! CLI definition using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use upkeep_domain::model::WorkOrderStatus;
use upkeep_types::{OutputFormat, Severity};

#[derive(Parser)]
#[command(name = "fleet-upkeep")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Mileage-driven maintenance alerts for a vehicle fleet")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Directory holding the fleet snapshot (overrides config)
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    /// Interval table TOML file (overrides config)
    #[arg(long, global = true)]
    pub intervals: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage vehicles
    Vehicle {
        #[command(subcommand)]
        action: VehicleCommand,
    },

    /// Record an odometer reading and re-evaluate the vehicle
    Mileage {
        /// Vehicle id or plate
        vehicle: String,

        /// New odometer reading in km
        km: u64,
    },

    /// Record and inspect service history
    Service {
        #[command(subcommand)]
        action: ServiceCommand,
    },

    /// Re-evaluate one vehicle, or the whole fleet
    Evaluate {
        /// Vehicle id or plate
        vehicle: Option<String>,
    },

    /// List and resolve alerts
    Alerts {
        #[command(subcommand)]
        action: AlertCommand,
    },

    /// Track trips
    Trip {
        #[command(subcommand)]
        action: TripCommand,
    },

    /// Log fuel purchases
    Fuel {
        #[command(subcommand)]
        action: FuelCommand,
    },

    /// Manage workshop work orders
    WorkOrder {
        #[command(subcommand)]
        action: WorkOrderCommand,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set snapshot directory
        #[arg(long)]
        set_store_dir: Option<PathBuf>,

        /// Set interval table TOML file
        #[arg(long)]
        set_intervals: Option<PathBuf>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Print the active interval table as TOML
        #[arg(long)]
        print_intervals: bool,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
pub enum VehicleCommand {
    /// Register a vehicle
    Add {
        /// Registration plate
        plate: String,

        /// Vehicle class (Car, Van, Bus, Truck)
        #[arg(long, short = 'c')]
        class: String,

        /// Current odometer reading in km
        #[arg(long, short = 'm', default_value = "0")]
        mileage: u64,
    },

    /// List registered vehicles
    List,

    /// Show a vehicle with its due state per service
    Show {
        /// Vehicle id or plate
        vehicle: String,
    },
}

#[derive(Subcommand)]
pub enum ServiceCommand {
    /// Record a completed service
    Record {
        /// Vehicle id or plate
        vehicle: String,

        /// Service type (oil_change, brake_check, air_filter, major_service, ...)
        #[arg(long = "type", short = 't')]
        service_type: String,

        /// Odometer at service. Uses the vehicle's current mileage if not specified.
        #[arg(long, short = 'm')]
        mileage: Option<u64>,

        /// Service date (YYYY-MM-DD or RFC 3339). Defaults to now.
        #[arg(long, short = 'd')]
        date: Option<String>,

        /// Optional notes
        #[arg(long, short = 'n')]
        notes: Option<String>,
    },

    /// Show service history of a vehicle
    History {
        /// Vehicle id or plate
        vehicle: String,
    },

    /// Import service history from CSV
    Import {
        /// CSV file (vehicle,service_type,mileage,date[,notes])
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum AlertCommand {
    /// List active alerts, most severe first
    List {
        /// Only alerts of this severity
        #[arg(long, short = 's')]
        severity: Option<Severity>,

        /// Include resolved alerts
        #[arg(long)]
        all: bool,

        /// Only alerts of this vehicle (id or plate)
        #[arg(long)]
        vehicle: Option<String>,
    },

    /// Mark an alert as resolved
    Resolve {
        /// Alert id
        alert_id: String,
    },
}

#[derive(Subcommand)]
pub enum TripCommand {
    /// Start a trip at the vehicle's current mileage
    Start {
        /// Vehicle id or plate
        vehicle: String,

        #[arg(long)]
        driver: Option<String>,

        #[arg(long)]
        purpose: Option<String>,
    },

    /// End a trip; the end odometer becomes the vehicle's mileage
    End {
        /// Trip id
        trip_id: String,

        /// Odometer reading at the end of the trip
        odometer: u64,
    },

    /// List trips
    List {
        /// Vehicle id or plate
        #[arg(long)]
        vehicle: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum FuelCommand {
    /// Log a fuel purchase
    Add {
        /// Vehicle id or plate
        vehicle: String,

        #[arg(long, short = 'l')]
        liters: f64,

        #[arg(long, short = 'c')]
        cost: f64,

        /// Odometer reading at the pump
        #[arg(long, short = 'o')]
        odometer: Option<u64>,
    },

    /// List fuel logs
    List {
        /// Vehicle id or plate
        #[arg(long)]
        vehicle: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum WorkOrderCommand {
    /// Open a work order
    Open {
        /// Vehicle id or plate
        vehicle: String,

        /// What needs doing, e.g. "Brake Service"
        description: String,

        /// Service type recorded on completion. Parsed from the description if not specified.
        #[arg(long = "type", short = 't')]
        service_type: Option<String>,

        #[arg(long, short = 'c')]
        cost: Option<f64>,
    },

    /// Change the status of a work order
    Status {
        /// Work order id
        order_id: String,

        status: WorkOrderStatusArg,
    },

    /// List work orders
    List {
        /// Vehicle id or plate
        #[arg(long)]
        vehicle: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum WorkOrderStatusArg {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl From<WorkOrderStatusArg> for WorkOrderStatus {
    fn from(arg: WorkOrderStatusArg) -> Self {
        match arg {
            WorkOrderStatusArg::Pending => WorkOrderStatus::Pending,
            WorkOrderStatusArg::InProgress => WorkOrderStatus::InProgress,
            WorkOrderStatusArg::Completed => WorkOrderStatus::Completed,
            WorkOrderStatusArg::Cancelled => WorkOrderStatus::Cancelled,
        }
    }
}

impl Commands {
    /// Whether the command changes fleet state and the snapshot must be saved
    pub fn mutates(&self) -> bool {
        match self {
            Commands::Vehicle { action } => matches!(action, VehicleCommand::Add { .. }),
            Commands::Service { action } => !matches!(action, ServiceCommand::History { .. }),
            Commands::Alerts { action } => matches!(action, AlertCommand::Resolve { .. }),
            Commands::Trip { action } => !matches!(action, TripCommand::List { .. }),
            Commands::Fuel { action } => matches!(action, FuelCommand::Add { .. }),
            Commands::WorkOrder { action } => !matches!(action, WorkOrderCommand::List { .. }),
            Commands::Mileage { .. } | Commands::Evaluate { .. } => true,
            Commands::Config { .. } => false,
        }
    }
}
