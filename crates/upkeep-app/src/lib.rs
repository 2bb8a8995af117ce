//! Application service layer - maintenance engine, config, workspace

pub mod app;
pub mod config;
pub mod repository;

pub use app::MaintenanceService;
pub use config::Config;
pub use repository::{FleetWorkspace, Repositories};
