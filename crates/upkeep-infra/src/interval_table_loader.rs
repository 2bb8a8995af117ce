//! Service interval table loader from TOML
//!
//! ```toml
//! default_class = "Car"
//! default_warning_km = 500
//! escalated = ["major_service"]
//!
//! [warning_km]
//! major_service = 2000
//!
//! [intervals.Car]
//! oil_change = 5000
//! brake_check = 10000
//! ```

use std::fs;
use std::path::Path;

use upkeep_domain::model::ServiceIntervalTable;
use upkeep_types::{ConfigError, Error, Result};

/// Load and validate an interval table from a TOML file
pub fn load_from_file(path: &Path) -> Result<ServiceIntervalTable> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(ConfigError::ParseError(format!(
            "Failed to read interval table {}: {}",
            path.display(),
            e
        )))
    })?;

    let table = load_from_str(&content)?;
    tracing::info!(
        path = %path.display(),
        classes = table.intervals.len(),
        "interval table loaded"
    );
    Ok(table)
}

/// Load and validate an interval table from a TOML string
pub fn load_from_str(toml_content: &str) -> Result<ServiceIntervalTable> {
    let table: ServiceIntervalTable = toml::from_str(toml_content).map_err(|e| {
        Error::Config(ConfigError::ParseError(format!(
            "Failed to parse interval table TOML: {}",
            e
        )))
    })?;
    table.validate()?;
    Ok(table)
}

/// Render a table as TOML, e.g. to seed a config file from the defaults
pub fn to_toml_string(table: &ServiceIntervalTable) -> Result<String> {
    toml::to_string_pretty(table).map_err(|e| {
        Error::Config(ConfigError::ParseError(format!(
            "Failed to render interval table: {}",
            e
        )))
    })
}
