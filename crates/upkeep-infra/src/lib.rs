//! Infrastructure layer: persistence and file loaders

pub mod interval_table_loader;
pub mod persistence;
pub mod service_csv;
