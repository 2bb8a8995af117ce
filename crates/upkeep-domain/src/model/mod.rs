//! Domain model types

pub mod alert;
pub mod fuel_log;
pub mod interval_table;
pub mod service_record;
pub mod trip;
pub mod vehicle;
pub mod work_order;

pub use alert::{Alert, AlertStatus, Resolution};
pub use fuel_log::FuelLog;
pub use interval_table::{ClassIntervals, Intervals, ServiceIntervalTable};
pub use service_record::ServiceRecord;
pub use trip::{Trip, TripStatus};
pub use vehicle::Vehicle;
pub use work_order::{WorkOrder, WorkOrderStatus};

pub(crate) fn new_id(prefix: &str) -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &uuid[..12])
}
