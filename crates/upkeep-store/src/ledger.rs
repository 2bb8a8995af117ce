//! Append-only service history ledger

use std::sync::RwLock;

use upkeep_domain::model::ServiceRecord;
use upkeep_domain::repository::ServiceRecordRepository;
use upkeep_types::{Result, ServiceType};

use crate::{read, write};

#[derive(Debug, Default)]
pub struct ServiceLedger {
    records: RwLock<Vec<ServiceRecord>>,
}

impl ServiceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ServiceRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Records in append order
    pub fn snapshot(&self) -> Result<Vec<ServiceRecord>> {
        Ok(read(&self.records)?.clone())
    }
}

impl ServiceRecordRepository for ServiceLedger {
    fn append(&self, record: ServiceRecord) -> Result<()> {
        write(&self.records)?.push(record);
        Ok(())
    }

    fn query(&self, vehicle_id: &str, service_type: &ServiceType) -> Result<Vec<ServiceRecord>> {
        Ok(read(&self.records)?
            .iter()
            .filter(|r| r.vehicle_id == vehicle_id && &r.service_type == service_type)
            .cloned()
            .collect())
    }

    fn for_vehicle(&self, vehicle_id: &str) -> Result<Vec<ServiceRecord>> {
        let mut records: Vec<_> = read(&self.records)?
            .iter()
            .filter(|r| r.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.performed_at.cmp(&a.performed_at));
        Ok(records)
    }
}
