use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use super::{EmployeeDirectory, StoreError, TimeRecordStore};
use crate::model::{employee::Employee, time_record::TimeRecord};

/// Store backed by a vector; each method holds the lock for its whole
/// check-then-write, standing in for the database's unique key.
#[derive(Default)]
pub struct MemoryTimeRecordStore {
    records: Mutex<Vec<TimeRecord>>,
}

impl MemoryTimeRecordStore {
    pub fn with_records(records: Vec<TimeRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn snapshot(&self) -> Vec<TimeRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl TimeRecordStore for MemoryTimeRecordStore {
    async fn find_open(&self, employee_id: u64) -> Result<Option<TimeRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .find(|r| r.employee_id == employee_id && r.exit_time.is_none())
            .cloned())
    }

    async fn insert_open(
        &self,
        employee_id: u64,
        date: NaiveDate,
        entry_time: NaiveDateTime,
    ) -> Result<TimeRecord, StoreError> {
        let mut records = self.records.lock().unwrap();
        if records
            .iter()
            .any(|r| r.employee_id == employee_id && r.exit_time.is_none())
        {
            return Err(StoreError::OpenRecordExists { employee_id });
        }

        let record = TimeRecord {
            id: records.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            employee_id,
            date,
            entry_time,
            exit_time: None,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn close(&self, record_id: u64, exit_time: NaiveDateTime) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap();
        match records
            .iter_mut()
            .find(|r| r.id == record_id && r.exit_time.is_none())
        {
            Some(record) => {
                record.exit_time = Some(exit_time);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TimeRecord>, StoreError> {
        let mut found: Vec<TimeRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.employee_id == employee_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.date, r.entry_time));
        Ok(found)
    }
}

#[derive(Default)]
pub struct MemoryEmployeeDirectory {
    employees: Vec<Employee>,
}

impl MemoryEmployeeDirectory {
    pub fn new(employees: Vec<Employee>) -> Self {
        Self { employees }
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryEmployeeDirectory {
    async fn find(&self, employee_id: u64) -> Result<Option<Employee>, StoreError> {
        Ok(self.employees.iter().find(|e| e.id == employee_id).cloned())
    }

    async fn find_by_cpf(
        &self,
        company_id: u64,
        cpf: &str,
    ) -> Result<Option<Employee>, StoreError> {
        Ok(self
            .employees
            .iter()
            .find(|e| e.company_id == company_id && e.cpf == cpf)
            .cloned())
    }
}
