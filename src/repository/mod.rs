//! Persistence ports used by the ledger and the punch/export handlers.
//!
//! The MySQL adapters live in [`mysql`]; tests run against the in-memory
//! fixtures in [`memory`], which enforce the same "one open record per
//! employee" rule the database enforces with its unique key.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::model::{employee::Employee, time_record::TimeRecord};

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage-level guard rejected a second open record.
    #[error("employee {employee_id} already has an open time record")]
    OpenRecordExists { employee_id: u64 },

    #[error("storage query failed: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait TimeRecordStore: Send + Sync {
    /// The record of `employee_id` whose exit time is unset, if any.
    async fn find_open(&self, employee_id: u64) -> Result<Option<TimeRecord>, StoreError>;

    /// Insert an open record. Fails with [`StoreError::OpenRecordExists`]
    /// when one already exists, atomically with respect to other inserts.
    async fn insert_open(
        &self,
        employee_id: u64,
        date: NaiveDate,
        entry_time: NaiveDateTime,
    ) -> Result<TimeRecord, StoreError>;

    /// Set the exit time of `record_id` only if it is still open.
    /// Returns `false` when nothing was updated.
    async fn close(&self, record_id: u64, exit_time: NaiveDateTime) -> Result<bool, StoreError>;

    /// Records of `employee_id` dated within `[from, to]`, by date then entry time.
    async fn list_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TimeRecord>, StoreError>;
}

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn find(&self, employee_id: u64) -> Result<Option<Employee>, StoreError>;

    /// Employee of `company_id` whose user holds `cpf` (already normalized).
    async fn find_by_cpf(&self, company_id: u64, cpf: &str)
    -> Result<Option<Employee>, StoreError>;
}
