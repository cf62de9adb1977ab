//! Punch-record ledger.
//!
//! Enforces the two record invariants at write time (one open record per
//! employee, exit strictly after entry) and answers date-range queries with
//! status and worked hours derived on read. Atomicity of the writes is
//! delegated to the [`TimeRecordStore`]: the open-record guard is a storage
//! uniqueness rule and closing is a conditional update.
//!
//! Timestamps are kept at whole-second precision, the precision of the
//! `DATETIME` columns, so an exit in the same second as its entry is
//! rejected here rather than by the storage check constraint.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, SubsecRound};
use tracing::{info, instrument, warn};

use crate::{
    model::time_record::{TimeRecord, TimeRecordView},
    report::{ReportHeading, ReportRenderer},
    repository::TimeRecordStore,
};

pub mod error;

pub use error::{LedgerError, RangeViolation};

/// Result of a kiosk punch, which opens or closes depending on current state.
#[derive(Debug, Clone)]
pub enum PunchOutcome {
    Opened(TimeRecordView),
    Closed(TimeRecordView),
}

#[derive(Clone)]
pub struct TimeRecordLedger {
    store: Arc<dyn TimeRecordStore>,
}

impl TimeRecordLedger {
    pub fn new(store: Arc<dyn TimeRecordStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn open_record(
        &self,
        employee_id: u64,
        timestamp: NaiveDateTime,
    ) -> Result<TimeRecord, LedgerError> {
        if self.store.find_open(employee_id).await?.is_some() {
            warn!("Entry punch rejected, record already open");
            return Err(LedgerError::Conflict { employee_id });
        }

        self.insert_open(employee_id, timestamp).await
    }

    #[instrument(skip(self))]
    pub async fn close_record(
        &self,
        employee_id: u64,
        timestamp: NaiveDateTime,
    ) -> Result<TimeRecord, LedgerError> {
        let open = self
            .store
            .find_open(employee_id)
            .await?
            .ok_or(LedgerError::NotFound { employee_id })?;

        self.close_open(open, timestamp).await
    }

    /// Close the open record if there is one, otherwise open a new one.
    pub async fn punch(
        &self,
        employee_id: u64,
        timestamp: NaiveDateTime,
    ) -> Result<PunchOutcome, LedgerError> {
        match self.store.find_open(employee_id).await? {
            Some(open) => {
                let closed = self.close_open(open, timestamp).await?;
                Ok(PunchOutcome::Closed(closed.into()))
            }
            None => {
                let opened = self.insert_open(employee_id, timestamp).await?;
                Ok(PunchOutcome::Opened(opened.into()))
            }
        }
    }

    /// A concurrent insert that slipped past the caller's read is turned
    /// into a conflict by the store.
    async fn insert_open(
        &self,
        employee_id: u64,
        timestamp: NaiveDateTime,
    ) -> Result<TimeRecord, LedgerError> {
        let timestamp = timestamp.trunc_subsecs(0);
        let record = self
            .store
            .insert_open(employee_id, timestamp.date(), timestamp)
            .await?;

        info!(record_id = record.id, "Time record opened");
        Ok(record)
    }

    /// Sets the exit time of `open`, which was read as open by the caller.
    async fn close_open(
        &self,
        open: TimeRecord,
        timestamp: NaiveDateTime,
    ) -> Result<TimeRecord, LedgerError> {
        let timestamp = timestamp.trunc_subsecs(0);
        if timestamp <= open.entry_time {
            return Err(LedgerError::InvalidRange(
                RangeViolation::ExitNotAfterEntry {
                    entry_time: open.entry_time,
                    exit_time: timestamp,
                },
            ));
        }

        if !self.store.close(open.id, timestamp).await? {
            warn!(record_id = open.id, "Record was closed concurrently");
            return Err(LedgerError::NotFound {
                employee_id: open.employee_id,
            });
        }

        info!(record_id = open.id, "Time record closed");
        Ok(TimeRecord {
            exit_time: Some(timestamp),
            ..open
        })
    }

    #[instrument(skip(self))]
    pub async fn list_records(
        &self,
        employee_id: u64,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<TimeRecordView>, LedgerError> {
        if date_from > date_to {
            return Err(LedgerError::InvalidRange(RangeViolation::ReversedDates {
                date_from,
                date_to,
            }));
        }

        let records = self
            .store
            .list_between(employee_id, date_from, date_to)
            .await?;

        Ok(records.into_iter().map(TimeRecordView::from).collect())
    }

    /// Same rows as [`list_records`](Self::list_records), handed to `renderer`.
    #[instrument(skip(self, heading, renderer))]
    pub async fn export_report(
        &self,
        employee_id: u64,
        date_from: NaiveDate,
        date_to: NaiveDate,
        heading: &ReportHeading,
        renderer: &dyn ReportRenderer,
    ) -> Result<Vec<u8>, LedgerError> {
        let rows = self.list_records(employee_id, date_from, date_to).await?;
        let document = renderer.render(heading, &rows)?;

        info!(rows = rows.len(), bytes = document.len(), "Report rendered");
        Ok(document)
    }
}
