use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::{report::ReportError, repository::StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeViolation {
    ExitNotAfterEntry {
        entry_time: NaiveDateTime,
        exit_time: NaiveDateTime,
    },
    ReversedDates {
        date_from: NaiveDate,
        date_to: NaiveDate,
    },
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("employee {employee_id} already has an open punch")]
    Conflict { employee_id: u64 },

    #[error("employee {employee_id} has no open punch to close")]
    NotFound { employee_id: u64 },

    #[error("{}", describe(.0))]
    InvalidRange(RangeViolation),

    #[error(transparent)]
    Storage(StoreError),

    #[error(transparent)]
    Render(#[from] ReportError),
}

fn describe(violation: &RangeViolation) -> String {
    match violation {
        RangeViolation::ExitNotAfterEntry { .. } => {
            "exit time must be after the entry time".to_string()
        }
        RangeViolation::ReversedDates { .. } => {
            "the start date cannot be after the end date".to_string()
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OpenRecordExists { employee_id } => LedgerError::Conflict { employee_id },
            other => LedgerError::Storage(other),
        }
    }
}
