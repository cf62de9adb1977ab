use chrono::NaiveDate;
use thiserror::Error;

use crate::model::time_record::TimeRecordView;

pub mod pdf;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to render report: {0}")]
    Render(String),
}

/// What the report is about; printed above the table.
#[derive(Debug, Clone)]
pub struct ReportHeading {
    pub employee_name: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

impl ReportHeading {
    pub fn file_stem(&self) -> String {
        format!(
            "time-records-{}-{}",
            self.date_from.format("%Y%m%d"),
            self.date_to.format("%Y%m%d")
        )
    }
}

/// Turns an ordered, annotated record list into a downloadable document.
pub trait ReportRenderer: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn file_extension(&self) -> &'static str;

    fn render(
        &self,
        heading: &ReportHeading,
        records: &[TimeRecordView],
    ) -> Result<Vec<u8>, ReportError>;
}
