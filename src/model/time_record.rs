use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

/// One work session ("ponto") of one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeRecord {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub entry_time: NaiveDateTime,
    pub exit_time: Option<NaiveDateTime>,
}

impl TimeRecord {
    pub fn status(&self) -> RecordStatus {
        if self.exit_time.is_some() {
            RecordStatus::Closed
        } else {
            RecordStatus::Open
        }
    }

    /// `None` while the record is open; partial sessions are never measured against "now".
    pub fn worked_hours(&self) -> Option<WorkedHours> {
        self.exit_time
            .and_then(|exit| WorkedHours::between(self.entry_time, exit))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordStatus {
    Open,
    Closed,
}

/// Elapsed time of a closed session, shown as `HH:MM` with minutes truncated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkedHours(TimeDelta);

impl WorkedHours {
    pub fn between(entry: NaiveDateTime, exit: NaiveDateTime) -> Option<Self> {
        let elapsed = exit - entry;
        (elapsed > TimeDelta::zero()).then_some(WorkedHours(elapsed))
    }

    pub fn total_minutes(&self) -> i64 {
        self.0.num_minutes()
    }
}

impl fmt::Display for WorkedHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.total_minutes();
        write!(f, "{:02}:{:02}", minutes / 60, minutes % 60)
    }
}

impl Serialize for WorkedHours {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A record as listed and exported: status and worked hours derived on read.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(
    example = json!({
        "id": 10,
        "employee_id": 1,
        "date": "2025-01-02",
        "status": "closed",
        "entry_time": "2025-01-02T08:00:00",
        "exit_time": "2025-01-02T17:30:00",
        "worked_hours": "09:30"
    })
)]
pub struct TimeRecordView {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub status: RecordStatus,
    pub entry_time: NaiveDateTime,
    #[schema(nullable = true)]
    pub exit_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, example = "09:30")]
    pub worked_hours: Option<WorkedHours>,
}

impl From<TimeRecord> for TimeRecordView {
    fn from(record: TimeRecord) -> Self {
        Self {
            status: record.status(),
            worked_hours: record.worked_hours(),
            id: record.id,
            employee_id: record.employee_id,
            date: record.date,
            entry_time: record.entry_time,
            exit_time: record.exit_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn record(entry: NaiveDateTime, exit: Option<NaiveDateTime>) -> TimeRecord {
        TimeRecord {
            id: 1,
            employee_id: 1,
            date: entry.date(),
            entry_time: entry,
            exit_time: exit,
        }
    }

    #[rstest]
    #[case("08:00:00", "17:30:00", "09:30")]
    #[case("08:00:00", "08:00:59", "00:00")]
    #[case("09:15:00", "09:59:59", "00:44")]
    #[case("00:00:00", "23:59:00", "23:59")]
    fn worked_hours_truncates_to_minutes(
        #[case] entry: &str,
        #[case] exit: &str,
        #[case] expected: &str,
    ) {
        let rec = record(at("2025-01-02", entry), Some(at("2025-01-02", exit)));
        assert_eq!(rec.worked_hours().unwrap().to_string(), expected);
    }

    #[test]
    fn overnight_session_counts_past_midnight() {
        let rec = record(
            at("2025-01-02", "22:00:00"),
            Some(at("2025-01-03", "06:45:00")),
        );
        assert_eq!(rec.worked_hours().unwrap().to_string(), "08:45");
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }

    #[test]
    fn sessions_longer_than_a_day_keep_counting_hours() {
        let rec = record(
            at("2025-01-02", "08:00:00"),
            Some(at("2025-01-03", "10:05:00")),
        );
        assert_eq!(rec.worked_hours().unwrap().to_string(), "26:05");
    }

    #[test]
    fn open_record_has_no_worked_hours() {
        let rec = record(at("2025-01-02", "08:00:00"), None);
        assert_eq!(rec.status(), RecordStatus::Open);
        assert!(rec.worked_hours().is_none());
    }

    #[test]
    fn non_positive_interval_is_not_a_duration() {
        let entry = at("2025-01-02", "08:00:00");
        assert!(WorkedHours::between(entry, entry).is_none());
        assert!(WorkedHours::between(entry, at("2025-01-02", "07:00:00")).is_none());
    }

    #[test]
    fn view_serializes_status_and_hours_as_strings() {
        let view = TimeRecordView::from(record(
            at("2025-01-02", "08:00:00"),
            Some(at("2025-01-02", "17:30:00")),
        ));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["status"], "closed");
        assert_eq!(json["worked_hours"], "09:30");
        assert_eq!(json["date"], "2025-01-02");
    }

    #[test]
    fn open_view_serializes_null_hours() {
        let view = TimeRecordView::from(record(at("2025-01-02", "08:00:00"), None));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["status"], "open");
        assert!(json["worked_hours"].is_null());
        assert!(json["exit_time"].is_null());
        assert_eq!(view.status.as_ref(), "open");
    }
}
