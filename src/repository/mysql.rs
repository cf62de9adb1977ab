use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;
use tracing::debug;

use super::{EmployeeDirectory, StoreError, TimeRecordStore};
use crate::model::{employee::Employee, time_record::TimeRecord};

const RECORD_COLUMNS: &str = "id, employee_id, date, entry_time, exit_time";

pub struct MySqlTimeRecordStore {
    pool: MySqlPool,
}

impl MySqlTimeRecordStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TimeRecordStore for MySqlTimeRecordStore {
    async fn find_open(&self, employee_id: u64) -> Result<Option<TimeRecord>, StoreError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM time_records WHERE employee_id = ? AND exit_time IS NULL"
        );

        let record = sqlx::query_as::<_, TimeRecord>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn insert_open(
        &self,
        employee_id: u64,
        date: NaiveDate,
        entry_time: NaiveDateTime,
    ) -> Result<TimeRecord, StoreError> {
        // uq_time_records_open makes this insert the atomic check
        let result = sqlx::query(
            r#"
            INSERT INTO time_records (employee_id, date, entry_time)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .bind(entry_time)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(TimeRecord {
                id: done.last_insert_id(),
                employee_id,
                date,
                entry_time,
                exit_time: None,
            }),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                debug!(employee_id, "Open record insert rejected by unique key");
                Err(StoreError::OpenRecordExists { employee_id })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn close(&self, record_id: u64, exit_time: NaiveDateTime) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE time_records
            SET exit_time = ?
            WHERE id = ?
            AND exit_time IS NULL
            "#,
        )
        .bind(exit_time)
        .bind(record_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TimeRecord>, StoreError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM time_records \
             WHERE employee_id = ? AND date BETWEEN ? AND ? \
             ORDER BY date ASC, entry_time ASC"
        );
        debug!(sql = %sql, employee_id, %from, %to, "Fetching time records");

        let records = sqlx::query_as::<_, TimeRecord>(&sql)
            .bind(employee_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }
}

const EMPLOYEE_SELECT: &str = r#"
    SELECT e.id, e.name, e.email, e.company_id, u.cpf
    FROM employees e
    JOIN users u ON u.employee_id = e.id
"#;

pub struct MySqlEmployeeDirectory {
    pool: MySqlPool,
}

impl MySqlEmployeeDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlEmployeeDirectory {
    async fn find(&self, employee_id: u64) -> Result<Option<Employee>, StoreError> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE e.id = ?");

        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    async fn find_by_cpf(
        &self,
        company_id: u64,
        cpf: &str,
    ) -> Result<Option<Employee>, StoreError> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE u.cpf = ? AND e.company_id = ?");

        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(cpf)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }
}
