use crate::{
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    ledger::{PunchOutcome, TimeRecordLedger},
    model::{
        employee::Employee,
        time_record::{RecordStatus, TimeRecordView},
    },
    report::{ReportHeading, ReportRenderer},
    repository::EmployeeDirectory,
    utils::cpf,
};
use actix_web::{
    HttpResponse,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

/// Punches are stamped with the server's local wall clock.
fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Records are only reachable through an existing employee.
async fn find_employee(
    directory: &dyn EmployeeDirectory,
    employee_id: u64,
) -> ApiResult<Employee> {
    directory
        .find(employee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    /// First day of the range, inclusive
    #[param(example = "2025-01-01")]
    pub date_from: NaiveDate,
    /// Last day of the range, inclusive
    #[param(example = "2025-01-31")]
    pub date_to: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct TimeRecordListResponse {
    pub employee_id: u64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub data: Vec<TimeRecordView>,
}

#[derive(Deserialize, ToSchema)]
pub struct PunchRequest {
    #[schema(example = "123.456.789-01")]
    pub cpf: String,
}

#[derive(Serialize, ToSchema)]
pub struct PunchResponse {
    pub employee_id: u64,
    pub employee_name: String,
    pub status: RecordStatus,
    pub record: TimeRecordView,
}

/// Open a time record (entry punch)
#[utoipa::path(
    post,
    path = "/api/employees/{employee_id}/time-records/open",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 201, description = "Record opened", body = TimeRecordView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden", body = crate::models::MessageResponse),
        (status = 404, description = "Employee not found", body = crate::models::MessageResponse),
        (status = 409, description = "Employee already has an open punch", body = crate::models::MessageResponse),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Time records"
)]
pub async fn open_record(
    auth: AuthUser,
    ledger: web::Data<TimeRecordLedger>,
    directory: web::Data<dyn EmployeeDirectory>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_access(employee_id)?;
    find_employee(directory.get_ref(), employee_id).await?;

    let record = ledger.open_record(employee_id, now()).await?;
    Ok(HttpResponse::Created().json(TimeRecordView::from(record)))
}

/// Close the open time record (exit punch)
#[utoipa::path(
    post,
    path = "/api/employees/{employee_id}/time-records/close",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Record closed", body = TimeRecordView),
        (status = 400, description = "Exit time not after entry time", body = crate::models::MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden", body = crate::models::MessageResponse),
        (status = 404, description = "Employee not found or no open punch", body = crate::models::MessageResponse),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Time records"
)]
pub async fn close_record(
    auth: AuthUser,
    ledger: web::Data<TimeRecordLedger>,
    directory: web::Data<dyn EmployeeDirectory>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_access(employee_id)?;
    find_employee(directory.get_ref(), employee_id).await?;

    let record = ledger.close_record(employee_id, now()).await?;
    Ok(HttpResponse::Ok().json(TimeRecordView::from(record)))
}

/// List an employee's time records in a date range
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/time-records",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        DateRangeQuery
    ),
    responses(
        (status = 200, description = "Records ordered by date; empty when none match", body = TimeRecordListResponse),
        (status = 400, description = "Start date after end date", body = crate::models::MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden", body = crate::models::MessageResponse),
        (status = 404, description = "Employee not found", body = crate::models::MessageResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Time records"
)]
pub async fn list_records(
    auth: AuthUser,
    ledger: web::Data<TimeRecordLedger>,
    directory: web::Data<dyn EmployeeDirectory>,
    path: web::Path<u64>,
    query: web::Query<DateRangeQuery>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_access(employee_id)?;
    find_employee(directory.get_ref(), employee_id).await?;

    let data = ledger
        .list_records(employee_id, query.date_from, query.date_to)
        .await?;

    Ok(HttpResponse::Ok().json(TimeRecordListResponse {
        employee_id,
        date_from: query.date_from,
        date_to: query.date_to,
        data,
    }))
}

/// Export the filtered records as a document
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/time-records/export",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        DateRangeQuery
    ),
    responses(
        (status = 200, description = "Report document as an attachment (application/pdf)"),
        (status = 400, description = "Start date after end date", body = crate::models::MessageResponse),
        (status = 403, description = "Forbidden", body = crate::models::MessageResponse),
        (status = 404, description = "Employee not found", body = crate::models::MessageResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Time records"
)]
pub async fn export_records(
    auth: AuthUser,
    ledger: web::Data<TimeRecordLedger>,
    directory: web::Data<dyn EmployeeDirectory>,
    renderer: web::Data<dyn ReportRenderer>,
    path: web::Path<u64>,
    query: web::Query<DateRangeQuery>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_access(employee_id)?;

    let employee = find_employee(directory.get_ref(), employee_id).await?;

    let heading = ReportHeading {
        employee_name: employee.name,
        date_from: query.date_from,
        date_to: query.date_to,
    };
    let document = ledger
        .export_report(
            employee_id,
            query.date_from,
            query.date_to,
            &heading,
            renderer.get_ref(),
        )
        .await?;

    let filename = format!("{}.{}", heading.file_stem(), renderer.file_extension());
    Ok(HttpResponse::Ok()
        .content_type(renderer.content_type())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .body(document))
}

/// Kiosk punch: identify the employee by CPF and toggle their record
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/punch",
    params(("company_id" = u64, Path, description = "Company ID")),
    request_body = PunchRequest,
    responses(
        (status = 200, description = "Record opened or closed", body = PunchResponse),
        (status = 400, description = "Malformed CPF", body = crate::models::MessageResponse),
        (status = 403, description = "Superuser only", body = crate::models::MessageResponse),
        (status = 404, description = "No employee with this CPF in the company", body = crate::models::MessageResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Time records"
)]
pub async fn punch(
    auth: AuthUser,
    ledger: web::Data<TimeRecordLedger>,
    directory: web::Data<dyn EmployeeDirectory>,
    path: web::Path<u64>,
    payload: web::Json<PunchRequest>,
) -> ApiResult<HttpResponse> {
    auth.require_superuser()?;
    let company_id = path.into_inner();
    let cpf = cpf::normalize(&payload.cpf)?;

    let employee = directory
        .find_by_cpf(company_id, &cpf)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found, try again".into()))?;

    let record = match ledger.punch(employee.id, now()).await? {
        PunchOutcome::Opened(view) | PunchOutcome::Closed(view) => view,
    };
    info!(employee_id = employee.id, status = %record.status, "Kiosk punch");

    Ok(HttpResponse::Ok().json(PunchResponse {
        employee_id: employee.id,
        employee_name: employee.name,
        status: record.status,
        record,
    }))
}
