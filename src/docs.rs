use crate::api::company::CreateCompany;
use crate::api::employee::{CreateEmployee, EmployeeListResponse, UpdateEmployee};
use crate::api::time_record::{
    DateRangeQuery, PunchRequest, PunchResponse, TimeRecordListResponse,
};
use crate::model::company::Company;
use crate::model::employee::Employee;
use crate::model::time_record::{RecordStatus, TimeRecordView};
use crate::models::{LoginReqDto, MessageResponse, TokenPair};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

/// Registers the JWT bearer scheme referenced by `security(("bearer_auth" = []))`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Time Clock API",
        version = "1.0.0",
        description = r#"
## Employee Time Clock

Records employee entry and exit punches per company and reports them.

### Key Features
- **Punches**
  - Open a record on entry, close it on exit; at most one open record per employee
  - Kiosk punch by CPF toggles between entry and exit
- **Reports**
  - List records in a date range with status and worked hours
  - Export the same listing as a PDF document
- **Registry**
  - Companies and their employees, each employee with a CPF login

### Security
Endpoints under `/api` require a **JWT Bearer** access token obtained from `/auth/login`.
Superusers manage every company; regular users only reach their own records.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::company::create_company,
        crate::api::company::list_companies,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::time_record::open_record,
        crate::api::time_record::close_record,
        crate::api::time_record::list_records,
        crate::api::time_record::export_records,
        crate::api::time_record::punch
    ),
    components(
        schemas(
            LoginReqDto,
            TokenPair,
            MessageResponse,
            Company,
            CreateCompany,
            Employee,
            CreateEmployee,
            UpdateEmployee,
            EmployeeListResponse,
            RecordStatus,
            TimeRecordView,
            TimeRecordListResponse,
            DateRangeQuery,
            PunchRequest,
            PunchResponse
        )
    ),
    tags(
        (name = "Auth", description = "Login and token rotation"),
        (name = "Company", description = "Company registry"),
        (name = "Employee", description = "Employee registry"),
        (name = "Time records", description = "Entry/exit punches and reports"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_time_record_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/employees/{employee_id}/time-records",
            "/api/employees/{employee_id}/time-records/open",
            "/api/employees/{employee_id}/time-records/close",
            "/api/employees/{employee_id}/time-records/export",
            "/api/companies/{company_id}/punch",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
