use crate::{
    auth::{
        auth::AuthUser,
        password::{MIN_PASSWORD_LEN, hash_password},
    },
    error::{ApiError, ApiResult},
    model::employee::Employee,
    models::MessageResponse,
    repository::EmployeeDirectory,
    utils::cpf,
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "Maria Souza")]
    pub name: String,
    #[schema(example = "maria.souza@company.com")]
    pub email: String,
    #[schema(example = "123.456.789-01")]
    pub cpf: String,
    #[schema(example = "s3cret-pass", min_length = 8)]
    pub password: String,
}

/// Validated employee fields, CPF normalized.
#[derive(Debug, PartialEq)]
struct NewEmployee {
    name: String,
    email: String,
    cpf: String,
}

impl CreateEmployee {
    fn validate(&self) -> ApiResult<NewEmployee> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ApiError::BadRequest("name must not be empty".into()));
        }
        let email = validate_email(&self.email)?;
        let cpf = cpf::normalize(&self.cpf)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::BadRequest(format!(
                "password must contain at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        Ok(NewEmployee {
            name: name.to_string(),
            email,
            cpf,
        })
    }
}

fn validate_email(raw: &str) -> ApiResult<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(ApiError::BadRequest("email is not valid".into())),
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub name: Option<String>,
    pub email: Option<String>,
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Create Employee with its login user
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/employees",
    params(("company_id" = u64, Path, description = "Company ID")),
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Validation failed", body = MessageResponse),
        (status = 403, description = "Superuser only", body = MessageResponse),
        (status = 404, description = "Company not found", body = MessageResponse),
        (status = 409, description = "CPF or email already registered", body = MessageResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CreateEmployee>,
) -> ApiResult<HttpResponse> {
    auth.require_superuser()?;
    let company_id = path.into_inner();
    let new = payload.validate()?;

    let hashed = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ApiError::Internal
    })?;

    let mut tx = pool.begin().await?;

    let companies = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM companies WHERE id = ?")
        .bind(company_id)
        .fetch_one(&mut *tx)
        .await?;
    if companies == 0 {
        return Err(ApiError::NotFound("Company not found".into()));
    }

    let inserted = sqlx::query("INSERT INTO employees (name, email, company_id) VALUES (?, ?, ?)")
        .bind(&new.name)
        .bind(&new.email)
        .bind(company_id)
        .execute(&mut *tx)
        .await;
    let employee_id = match inserted {
        Ok(done) => done.last_insert_id(),
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::Conflict(
                "An employee with this email already exists".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let user = sqlx::query("INSERT INTO users (cpf, password, employee_id) VALUES (?, ?, ?)")
        .bind(&new.cpf)
        .bind(&hashed)
        .bind(employee_id)
        .execute(&mut *tx)
        .await;
    if let Err(e) = user {
        // dropping tx rolls back the employee row
        return Err(if is_unique_violation(&e) {
            ApiError::Conflict("A user with this CPF is already registered".into())
        } else {
            e.into()
        });
    }

    tx.commit().await?;
    info!(employee_id, company_id, "Employee created");

    Ok(HttpResponse::Created().json(Employee {
        id: employee_id,
        name: new.name,
        email: new.email,
        company_id,
        cpf: new.cpf,
    }))
}

/// List Employees of a company
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/employees",
    params(
        ("company_id" = u64, Path, description = "Company ID"),
        EmployeeQuery
    ),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 403, description = "Superuser only", body = MessageResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<EmployeeQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_superuser()?;
    let company_id = path.into_inner();

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM employees WHERE company_id = ?",
    )
    .bind(company_id)
    .fetch_one(pool.get_ref())
    .await?;

    debug!(company_id, page, per_page, offset, "Fetching employees");
    let employees = sqlx::query_as::<_, Employee>(
        r#"
        SELECT e.id, e.name, e.email, e.company_id, u.cpf
        FROM employees e
        JOIN users u ON u.employee_id = e.id
        WHERE e.company_id = ?
        ORDER BY e.name
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(company_id)
    .bind(per_page as i64)
    .bind(offset as i64)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 403, description = "Forbidden", body = MessageResponse),
        (status = 404, description = "Employee not found", body = MessageResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    directory: web::Data<dyn EmployeeDirectory>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_access(employee_id)?;

    match directory.find(employee_id).await? {
        Some(employee) => Ok(HttpResponse::Ok().json(employee)),
        None => Err(ApiError::NotFound("Employee not found".into())),
    }
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Validation failed", body = MessageResponse),
        (status = 404, description = "Employee not found", body = MessageResponse),
        (status = 409, description = "Email already registered", body = MessageResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    directory: web::Data<dyn EmployeeDirectory>,
    path: web::Path<u64>,
    body: web::Json<UpdateEmployee>,
) -> ApiResult<HttpResponse> {
    auth.require_superuser()?;
    let employee_id = path.into_inner();

    let name = match body.name.as_deref().map(str::trim) {
        Some("") => return Err(ApiError::BadRequest("name must not be empty".into())),
        other => other,
    };
    let email = body.email.as_deref().map(validate_email).transpose()?;

    if directory.find(employee_id).await?.is_none() {
        return Err(ApiError::NotFound("Employee not found".into()));
    }

    let result = sqlx::query(
        r#"
        UPDATE employees
        SET name = COALESCE(?, name), email = COALESCE(?, email)
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(employee_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::Conflict(
                "An employee with this email already exists".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    let updated = directory
        .find(employee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Delete Employee without time records
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Successfully deleted", body = MessageResponse),
        (status = 404, description = "Employee not found", body = MessageResponse),
        (status = 409, description = "Employee has time records", body = MessageResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require_superuser()?;
    let employee_id = path.into_inner();

    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) if res.rows_affected() == 0 => {
            Err(ApiError::NotFound("Employee not found".into()))
        }
        Ok(_) => {
            info!(employee_id, "Employee deleted");
            Ok(HttpResponse::Ok().json(MessageResponse::new("Successfully deleted")))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
            Err(ApiError::Conflict(
                "Employee has time records and cannot be deleted".into(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(cpf: &str, email: &str, password: &str) -> CreateEmployee {
        CreateEmployee {
            name: "  Maria Souza ".into(),
            email: email.into(),
            cpf: cpf.into(),
            password: password.into(),
        }
    }

    #[test]
    fn valid_payload_is_normalized() {
        let new = payload("123.456.789-01", " Maria@Company.com ", "longenough")
            .validate()
            .unwrap();

        assert_eq!(
            new,
            NewEmployee {
                name: "Maria Souza".into(),
                email: "maria@company.com".into(),
                cpf: "12345678901".into(),
            }
        );
    }

    #[test]
    fn short_password_is_rejected() {
        let err = payload("12345678901", "m@c.com", "short").validate().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("8 characters")));
    }

    #[test]
    fn malformed_cpf_is_rejected() {
        let err = payload("1234", "m@c.com", "longenough").validate().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn malformed_email_is_rejected() {
        for email in ["", "maria", "@company.com", "maria@company"] {
            assert!(validate_email(email).is_err(), "{email} should fail");
        }
    }
}
