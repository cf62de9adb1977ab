use crate::{
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::company::Company,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateCompany {
    #[schema(example = "Padaria Central")]
    pub name: String,
    #[schema(example = "Rua das Flores")]
    pub street: String,
    #[schema(example = 120)]
    pub number: i32,
    #[schema(example = "Loja 2", nullable = true)]
    pub complement: Option<String>,
    #[schema(example = "Centro")]
    pub district: String,
    #[schema(example = "Curitiba")]
    pub city: String,
    #[schema(example = "PR")]
    pub state: String,
    #[schema(example = "80010-000")]
    pub postal_code: String,
}

impl CreateCompany {
    /// Returns the postal code reduced to its eight digits.
    fn validate(&self) -> ApiResult<String> {
        let required = [
            ("name", &self.name),
            ("street", &self.street),
            ("district", &self.district),
            ("city", &self.city),
            ("state", &self.state),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ApiError::BadRequest(format!("{field} must not be empty")));
        }

        let postal_code: String = self
            .postal_code
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if postal_code.len() != 8 {
            return Err(ApiError::BadRequest(
                "postal_code must contain 8 digits".into(),
            ));
        }
        Ok(postal_code)
    }
}

/// Create Company
#[utoipa::path(
    post,
    path = "/api/companies",
    request_body = CreateCompany,
    responses(
        (status = 201, description = "Company created", body = Company),
        (status = 400, description = "Validation failed", body = crate::models::MessageResponse),
        (status = 403, description = "Superuser only", body = crate::models::MessageResponse),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn create_company(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCompany>,
) -> ApiResult<HttpResponse> {
    auth.require_superuser()?;
    let postal_code = payload.validate()?;
    let complement = payload
        .complement
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    let result = sqlx::query(
        r#"
        INSERT INTO companies
        (name, street, number, complement, district, city, state, postal_code)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.street.trim())
    .bind(payload.number)
    .bind(&complement)
    .bind(payload.district.trim())
    .bind(payload.city.trim())
    .bind(payload.state.trim())
    .bind(&postal_code)
    .execute(pool.get_ref())
    .await?;

    let company = Company {
        id: result.last_insert_id(),
        name: payload.name.trim().to_string(),
        street: payload.street.trim().to_string(),
        number: payload.number,
        complement,
        district: payload.district.trim().to_string(),
        city: payload.city.trim().to_string(),
        state: payload.state.trim().to_string(),
        postal_code,
    };
    info!(company_id = company.id, "Company created");

    Ok(HttpResponse::Created().json(company))
}

/// List Companies
#[utoipa::path(
    get,
    path = "/api/companies",
    responses(
        (status = 200, description = "All companies by name", body = Vec<Company>),
        (status = 403, description = "Superuser only", body = crate::models::MessageResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn list_companies(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> ApiResult<HttpResponse> {
    auth.require_superuser()?;

    let companies = sqlx::query_as::<_, Company>(
        r#"
        SELECT id, name, street, number, complement, district, city, state, postal_code
        FROM companies
        ORDER BY name
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(companies))
}
