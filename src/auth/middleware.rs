use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

fn reject(req: ServiceRequest, message: &str) -> ServiceResponse<BoxBody> {
    let resp = HttpResponse::Unauthorized().json(json!({ "message": message }));
    req.into_response(resp.map_into_boxed_body())
}

/// Resolves the caller of a protected request, or the reason it is rejected.
fn authenticate(req: &ServiceRequest, config: &Config) -> Result<AuthUser, String> {
    let header = req
        .headers()
        .get("Authorization")
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header encoding")?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or("Authorization header must start with Bearer")?;

    let claims = verify_token(token, &config.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        "Invalid or expired token"
    })?;

    AuthUser::from_claims(claims).map_err(|e| e.to_string())
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    match authenticate(&req, &config) {
        Ok(auth_user) => {
            tracing::debug!(user_id = auth_user.user_id, identity = ?auth_user.identity, "Authenticated request");
            req.extensions_mut().insert(auth_user);
            next.call(req).await
        }
        Err(message) => Ok(reject(req, &message)),
    }
}
