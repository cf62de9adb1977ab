use crate::{
    auth::jwt::verify_token,
    config::Config,
    error::{ApiError, ApiResult},
    model::identity::Identity,
    models::{Claims, TokenType},
};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub identity: Identity,
}

impl AuthUser {
    /// Only access tokens authenticate requests; refresh tokens are for `/auth/refresh`.
    pub fn from_claims(claims: Claims) -> ApiResult<Self> {
        if claims.token_type != TokenType::Access {
            return Err(ApiError::Unauthorized("Access token required".into()));
        }

        let identity = Identity::from_user(claims.is_superuser, claims.employee_id)
            .ok_or_else(|| ApiError::Unauthorized("User has no employee profile".into()))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            identity,
        })
    }

    pub fn require_superuser(&self) -> ApiResult<()> {
        if self.identity.is_superuser() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Superuser only".into()))
        }
    }

    /// Superusers reach every employee; regular users only their own.
    pub fn require_access(&self, employee_id: u64) -> ApiResult<()> {
        if self.identity.can_access(employee_id) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "You cannot access another employee's records".into(),
            ))
        }
    }
}

fn authenticate(req: &HttpRequest) -> ApiResult<AuthUser> {
    // Set by auth_middleware on protected scopes
    if let Some(user) = req.extensions().get::<AuthUser>() {
        return Ok(user.clone());
    }

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing token".into()))?;

    let config = req.app_data::<Data<Config>>().ok_or_else(|| {
        tracing::error!("Config missing from app data");
        ApiError::Internal
    })?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| ApiError::Unauthorized("Invalid token".into()))?;

    AuthUser::from_claims(claims)
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(actix_web::Error::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(is_superuser: bool, employee_id: Option<u64>, token_type: TokenType) -> Claims {
        Claims {
            user_id: 1,
            sub: "12345678901".to_string(),
            is_superuser,
            exp: 0,
            jti: "jti".to_string(),
            token_type,
            employee_id,
        }
    }

    #[test]
    fn refresh_tokens_do_not_authenticate() {
        let err = AuthUser::from_claims(claims(true, None, TokenType::Refresh)).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn regular_user_is_limited_to_own_employee() {
        let user = AuthUser::from_claims(claims(false, Some(3), TokenType::Access)).unwrap();

        assert!(user.require_access(3).is_ok());
        assert!(matches!(user.require_access(4), Err(ApiError::Forbidden(_))));
        assert!(matches!(user.require_superuser(), Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn superuser_passes_every_check() {
        let user = AuthUser::from_claims(claims(true, None, TokenType::Access)).unwrap();

        assert!(user.require_superuser().is_ok());
        assert!(user.require_access(42).is_ok());
    }

    #[test]
    fn unbound_regular_user_is_rejected() {
        let err = AuthUser::from_claims(claims(false, None, TokenType::Access)).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
