use crate::{
    auth::{
        jwt::{TokenSubject, generate_access_token, generate_refresh_token, verify_token},
        password::{MIN_PASSWORD_LEN, hash_password, verify_password},
    },
    config::{BootstrapSuperuser, Config},
    error::{ApiError, ApiResult},
    models::{LoginReqDto, TokenPair, TokenType, UserSql},
    utils::cpf,
};
use actix_web::{HttpRequest, HttpResponse, web};
use anyhow::Context;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument, warn};

const INVALID_CREDENTIALS: &str = "Invalid CPF and/or password";

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Issue a token pair and persist the refresh token's jti.
async fn issue_tokens(
    subject: &TokenSubject,
    pool: &MySqlPool,
    config: &Config,
) -> ApiResult<TokenPair> {
    let token_error = |e: jsonwebtoken::errors::Error| {
        error!(error = %e, "Failed to sign token");
        ApiError::Internal
    };

    let access_token =
        generate_access_token(subject, &config.jwt_secret, config.access_token_ttl)
            .map_err(token_error)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(subject, &config.jwt_secret, config.refresh_token_ttl)
            .map_err(token_error)?;

    debug!(user_id = subject.user_id, jti = %refresh_claims.jti, "Storing refresh token");

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(subject.user_id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool)
    .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Login with CPF and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPair),
        (status = 400, description = "Malformed CPF", body = crate::models::MessageResponse),
        (status = 401, description = "Invalid credentials", body = crate::models::MessageResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(pool, config, user))]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    info!("Login request received");

    let cpf = cpf::normalize(&user.cpf)?;
    if user.password.is_empty() {
        return Err(ApiError::BadRequest("Password required".into()));
    }

    let db_user = sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, cpf, password, is_superuser, employee_id, is_active
        FROM users
        WHERE cpf = ?
        "#,
    )
    .bind(&cpf)
    .fetch_optional(pool.get_ref())
    .await?;

    let db_user = match db_user {
        Some(u) if u.is_active => u,
        _ => {
            info!("Invalid credentials: user not found or inactive");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let subject = TokenSubject {
        user_id: db_user.id,
        cpf: db_user.cpf,
        is_superuser: db_user.is_superuser,
        employee_id: db_user.employee_id,
    };
    let tokens = issue_tokens(&subject, pool.get_ref(), &config).await?;

    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        // not fatal for the login itself
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = db_user.id, "Login successful");
    Ok(HttpResponse::Ok().json(tokens))
}

/// Rotate a refresh token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Refresh token invalid or revoked", body = crate::models::MessageResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    let unauthorized = || ApiError::Unauthorized("Invalid refresh token".into());

    let token = bearer(&req).ok_or_else(unauthorized)?;
    let claims = verify_token(token, &config.jwt_secret).map_err(|_| unauthorized())?;
    if claims.token_type != TokenType::Refresh {
        return Err(unauthorized());
    }

    // Revoking and checking in one statement keeps a token single-use
    let revoked = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = TRUE
        WHERE jti = ?
        AND revoked = FALSE
        AND expires_at > NOW()
        "#,
    )
    .bind(&claims.jti)
    .execute(pool.get_ref())
    .await?;

    if revoked.rows_affected() == 0 {
        warn!(user_id = claims.user_id, "Refresh token reused or unknown");
        return Err(unauthorized());
    }

    let tokens = issue_tokens(&TokenSubject::from(&claims), pool.get_ref(), &config).await?;
    Ok(HttpResponse::Ok().json(tokens))
}

/// Revoke a refresh token
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out, even if the token was unknown")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    let claims = match bearer(&req).map(|t| verify_token(t, &config.jwt_secret)) {
        Some(Ok(c)) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}

/// Normalized CPF of the bootstrap superuser, once both values pass the
/// rules applied to employee logins.
fn validate_bootstrap(bootstrap: &BootstrapSuperuser) -> anyhow::Result<String> {
    let cpf = cpf::normalize(&bootstrap.cpf).context("BOOTSTRAP_SUPERUSER_CPF is invalid")?;
    if bootstrap.password.chars().count() < MIN_PASSWORD_LEN {
        anyhow::bail!(
            "BOOTSTRAP_SUPERUSER_PASSWORD must contain at least {MIN_PASSWORD_LEN} characters"
        );
    }
    Ok(cpf)
}

/// Create the configured superuser unless a user with that CPF exists.
pub async fn bootstrap_superuser(
    pool: &MySqlPool,
    bootstrap: &BootstrapSuperuser,
) -> anyhow::Result<()> {
    let cpf = validate_bootstrap(bootstrap)?;
    let hashed = hash_password(&bootstrap.password)
        .map_err(|e| anyhow::anyhow!("failed to hash bootstrap password: {e}"))?;

    let result = sqlx::query(
        r#"
        INSERT IGNORE INTO users (cpf, password, is_superuser)
        VALUES (?, ?, TRUE)
        "#,
    )
    .bind(&cpf)
    .bind(hashed)
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        info!("Bootstrap superuser created");
    } else {
        debug!("Bootstrap superuser already present");
    }
    Ok(())
}
