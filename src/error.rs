//! HTTP error mapping. Every handler failure becomes a JSON body
//! `{"message": ...}`; storage and rendering faults are logged and
//! redacted to a generic message.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{ledger::LedgerError, repository::StoreError, utils::cpf::InvalidCpf};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal Server Error")]
    Internal,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            LedgerError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            LedgerError::InvalidRange(_) => ApiError::BadRequest(err.to_string()),
            LedgerError::Storage(_) | LedgerError::Render(_) => {
                error!(error = %err, "Ledger operation failed");
                ApiError::Internal
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "Storage lookup failed");
        ApiError::Internal
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        error!(error = %err, "Database error");
        ApiError::Internal
    }
}

impl From<InvalidCpf> for ApiError {
    fn from(err: InvalidCpf) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
