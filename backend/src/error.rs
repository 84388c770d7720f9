//! Crate-wide error type. Recoverable domain conditions (LLM errors, matcher
//! row errors) are modeled as data per the router/validator, not as
//! `ApiError` — this type is reserved for what aborts a stage/run or an HTTP
//! request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    // Config errors 1xxx
    #[error("config missing: {0}")]
    ConfigMissing(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    // Not-found errors 2xxx
    #[error("{0} not found")]
    NotFound(String),

    // Auth errors 3xxx
    #[error("unauthorized")]
    Unauthorized,

    #[error("internal api key not configured")]
    InternalApiKeyMissing,

    // Validation errors 4xxx
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // Persistence / internal errors 5xxx
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn error_code(&self) -> u32 {
        match self {
            Self::ConfigMissing(_) => 1001,
            Self::InvalidConfig(_) => 1002,
            Self::NotFound(_) => 2001,
            Self::Unauthorized => 3001,
            Self::InternalApiKeyMissing => 3002,
            Self::InvalidRequest(_) => 4001,
            Self::Database(_) => 5001,
            Self::Migration(_) => 5002,
            Self::Other(_) => 5000,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_request(what: impl Into<String>) -> Self {
        Self::InvalidRequest(what.into())
    }
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    code: u32,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        let status = match code {
            1000..=1999 => StatusCode::BAD_REQUEST,
            2000..=2999 => StatusCode::NOT_FOUND,
            3000..=3999 => StatusCode::UNAUTHORIZED,
            4000..=4999 => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ApiErrorBody { code, message: self.to_string() };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
