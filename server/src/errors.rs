// server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use paygate::error::{ErrorKind, PaygateError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("IO Error: {0}")]
  Io(#[from] std::io::Error),

  #[error("{source}")]
  Paygate {
    #[from]
    source: PaygateError,
  },
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Paygate {
        source: PaygateError::from(other),
      },
    }
  }
}

/// HTTP status for a failed or gated tool call.
pub fn status_for_kind(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::Validation => StatusCode::BAD_REQUEST,
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
    ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
      AppError::Paygate { source } => status_for_kind(source.kind()),
    }
  }

  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    let body = match self {
      AppError::Validation(m) => json!({"error": m}),
      AppError::NotFound(m) => json!({"error": m}),
      AppError::Config(_) => json!({"error": "Configuration issue"}),
      AppError::Sqlx(_) => json!({"error": "Database operation failed"}),
      AppError::Io(_) => json!({"error": "An internal error occurred"}),
      AppError::Paygate { source } => json!({"error": source.public_message(), "errorKind": source.kind()}),
    };
    HttpResponse::build(self.status_code()).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
