// nueats/functions/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use nueats_core::FlowError;

#[derive(Debug, Error)]
pub enum AppError {
  /// Malformed request fields. No side effects have happened.
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Unauthorized: {0}")]
  Unauthorized(String),

  #[error("Method Not Allowed")]
  MethodNotAllowed,

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Database(#[from] sqlx::Error),

  /// The payment processor was unreachable or rejected the request.
  #[error("Payment Gateway Error: {0}")]
  Gateway(String),

  #[error("Mail Relay Error: {0}")]
  Mail(String),

  #[error("Receipt Generation Error: {0}")]
  Receipt(String),

  /// Data needed for an order e-mail could not be resolved.
  #[error("{0}")]
  Notification(String),

  #[error("Webhook Error: {0}")]
  Webhook(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Database(sqlx_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl AppError {
  /// Short, client-facing summary. The full upstream message goes in `details`.
  fn summary(&self) -> String {
    match self {
      AppError::Validation(m) | AppError::Unauthorized(m) | AppError::Notification(m) => m.clone(),
      AppError::MethodNotAllowed => "Method not allowed".to_string(),
      AppError::Config(_) => "Configuration issue".to_string(),
      AppError::Database(_) => "Database operation failed".to_string(),
      AppError::Gateway(_) => "Payment gateway error".to_string(),
      AppError::Mail(_) => "Email service error".to_string(),
      AppError::Receipt(_) => "Receipt generation failed".to_string(),
      AppError::Webhook(_) => "Webhook processing failed".to_string(),
      AppError::Workflow { .. } => "Workflow processing error".to_string(),
      AppError::Internal(_) => "An internal error occurred".to_string(),
    }
  }

  fn details(&self) -> Option<String> {
    match self {
      AppError::Validation(_) | AppError::Unauthorized(_) | AppError::Notification(_) | AppError::MethodNotAllowed => {
        None
      }
      AppError::Database(e) => Some(e.to_string()),
      AppError::Workflow { source } => Some(source.to_string()),
      AppError::Config(m)
      | AppError::Gateway(m)
      | AppError::Mail(m)
      | AppError::Receipt(m)
      | AppError::Webhook(m)
      | AppError::Internal(m) => Some(m.clone()),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    let body = match self.details() {
      Some(details) => json!({ "error": self.summary(), "details": details }),
      None => json!({ "error": self.summary() }),
    };
    HttpResponse::build(self.status_code()).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
