// nueats/functions/src/web/handlers/notification_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::pipelines::notification_pipeline::dispatch_notification;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
  pub order_id: Option<i64>,
  pub new_status: Option<String>,
}

#[instrument(name = "handler::send_order_email", skip(app_state, body))]
pub async fn send_order_email_handler(
  app_state: web::Data<AppState>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let request: NotificationRequest = serde_json::from_slice(&body)
    .map_err(|e| AppError::Notification(format!("Invalid request body: {}", e)))?;
  let (Some(order_id), Some(new_status)) = (request.order_id, request.new_status.filter(|s| !s.trim().is_empty()))
  else {
    return Err(AppError::Notification("Missing required fields".to_string()));
  };

  let outcome = dispatch_notification(app_state.get_ref(), order_id, &new_status, Utc::now()).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": format!("Email sent for order {}", order_id),
    "pdfAttached": outcome.pdf_attached,
    "messageId": outcome.message_id,
  })))
}
