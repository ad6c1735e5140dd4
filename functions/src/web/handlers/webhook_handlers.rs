// nueats/functions/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::pipelines::webhook_pipeline::process_webhook;
use crate::services::webhook_signature::SIGNATURE_HEADER;
use crate::state::AppState;

#[instrument(
  name = "handler::payment_webhook",
  skip(app_state, req, body),
  fields(size = body.len(), signed = req.headers().contains_key(SIGNATURE_HEADER))
)]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature_header = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|h| h.to_str().ok())
    .map(String::from);

  let outcome = process_webhook(app_state.get_ref(), body, signature_header, Utc::now()).await?;
  info!(
    event_type = %outcome.event_type,
    checkout_session_id = ?outcome.checkout_session_id,
    processed = outcome.processed,
    "Webhook acknowledged."
  );

  let message = match (outcome.target_status, outcome.processed) {
    (Some(_), true) => format!("Webhook processed: {}", outcome.event_type),
    (Some(_), false) => format!("Webhook received, no payment session updated: {}", outcome.event_type),
    (None, _) => format!("Webhook received, event type not handled: {}", outcome.event_type),
  };
  Ok(HttpResponse::Ok().json(json!({ "message": message })))
}
