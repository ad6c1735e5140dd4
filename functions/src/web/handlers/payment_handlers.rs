// nueats/functions/src/web/handlers/payment_handlers.rs

use actix_web::http::header::ContentType;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, instrument};

use crate::errors::AppError;
use crate::pipelines::checkout_pipeline::initiate_payment;
use crate::pipelines::contexts::{PaymentRequest, RedirectQuery};
use crate::pipelines::redirect_pipeline::{confirmation_page, reconcile_redirect, redirect_status};
use crate::state::AppState;

#[instrument(name = "handler::initiate_payment", skip(app_state, body), fields(size = body.len()))]
pub async fn initiate_payment_handler(
  app_state: web::Data<AppState>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let request: PaymentRequest = serde_json::from_slice(&body)
    .map_err(|e| AppError::Validation(format!("Invalid payment request: {}", e)))?;

  let initiated = initiate_payment(app_state.get_ref(), request).await?;
  info!(payment_session_id = %initiated.payment_session_id, gateway = initiated.redirect_url.is_some(), "Payment initiated.");

  let mut body = json!({
    "status": "success",
    "payment_session_id": initiated.payment_session_id,
  });
  if let Some(redirect_url) = initiated.redirect_url {
    body["redirect_url"] = json!(redirect_url);
  }
  Ok(HttpResponse::Ok().json(body))
}

/// Always renders a page; reconciliation problems are only logged.
#[instrument(name = "handler::payment_redirect", skip(app_state, req))]
pub async fn payment_redirect_handler(app_state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
  let query = web::Query::<RedirectQuery>::from_query(req.query_string())
    .map(web::Query::into_inner)
    .unwrap_or_default();
  let requested = redirect_status(query.redirect.as_deref());

  let shown = match reconcile_redirect(app_state.get_ref(), query, Utc::now()).await {
    Ok(outcome) => outcome.outcome,
    Err(e) => {
      error!(error = %e, "Redirect reconciliation failed; rendering page anyway.");
      requested
    }
  };

  HttpResponse::Ok()
    .content_type(ContentType::html())
    .body(confirmation_page(shown))
}
