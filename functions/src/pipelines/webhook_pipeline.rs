// nueats/functions/src/pipelines/webhook_pipeline.rs

//! Server-to-server payment events.
//!
//! Every delivery is written to `webhook_logs` before any session is touched,
//! so a failure further down still leaves the event on record. Session writes go
//! through the payment transition guard, which makes re-delivered and
//! out-of-order events harmless.

use actix_web::web::Bytes;
use chrono::{DateTime, Utc};
use nueats_core::{ContextData, Pipeline, PipelineControl, Registry, SkipCondition};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::errors::{AppError, Result as AppResult};
use crate::models::{NewWebhookLogEntry, PaymentStatus};
use crate::pipelines::contexts::WebhookCtxData;
use crate::services::gateway_events::WebhookEvent;
use crate::services::webhook_signature;
use crate::state::AppState;

/// Event type recorded for bodies that are not JSON at all.
pub const UNPARSEABLE_EVENT: &str = "unparseable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookOutcome {
  pub event_type: String,
  pub checkout_session_id: Option<String>,
  pub target_status: Option<PaymentStatus>,
  pub sessions_updated: u64,
  pub processed: bool,
}

async fn verify_signature(ctx: ContextData<WebhookCtxData>) -> AppResult<PipelineControl> {
  let guard = ctx.read();
  if let Some(secret) = guard.app_state.config.gateway.webhook_secret.as_deref() {
    webhook_signature::verify(secret, guard.signature_header.as_deref(), &guard.raw_payload).map_err(|e| {
      warn!(error = %e, "Rejected webhook with bad signature.");
      e
    })?;
  }
  Ok(PipelineControl::Continue)
}

async fn parse_event(ctx: ContextData<WebhookCtxData>) -> AppResult<PipelineControl> {
  let mut guard = ctx.write();
  match serde_json::from_slice::<JsonValue>(&guard.raw_payload) {
    Ok(payload) => {
      let event = WebhookEvent::from_payload(&payload);
      guard.target_status = event.kind().map(|kind| kind.target_status());
      info!(
        event_type = %event.event_type,
        checkout_session_id = ?event.checkout_session_id,
        mapped = guard.target_status.is_some(),
        "Webhook event parsed."
      );
      guard.payload = Some(payload);
      guard.event = Some(event);
    }
    Err(e) => {
      warn!(error = %e, size = guard.raw_payload.len(), "Webhook body is not valid JSON.");
      guard.parse_error = Some(format!("Invalid JSON payload: {}", e));
    }
  }
  Ok(PipelineControl::Continue)
}

async fn record_audit_entry(ctx: ContextData<WebhookCtxData>) -> AppResult<PipelineControl> {
  let (state, entry, parse_error) = {
    let guard = ctx.read();
    let entry = match (&guard.event, &guard.payload) {
      (Some(event), Some(payload)) => NewWebhookLogEntry {
        event_type: event.event_type.clone(),
        checkout_session_id: event.checkout_session_id.clone(),
        payload: payload.clone(),
        error: None,
      },
      _ => NewWebhookLogEntry {
        event_type: UNPARSEABLE_EVENT.to_string(),
        checkout_session_id: None,
        payload: JsonValue::String(String::from_utf8_lossy(&guard.raw_payload).into_owned()),
        error: guard.parse_error.clone(),
      },
    };
    (guard.app_state.clone(), entry, guard.parse_error.clone())
  };

  let log_id = state.payments.append_webhook_log(entry).await?;
  ctx.write().log_id = Some(log_id);

  if let Some(parse_error) = parse_error {
    return Err(AppError::Webhook(parse_error));
  }

  let (target, session_id, event_type) = {
    let guard = ctx.read();
    let event = guard.event.as_ref();
    (
      guard.target_status,
      event.and_then(|e| e.checkout_session_id.clone()),
      event.map(|e| e.event_type.clone()).unwrap_or_default(),
    )
  };
  if target.is_none() {
    info!(log_id, %event_type, "Unhandled event type acknowledged.");
    return Ok(PipelineControl::Stop);
  }
  if session_id.is_none() {
    warn!(log_id, %event_type, "Payment event carries no checkout session id; nothing to reconcile.");
    return Ok(PipelineControl::Stop);
  }
  Ok(PipelineControl::Continue)
}

async fn apply_payment_transition(ctx: ContextData<WebhookCtxData>) -> AppResult<PipelineControl> {
  let (state, session_id, target, now) = {
    let guard = ctx.read();
    let session_id = guard.event.as_ref().and_then(|e| e.checkout_session_id.clone());
    (guard.app_state.clone(), session_id, guard.target_status, guard.now)
  };
  let (Some(session_id), Some(target)) = (session_id, target) else {
    return Ok(PipelineControl::Stop);
  };

  let updated = state.payments.transition_by_checkout_id(&session_id, target, now).await?;
  ctx.write().sessions_updated = updated;
  if updated == 0 {
    warn!(
      checkout_session_id = %session_id,
      %target,
      "No payment session accepted this event (unknown session or already settled)."
    );
    return Ok(PipelineControl::Stop);
  }
  info!(checkout_session_id = %session_id, %target, "Payment session reconciled.");
  Ok(PipelineControl::Continue)
}

async fn mark_processed(ctx: ContextData<WebhookCtxData>) -> AppResult<PipelineControl> {
  let (state, log_id) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.log_id)
  };
  let log_id = log_id.ok_or_else(|| AppError::Internal("Webhook audit entry missing".to_string()))?;
  state.payments.mark_webhook_processed(log_id).await?;
  ctx.write().processed = true;
  Ok(PipelineControl::Continue)
}

pub fn register_webhook_pipeline(registry: &Registry<AppError>) {
  let unsigned: SkipCondition<WebhookCtxData> = Arc::new(|ctx: ContextData<WebhookCtxData>| {
    ctx.read().app_state.config.gateway.webhook_secret.is_none()
  });

  let mut p = Pipeline::<WebhookCtxData, AppError>::new(&[
    ("verify_signature", false, Some(unsigned)),
    ("parse_event", false, None),
    ("record_audit_entry", false, None),
    ("apply_payment_transition", false, None),
    ("mark_processed", false, None),
  ]);

  p.on_step("verify_signature", verify_signature);
  p.on_step("parse_event", parse_event);
  p.on_step("record_audit_entry", record_audit_entry);
  p.on_step("apply_payment_transition", apply_payment_transition);
  p.on_step("mark_processed", mark_processed);

  registry.register_pipeline(p);
  info!("Payment webhook pipeline registered.");
}

#[instrument(skip(state, raw_payload, signature_header, now), fields(size = raw_payload.len()), err)]
pub async fn process_webhook(
  state: &AppState,
  raw_payload: Bytes,
  signature_header: Option<String>,
  now: DateTime<Utc>,
) -> AppResult<WebhookOutcome> {
  let ctx = ContextData::new(WebhookCtxData::new(state.clone(), raw_payload, signature_header, now));
  state.registry.run(ctx.clone()).await?;

  let guard = ctx.read();
  Ok(WebhookOutcome {
    event_type: guard
      .event
      .as_ref()
      .map(|e| e.event_type.clone())
      .unwrap_or_else(|| UNPARSEABLE_EVENT.to_string()),
    checkout_session_id: guard.event.as_ref().and_then(|e| e.checkout_session_id.clone()),
    target_status: guard.target_status,
    sessions_updated: guard.sessions_updated,
    processed: guard.processed,
  })
}
