// nueats/functions/src/pipelines/redirect_pipeline.rs

//! Browser return from the hosted checkout.
//!
//! The customer always gets a page: an unknown session or a failed write is
//! logged and the run carries on.

use chrono::{DateTime, Utc};
use nueats_core::{ContextData, Pipeline, PipelineControl, Registry};
use tracing::{error, info, instrument, warn};

use crate::errors::{AppError, Result as AppResult};
use crate::models::PaymentStatus;
use crate::pipelines::contexts::{RedirectCtxData, RedirectQuery};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectOutcome {
  pub outcome: Option<PaymentStatus>,
  pub session_found: bool,
  pub sessions_updated: u64,
}

/// Only the two outcomes the gateway is configured to redirect with are honoured.
pub fn redirect_status(redirect: Option<&str>) -> Option<PaymentStatus> {
  match redirect.map(str::trim) {
    Some("success") => Some(PaymentStatus::Success),
    Some("failed") => Some(PaymentStatus::Failed),
    _ => None,
  }
}

async fn interpret_redirect(ctx: ContextData<RedirectCtxData>) -> AppResult<PipelineControl> {
  let mut guard = ctx.write();
  let outcome = redirect_status(guard.query.redirect.as_deref());
  let has_session = guard.query.session_id.as_deref().is_some_and(|s| !s.trim().is_empty());
  guard.outcome = outcome;
  if outcome.is_none() || !has_session {
    info!(redirect = ?guard.query.redirect, has_session, "Redirect carries nothing to reconcile.");
    return Ok(PipelineControl::Stop);
  }
  Ok(PipelineControl::Continue)
}

async fn apply_redirect_outcome(ctx: ContextData<RedirectCtxData>) -> AppResult<PipelineControl> {
  let (state, session_id, target, now) = {
    let guard = ctx.read();
    (
      guard.app_state.clone(),
      guard.query.session_id.clone().unwrap_or_default(),
      guard.outcome,
      guard.now,
    )
  };
  let Some(target) = target else {
    return Ok(PipelineControl::Stop);
  };

  match state.payments.session_by_checkout_id(&session_id).await {
    Ok(Some(_)) => {
      ctx.write().session_found = true;
    }
    Ok(None) => {
      warn!(checkout_session_id = %session_id, "Redirect for unknown checkout session.");
      return Ok(PipelineControl::Stop);
    }
    Err(e) => {
      error!(checkout_session_id = %session_id, error = %e, "Payment session lookup failed during redirect.");
      return Ok(PipelineControl::Stop);
    }
  }

  match state.payments.transition_by_checkout_id(&session_id, target, now).await {
    Ok(updated) => {
      if updated == 0 {
        info!(checkout_session_id = %session_id, %target, "Session already settled; redirect left it unchanged.");
      }
      ctx.write().sessions_updated = updated;
    }
    Err(e) => {
      error!(checkout_session_id = %session_id, error = %e, "Payment session update failed during redirect.");
    }
  }
  Ok(PipelineControl::Continue)
}

pub fn register_redirect_pipeline(registry: &Registry<AppError>) {
  let mut p = Pipeline::<RedirectCtxData, AppError>::new(&[
    ("interpret_redirect", false, None),
    ("apply_redirect_outcome", false, None),
  ]);

  p.on_step("interpret_redirect", interpret_redirect);
  p.on_step("apply_redirect_outcome", apply_redirect_outcome);

  registry.register_pipeline(p);
  info!("Payment redirect pipeline registered.");
}

#[instrument(skip(state, now), err)]
pub async fn reconcile_redirect(
  state: &AppState,
  query: RedirectQuery,
  now: DateTime<Utc>,
) -> AppResult<RedirectOutcome> {
  let ctx = ContextData::new(RedirectCtxData::new(state.clone(), query, now));
  state.registry.run(ctx.clone()).await?;

  let guard = ctx.read();
  Ok(RedirectOutcome {
    outcome: guard.outcome,
    session_found: guard.session_found,
    sessions_updated: guard.sessions_updated,
  })
}

/// The confirmation page shown after checkout, whatever happened to the session.
pub fn confirmation_page(outcome: Option<PaymentStatus>) -> String {
  let (title, message) = match outcome {
    Some(PaymentStatus::Success) => (
      "Payment successful",
      "Thank you! Your payment went through and the canteen has your order.",
    ),
    Some(PaymentStatus::Failed) => (
      "Payment failed",
      "Your payment did not go through. You can return to the app and try again.",
    ),
    _ => (
      "Payment status",
      "We could not determine the outcome of your payment. Please check your order in the app.",
    ),
  };
  format!(
    "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
     <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"></head>\
     <body style=\"font-family:sans-serif;text-align:center;padding:3rem\">\
     <h1>{title}</h1><p>{message}</p><p>You may now close this window.</p></body></html>",
    title = title,
    message = message
  )
}
