// nueats/functions/src/pipelines/checkout_pipeline.rs

//! Payment initiation.
//!
//! Cash is settled on the spot: one `success` session, no gateway call.
//! Gateway payments create a hosted checkout first and persist a `pending`
//! session only once the processor has accepted it.

use nueats_core::{ContextData, Pipeline, PipelineControl, Registry, SkipCondition};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result as AppResult};
use crate::models::{NewPaymentSession, PaymentMethod};
use crate::pipelines::contexts::{CheckoutCtxData, PaymentRequest, ValidatedPayment};
use crate::services::payment_gateway::CheckoutRequest;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PaymentInitiated {
  pub payment_session_id: Uuid,
  pub redirect_url: Option<String>,
}

pub fn validate_payment_request(request: &PaymentRequest) -> AppResult<ValidatedPayment> {
  let amount = request
    .amount
    .ok_or_else(|| AppError::Validation("Missing amount".to_string()))?;
  if amount < Decimal::ONE {
    return Err(AppError::Validation(format!(
      "Invalid amount {}: must be at least 1",
      amount
    )));
  }
  let method = match request.payment_method_type.as_deref() {
    None => return Err(AppError::Validation("Missing payment_method_type".to_string())),
    Some(raw) => raw
      .parse::<PaymentMethod>()
      .map_err(|_| AppError::Validation(format!("Unsupported payment method '{}'", raw)))?,
  };
  let user_id = request
    .user_id
    .ok_or_else(|| AppError::Validation("Missing user_id".to_string()))?;

  Ok(ValidatedPayment {
    amount,
    method,
    order_id: request.order_id,
    user_id,
  })
}

async fn validate_request(ctx: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let mut guard = ctx.write();
  let validated = validate_payment_request(&guard.request)?;
  guard.validated = Some(validated);
  Ok(PipelineControl::Continue)
}

fn validated(ctx: &ContextData<CheckoutCtxData>) -> AppResult<ValidatedPayment> {
  ctx
    .read()
    .validated
    .clone()
    .ok_or_else(|| AppError::Internal("Payment request was not validated".to_string()))
}

async fn create_checkout_session(ctx: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let payment = validated(&ctx)?;
  let state = ctx.read().app_state.clone();
  let session = state
    .gateway
    .create_checkout_session(&CheckoutRequest {
      order_id: payment.order_id,
      amount: payment.amount,
    })
    .await?;
  ctx.write().checkout_session = Some(session);
  Ok(PipelineControl::Continue)
}

async fn persist_payment_session(ctx: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let payment = validated(&ctx)?;
  let (state, checkout) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.checkout_session.clone())
  };

  let new_session = match (payment.method, checkout) {
    (PaymentMethod::Cash, _) => NewPaymentSession::settled_cash(payment.order_id, payment.user_id, payment.amount),
    (PaymentMethod::Gateway, Some(checkout)) => {
      NewPaymentSession::awaiting_gateway(payment.order_id, payment.user_id, payment.amount, checkout.id)
    }
    (PaymentMethod::Gateway, None) => {
      return Err(AppError::Internal("Gateway payment without a checkout session".to_string()));
    }
  };

  let stored = state.payments.insert_session(new_session).await?;
  info!(payment_session_id = %stored.id, status = %stored.status, "Payment session stored.");
  ctx.write().payment_session = Some(stored);
  Ok(PipelineControl::Continue)
}

pub fn register_checkout_pipeline(registry: &Registry<AppError>) {
  let is_cash: SkipCondition<CheckoutCtxData> = Arc::new(|ctx: ContextData<CheckoutCtxData>| {
    matches!(
      ctx.read().validated.as_ref().map(|v| v.method),
      Some(PaymentMethod::Cash)
    )
  });

  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("validate_request", false, None),
    ("create_checkout_session", false, Some(is_cash)),
    ("persist_payment_session", false, None),
  ]);

  p.on_step("validate_request", validate_request);
  p.on_step("create_checkout_session", create_checkout_session);
  p.on_step("persist_payment_session", persist_payment_session);

  registry.register_pipeline(p);
  info!("Checkout pipeline registered.");
}

#[instrument(skip(state, request), fields(method = ?request.payment_method_type, order_id = ?request.order_id), err)]
pub async fn initiate_payment(state: &AppState, request: PaymentRequest) -> AppResult<PaymentInitiated> {
  let ctx = ContextData::new(CheckoutCtxData::new(state.clone(), request));
  state.registry.run(ctx.clone()).await?;

  let guard = ctx.read();
  let session = guard
    .payment_session
    .as_ref()
    .ok_or_else(|| AppError::Internal("Checkout run ended without a payment session".to_string()))?;
  Ok(PaymentInitiated {
    payment_session_id: session.id,
    redirect_url: guard.checkout_session.as_ref().map(|c| c.checkout_url.clone()),
  })
}
