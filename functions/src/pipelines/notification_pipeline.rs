// nueats/functions/src/pipelines/notification_pipeline.rs

//! Order status e-mail, with a PDF receipt once the order is completed.
//!
//! Every lookup is mandatory: a missing order, item list or recipient address
//! fails the run before anything is sent.

use chrono::{DateTime, Utc};
use nueats_core::{ContextData, Pipeline, PipelineControl, Registry, SkipCondition};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::errors::{AppError, Result as AppResult};
use crate::models::OrderStatus;
use crate::pipelines::contexts::NotificationCtxData;
use crate::services::email_templates::{render_html, status_message, NotifiedStatus};
use crate::services::mailer::{Attachment, EmailMessage};
use crate::services::receipt::{render_pdf, Receipt};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationOutcome {
  pub message_id: String,
  pub pdf_attached: bool,
}

async fn load_order(ctx: ContextData<NotificationCtxData>) -> AppResult<PipelineControl> {
  let (state, order_id) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.order_id)
  };
  let order = state
    .orders
    .order(order_id)
    .await?
    .ok_or_else(|| AppError::Notification(format!("Order {} not found", order_id)))?;
  ctx.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn load_order_lines(ctx: ContextData<NotificationCtxData>) -> AppResult<PipelineControl> {
  let (state, order_id) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.order_id)
  };
  let lines = state.orders.order_lines(order_id).await?;
  if lines.is_empty() {
    return Err(AppError::Notification(format!(
      "No menu items could be resolved for order {}",
      order_id
    )));
  }
  ctx.write().lines = lines;
  Ok(PipelineControl::Continue)
}

async fn resolve_recipient(ctx: ContextData<NotificationCtxData>) -> AppResult<PipelineControl> {
  let (state, user_id) = {
    let guard = ctx.read();
    let user_id = guard
      .order
      .as_ref()
      .map(|o| o.user_id)
      .ok_or_else(|| AppError::Internal("Order missing when resolving recipient".to_string()))?;
    (guard.app_state.clone(), user_id)
  };
  let email = state
    .users
    .email_for(user_id)
    .await?
    .filter(|e| !e.trim().is_empty())
    .ok_or_else(|| AppError::Notification(format!("No email address on file for user {}", user_id)))?;
  ctx.write().recipient = Some(email);
  Ok(PipelineControl::Continue)
}

async fn render_receipt(ctx: ContextData<NotificationCtxData>) -> AppResult<PipelineControl> {
  let mut guard = ctx.write();
  let order = guard
    .order
    .as_ref()
    .ok_or_else(|| AppError::Internal("Order missing when rendering receipt".to_string()))?;
  let receipt = Receipt::build(order, &guard.lines, &guard.app_state.config.gateway.currency, guard.now);
  let pdf = render_pdf(&receipt)?;
  guard.receipt = Some(Attachment {
    filename: receipt.filename(),
    content: pdf,
  });
  Ok(PipelineControl::Continue)
}

async fn send_email(ctx: ContextData<NotificationCtxData>) -> AppResult<PipelineControl> {
  let (state, message) = {
    let guard = ctx.read();
    let order = guard
      .order
      .as_ref()
      .ok_or_else(|| AppError::Internal("Order missing when composing email".to_string()))?;
    let to = guard
      .recipient
      .clone()
      .ok_or_else(|| AppError::Internal("Recipient missing when composing email".to_string()))?;
    let copy = status_message(order.id, &guard.status);
    let html = render_html(
      order.id,
      &guard.status,
      &copy,
      &guard.lines,
      order.total_amount,
      &guard.app_state.config.gateway.currency,
    );
    let message = EmailMessage {
      to,
      subject: copy.subject,
      html,
      attachments: guard.receipt.iter().cloned().collect(),
    };
    (guard.app_state.clone(), message)
  };

  let message_id = state.mailer.send(message).await?;
  ctx.write().message_id = Some(message_id);
  Ok(PipelineControl::Continue)
}

pub fn register_notification_pipeline(registry: &Registry<AppError>) {
  let not_completed: SkipCondition<NotificationCtxData> =
    Arc::new(|ctx: ContextData<NotificationCtxData>| !ctx.read().status.is(OrderStatus::Completed));

  let mut p = Pipeline::<NotificationCtxData, AppError>::new(&[
    ("load_order", false, None),
    ("load_order_lines", false, None),
    ("resolve_recipient", false, None),
    ("render_receipt", false, Some(not_completed)),
    ("send_email", false, None),
  ]);

  p.on_step("load_order", load_order);
  p.on_step("load_order_lines", load_order_lines);
  p.on_step("resolve_recipient", resolve_recipient);
  p.on_step("render_receipt", render_receipt);
  p.on_step("send_email", send_email);

  registry.register_pipeline(p);
  info!("Order notification pipeline registered.");
}

/// Sends the e-mail for `order_id` having moved to `raw_status`.
#[instrument(skip(state, now), err)]
pub async fn dispatch_notification(
  state: &AppState,
  order_id: i64,
  raw_status: &str,
  now: DateTime<Utc>,
) -> AppResult<NotificationOutcome> {
  let ctx = ContextData::new(NotificationCtxData::new(
    state.clone(),
    order_id,
    NotifiedStatus::parse(raw_status),
    now,
  ));
  state.registry.run(ctx.clone()).await?;

  let guard = ctx.read();
  let message_id = guard
    .message_id
    .clone()
    .ok_or_else(|| AppError::Internal("Notification run ended without sending".to_string()))?;
  info!(%message_id, pdf_attached = guard.receipt.is_some(), "Order notification sent.");
  Ok(NotificationOutcome {
    message_id,
    pdf_attached: guard.receipt.is_some(),
  })
}
