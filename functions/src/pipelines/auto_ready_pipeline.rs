// nueats/functions/src/pipelines/auto_ready_pipeline.rs

//! Scheduled sweep promoting `Preparing` orders to `Ready` once their longest
//! item prep time has elapsed, then e-mailing each promoted customer.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use nueats_core::{ContextData, Pipeline, PipelineControl, Registry};
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::errors::{AppError, Result as AppResult};
use crate::models::OrderStatus;
use crate::pipelines::contexts::AutoReadyCtxData;
use crate::pipelines::notification_pipeline::dispatch_notification;
use crate::readiness::select_due_orders;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AutoReadySummary {
  pub evaluated: usize,
  pub promoted_order_ids: Vec<i64>,
  pub failed_notifications: Vec<i64>,
}

async fn load_preparing_orders(ctx: ContextData<AutoReadyCtxData>) -> AppResult<PipelineControl> {
  let state = ctx.read().app_state.clone();
  let orders = state.orders.preparing_orders().await?;
  if orders.is_empty() {
    info!("No preparing orders.");
    return Ok(PipelineControl::Stop);
  }

  let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
  let items = state.orders.items_for_orders(&order_ids).await?;
  let mut menu_ids: Vec<i64> = items.iter().map(|i| i.menu_item_id).collect();
  menu_ids.sort_unstable();
  menu_ids.dedup();
  let menu = state.orders.menu_items(&menu_ids).await?;

  let mut guard = ctx.write();
  guard.orders = orders;
  guard.items = items;
  guard.menu = menu;
  Ok(PipelineControl::Continue)
}

async fn select_due(ctx: ContextData<AutoReadyCtxData>) -> AppResult<PipelineControl> {
  let mut guard = ctx.write();
  let due = select_due_orders(&guard.orders, &guard.items, &guard.menu, guard.now);
  info!(evaluated = guard.orders.len(), due = due.len(), "Evaluated preparing orders.");
  let control = if due.is_empty() {
    PipelineControl::Stop
  } else {
    PipelineControl::Continue
  };
  guard.due_order_ids = due;
  Ok(control)
}

async fn mark_orders_ready(ctx: ContextData<AutoReadyCtxData>) -> AppResult<PipelineControl> {
  let (state, due, now) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.due_order_ids.clone(), guard.now)
  };
  let promoted = state.orders.mark_ready(&due, now).await?;
  if promoted.len() < due.len() {
    info!(
      due = due.len(),
      promoted = promoted.len(),
      "Some due orders changed status before the update; left untouched."
    );
  }
  ctx.write().promoted_order_ids = promoted;
  Ok(PipelineControl::Continue)
}

/// One customer's failed e-mail never blocks the others.
async fn notify_customers(ctx: ContextData<AutoReadyCtxData>) -> AppResult<PipelineControl> {
  let (state, promoted, now) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.promoted_order_ids.clone(), guard.now)
  };

  let sends = promoted.iter().map(|&order_id| {
    let state = state.clone();
    async move {
      let result = dispatch_notification(&state, order_id, OrderStatus::Ready.as_str(), now).await;
      (order_id, result)
    }
  });

  let mut failed = Vec::new();
  for (order_id, result) in join_all(sends).await {
    if let Err(e) = result {
      error!(order_id, error = %e, "Ready notification failed; continuing with remaining orders.");
      failed.push(order_id);
    }
  }
  ctx.write().failed_notifications = failed;
  Ok(PipelineControl::Continue)
}

pub fn register_auto_ready_pipeline(registry: &Registry<AppError>) {
  let mut p = Pipeline::<AutoReadyCtxData, AppError>::new(&[
    ("load_preparing_orders", false, None),
    ("select_due_orders", false, None),
    ("mark_orders_ready", false, None),
    ("notify_customers", true, None),
  ]);

  p.on_step("load_preparing_orders", load_preparing_orders);
  p.on_step("select_due_orders", select_due);
  p.on_step("mark_orders_ready", mark_orders_ready);
  p.on_step("notify_customers", notify_customers);

  registry.register_pipeline(p);
  info!("Auto-ready pipeline registered.");
}

/// Runs one sweep at `now`. Finding nothing to do is a normal, successful outcome.
#[instrument(skip(state), err)]
pub async fn run_auto_ready(state: &AppState, now: DateTime<Utc>) -> AppResult<AutoReadySummary> {
  let ctx = ContextData::new(AutoReadyCtxData::new(state.clone(), now));
  state.registry.run(ctx.clone()).await?;

  let guard = ctx.read();
  let summary = AutoReadySummary {
    evaluated: guard.orders.len(),
    promoted_order_ids: guard.promoted_order_ids.clone(),
    failed_notifications: guard.failed_notifications.clone(),
  };
  info!(
    evaluated = summary.evaluated,
    promoted = summary.promoted_order_ids.len(),
    failed_notifications = summary.failed_notifications.len(),
    "Auto-ready sweep finished."
  );
  Ok(summary)
}
