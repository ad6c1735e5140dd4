// nueats/functions/src/web/handlers/auto_ready_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::pipelines::auto_ready_pipeline::run_auto_ready;
use crate::state::AppState;

/// Triggered by the scheduler with an empty body.
#[instrument(name = "handler::auto_ready_orders", skip(app_state))]
pub async fn auto_ready_orders_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let summary = run_auto_ready(app_state.get_ref(), Utc::now()).await?;
  let updated = summary.promoted_order_ids.len();

  let body = if updated == 0 {
    json!({
      "success": true,
      "message": format!("No orders ready for update ({} evaluated)", summary.evaluated),
      "updatedOrders": 0,
    })
  } else {
    json!({
      "success": true,
      "message": format!("Updated {} of {} preparing orders to Ready", updated, summary.evaluated),
      "updatedOrders": updated,
      "orderIds": summary.promoted_order_ids,
      "failedNotifications": summary.failed_notifications,
    })
  };
  Ok(HttpResponse::Ok().json(body))
}
