// nueats/functions/src/models/webhook_log.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::FromRow;

/// Append-only audit record of an inbound gateway event.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WebhookLogEntry {
  pub id: i64,
  pub event_type: String,
  pub checkout_session_id: Option<String>,
  pub payload: Json<JsonValue>,
  pub processed: bool,
  pub error: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWebhookLogEntry {
  pub event_type: String,
  pub checkout_session_id: Option<String>,
  pub payload: JsonValue,
  pub error: Option<String>,
}
