// nueats/functions/src/pipelines/contexts.rs

//! Data carried through each pipeline run.
//! Handlers receive these wrapped in `nueats_core::ContextData`.

use actix_web::web::Bytes;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::{MenuItem, Order, OrderItem, OrderLine, PaymentMethod, PaymentSession, PaymentStatus};
use crate::services::email_templates::NotifiedStatus;
use crate::services::gateway_events::WebhookEvent;
use crate::services::mailer::Attachment;
use crate::services::payment_gateway::CheckoutSession;
use crate::state::AppState;

// --- Auto-ready sweep ---

#[derive(Clone)]
pub struct AutoReadyCtxData {
  pub app_state: AppState,
  pub now: DateTime<Utc>,
  pub orders: Vec<Order>,
  pub items: Vec<OrderItem>,
  pub menu: Vec<MenuItem>,
  pub due_order_ids: Vec<i64>,
  /// Ids the guarded update actually changed; a concurrent sweep may have taken some.
  pub promoted_order_ids: Vec<i64>,
  pub failed_notifications: Vec<i64>,
}

impl AutoReadyCtxData {
  pub fn new(app_state: AppState, now: DateTime<Utc>) -> Self {
    Self {
      app_state,
      now,
      orders: Vec::new(),
      items: Vec::new(),
      menu: Vec::new(),
      due_order_ids: Vec::new(),
      promoted_order_ids: Vec::new(),
      failed_notifications: Vec::new(),
    }
  }
}

// --- Payment initiation ---

/// Body of `POST /payment`. Every field is optional here so that a missing one
/// becomes a validation message instead of a deserialisation failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentRequest {
  pub amount: Option<Decimal>,
  pub payment_method_type: Option<String>,
  pub order_id: Option<i64>,
  pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct ValidatedPayment {
  pub amount: Decimal,
  pub method: PaymentMethod,
  pub order_id: Option<i64>,
  pub user_id: Uuid,
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub request: PaymentRequest,
  pub validated: Option<ValidatedPayment>,
  pub checkout_session: Option<CheckoutSession>,
  pub payment_session: Option<PaymentSession>,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, request: PaymentRequest) -> Self {
    Self {
      app_state,
      request,
      validated: None,
      checkout_session: None,
      payment_session: None,
    }
  }
}

// --- Browser redirect back from the hosted checkout ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedirectQuery {
  pub redirect: Option<String>,
  pub session_id: Option<String>,
}

#[derive(Clone)]
pub struct RedirectCtxData {
  pub app_state: AppState,
  pub now: DateTime<Utc>,
  pub query: RedirectQuery,
  pub outcome: Option<PaymentStatus>,
  pub session_found: bool,
  pub sessions_updated: u64,
}

impl RedirectCtxData {
  pub fn new(app_state: AppState, query: RedirectQuery, now: DateTime<Utc>) -> Self {
    Self {
      app_state,
      now,
      query,
      outcome: None,
      session_found: false,
      sessions_updated: 0,
    }
  }
}

// --- Gateway webhook ---

#[derive(Clone)]
pub struct WebhookCtxData {
  pub app_state: AppState,
  pub now: DateTime<Utc>,
  pub raw_payload: Bytes,
  pub signature_header: Option<String>,
  pub payload: Option<JsonValue>,
  pub parse_error: Option<String>,
  pub event: Option<WebhookEvent>,
  pub log_id: Option<i64>,
  pub target_status: Option<PaymentStatus>,
  pub sessions_updated: u64,
  pub processed: bool,
}

impl WebhookCtxData {
  pub fn new(app_state: AppState, raw_payload: Bytes, signature_header: Option<String>, now: DateTime<Utc>) -> Self {
    Self {
      app_state,
      now,
      raw_payload,
      signature_header,
      payload: None,
      parse_error: None,
      event: None,
      log_id: None,
      target_status: None,
      sessions_updated: 0,
      processed: false,
    }
  }
}

// --- Order e-mail ---

#[derive(Clone)]
pub struct NotificationCtxData {
  pub app_state: AppState,
  pub now: DateTime<Utc>,
  pub order_id: i64,
  pub status: NotifiedStatus,
  pub order: Option<Order>,
  pub lines: Vec<OrderLine>,
  pub recipient: Option<String>,
  pub receipt: Option<Attachment>,
  pub message_id: Option<String>,
}

impl NotificationCtxData {
  pub fn new(app_state: AppState, order_id: i64, status: NotifiedStatus, now: DateTime<Utc>) -> Self {
    Self {
      app_state,
      now,
      order_id,
      status,
      order: None,
      lines: Vec::new(),
      recipient: None,
      receipt: None,
      message_id: None,
    }
  }
}
