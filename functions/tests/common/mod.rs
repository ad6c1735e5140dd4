// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nueats_core::Registry;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::Level;
use uuid::Uuid;

use nueats_functions::config::{AppConfig, GatewayConfig, MailConfig};
use nueats_functions::db::{resolve_order_lines, OrderLineRow, OrderRepository, PaymentRepository, UserDirectory};
use nueats_functions::errors::{AppError, Result as AppResult};
use nueats_functions::models::{
  MenuItem, NewPaymentSession, NewWebhookLogEntry, Order, OrderItem, OrderLine, OrderStatus, PaymentMethod,
  PaymentSession, PaymentStatus, WebhookLogEntry,
};
use nueats_functions::pipelines::register_all_pipelines;
use nueats_functions::services::mailer::{EmailMessage, MailRelay};
use nueats_functions::services::payment_gateway::{CheckoutRequest, CheckoutSession, PaymentGateway};
use nueats_functions::state::AppState;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn at(rfc3339: &str) -> DateTime<Utc> {
  rfc3339.parse().unwrap()
}

pub fn db_down() -> AppError {
  AppError::Database(sqlx::Error::PoolTimedOut)
}

// --- Row builders ---

pub fn order(id: i64, user_id: Uuid, status: OrderStatus, created_at: DateTime<Utc>, total: Decimal) -> Order {
  Order {
    id,
    user_id,
    status,
    total_amount: total,
    payment_method: Some("cash".to_string()),
    created_at,
    updated_at: created_at,
  }
}

pub fn item(id: i64, order_id: i64, menu_item_id: i64, quantity: i32, price: Decimal) -> OrderItem {
  OrderItem {
    id,
    order_id,
    menu_item_id,
    quantity,
    price,
  }
}

pub fn menu_item(id: i64, name: &str, price: Decimal, prep_time: Option<i32>) -> MenuItem {
  MenuItem {
    id,
    name: name.to_string(),
    price,
    prep_time,
  }
}

pub fn gateway_session(checkout_session_id: &str, status: PaymentStatus) -> PaymentSession {
  let created = at("2024-01-01T12:00:00Z");
  PaymentSession {
    id: Uuid::new_v4(),
    order_id: Some(83),
    checkout_session_id: Some(checkout_session_id.to_string()),
    amount: Decimal::new(25000, 2),
    status,
    payment_method: PaymentMethod::Gateway,
    user_id: Uuid::new_v4(),
    created_at: created,
    updated_at: created,
  }
}

// --- In-memory store ---

#[derive(Default)]
pub struct StoreData {
  pub orders: Vec<Order>,
  pub items: Vec<OrderItem>,
  pub menu: Vec<MenuItem>,
  pub sessions: Vec<PaymentSession>,
  pub webhook_logs: Vec<WebhookLogEntry>,
  pub emails: HashMap<Uuid, String>,
  /// Orders another sweep flips to Ready right before our guarded update runs.
  pub preempted_orders: Vec<i64>,
  pub fail_order_reads: bool,
  pub fail_session_writes: bool,
  pub fail_session_reads: bool,
  pub fail_audit_writes: bool,
}

#[derive(Default)]
pub struct InMemoryStore {
  pub data: Mutex<StoreData>,
}

impl InMemoryStore {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn with<R>(&self, f: impl FnOnce(&mut StoreData) -> R) -> R {
    f(&mut self.data.lock().unwrap())
  }

  pub fn order_status(&self, order_id: i64) -> Option<OrderStatus> {
    self.with(|d| d.orders.iter().find(|o| o.id == order_id).map(|o| o.status))
  }

  pub fn session_status(&self, checkout_session_id: &str) -> Option<PaymentStatus> {
    self.with(|d| {
      d.sessions
        .iter()
        .find(|s| s.checkout_session_id.as_deref() == Some(checkout_session_id))
        .map(|s| s.status)
    })
  }

  pub fn webhook_logs(&self) -> Vec<WebhookLogEntry> {
    self.with(|d| d.webhook_logs.clone())
  }

  pub fn sessions(&self) -> Vec<PaymentSession> {
    self.with(|d| d.sessions.clone())
  }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
  async fn preparing_orders(&self) -> AppResult<Vec<Order>> {
    self.with(|d| {
      if d.fail_order_reads {
        return Err(db_down());
      }
      Ok(d.orders.iter().filter(|o| o.status == OrderStatus::Preparing).cloned().collect())
    })
  }

  async fn items_for_orders(&self, order_ids: &[i64]) -> AppResult<Vec<OrderItem>> {
    Ok(self.with(|d| d.items.iter().filter(|i| order_ids.contains(&i.order_id)).cloned().collect()))
  }

  async fn menu_items(&self, menu_item_ids: &[i64]) -> AppResult<Vec<MenuItem>> {
    Ok(self.with(|d| d.menu.iter().filter(|m| menu_item_ids.contains(&m.id)).cloned().collect()))
  }

  async fn mark_ready(&self, order_ids: &[i64], now: DateTime<Utc>) -> AppResult<Vec<i64>> {
    Ok(self.with(|d| {
      for preempted in d.preempted_orders.clone() {
        if let Some(o) = d.orders.iter_mut().find(|o| o.id == preempted) {
          o.status = OrderStatus::Ready;
        }
      }
      let mut changed = Vec::new();
      for id in order_ids {
        if let Some(o) = d.orders.iter_mut().find(|o| o.id == *id && o.status == OrderStatus::Preparing) {
          o.status = OrderStatus::Ready;
          o.updated_at = now;
          changed.push(*id);
        }
      }
      changed
    }))
  }

  async fn order(&self, order_id: i64) -> AppResult<Option<Order>> {
    self.with(|d| {
      if d.fail_order_reads {
        return Err(db_down());
      }
      Ok(d.orders.iter().find(|o| o.id == order_id).cloned())
    })
  }

  async fn order_lines(&self, order_id: i64) -> AppResult<Vec<OrderLine>> {
    let rows: Vec<OrderLineRow> = self.with(|d| {
      d.items
        .iter()
        .filter(|i| i.order_id == order_id)
        .map(|i| OrderLineRow {
          menu_item_id: i.menu_item_id,
          name: d.menu.iter().find(|m| m.id == i.menu_item_id).map(|m| m.name.clone()),
          quantity: i.quantity,
          unit_price: i.price,
        })
        .collect()
    });
    resolve_order_lines(order_id, rows)
  }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
  async fn insert_session(&self, session: NewPaymentSession) -> AppResult<PaymentSession> {
    let now = Utc::now();
    let stored = PaymentSession {
      id: Uuid::new_v4(),
      order_id: session.order_id,
      checkout_session_id: session.checkout_session_id,
      amount: session.amount,
      status: session.status,
      payment_method: session.payment_method,
      user_id: session.user_id,
      created_at: now,
      updated_at: now,
    };
    self.with(|d| {
      if d.fail_session_writes {
        return Err(db_down());
      }
      d.sessions.push(stored.clone());
      Ok(stored)
    })
  }

  async fn session_by_checkout_id(&self, checkout_session_id: &str) -> AppResult<Option<PaymentSession>> {
    self.with(|d| {
      if d.fail_session_reads {
        return Err(db_down());
      }
      Ok(
        d.sessions
          .iter()
          .find(|s| s.checkout_session_id.as_deref() == Some(checkout_session_id))
          .cloned(),
      )
    })
  }

  async fn transition_by_checkout_id(
    &self,
    checkout_session_id: &str,
    target: PaymentStatus,
    now: DateTime<Utc>,
  ) -> AppResult<u64> {
    self.with(|d| {
      if d.fail_session_writes {
        return Err(db_down());
      }
      let mut updated = 0;
      for s in d.sessions.iter_mut() {
        if s.checkout_session_id.as_deref() == Some(checkout_session_id) && s.status.accepts_transition_to(target) {
          s.status = target;
          s.updated_at = now;
          updated += 1;
        }
      }
      Ok(updated)
    })
  }

  async fn append_webhook_log(&self, entry: NewWebhookLogEntry) -> AppResult<i64> {
    self.with(|d| {
      if d.fail_audit_writes {
        return Err(db_down());
      }
      let id = d.webhook_logs.len() as i64 + 1;
      d.webhook_logs.push(WebhookLogEntry {
        id,
        event_type: entry.event_type,
        checkout_session_id: entry.checkout_session_id,
        payload: sqlx::types::Json(entry.payload),
        processed: false,
        error: entry.error,
        created_at: Utc::now(),
      });
      Ok(id)
    })
  }

  async fn mark_webhook_processed(&self, log_id: i64) -> AppResult<()> {
    self.with(|d| {
      if let Some(log) = d.webhook_logs.iter_mut().find(|l| l.id == log_id) {
        log.processed = true;
      }
    });
    Ok(())
  }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
  async fn email_for(&self, user_id: Uuid) -> AppResult<Option<String>> {
    Ok(self.with(|d| d.emails.get(&user_id).cloned()))
  }
}

// --- Outbound fakes ---

#[derive(Default)]
pub struct RecordingGateway {
  pub requests: Mutex<Vec<CheckoutRequest>>,
  pub reject: Mutex<bool>,
}

impl RecordingGateway {
  pub fn calls(&self) -> usize {
    self.requests.lock().unwrap().len()
  }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
  async fn create_checkout_session(&self, request: &CheckoutRequest) -> AppResult<CheckoutSession> {
    if *self.reject.lock().unwrap() {
      return Err(AppError::Gateway("Gateway responded 401 Unauthorized: invalid key".to_string()));
    }
    let mut requests = self.requests.lock().unwrap();
    requests.push(request.clone());
    let id = format!("cs_test_{}", requests.len());
    Ok(CheckoutSession {
      checkout_url: format!("https://checkout.example/{}", id),
      id,
    })
  }
}

#[derive(Default)]
pub struct RecordingMailer {
  pub sent: Mutex<Vec<EmailMessage>>,
  pub failing_recipients: Mutex<HashSet<String>>,
}

impl RecordingMailer {
  pub fn sent(&self) -> Vec<EmailMessage> {
    self.sent.lock().unwrap().clone()
  }

  pub fn fail_for(&self, recipient: &str) {
    self.failing_recipients.lock().unwrap().insert(recipient.to_string());
  }
}

#[async_trait]
impl MailRelay for RecordingMailer {
  async fn send(&self, message: EmailMessage) -> AppResult<String> {
    if self.failing_recipients.lock().unwrap().contains(&message.to) {
      return Err(AppError::Mail(format!("Mail relay error: 422 - rejected {}", message.to)));
    }
    let mut sent = self.sent.lock().unwrap();
    sent.push(message);
    Ok(format!("msg_{}", sent.len()))
  }
}

// --- Wiring ---

pub fn test_config(webhook_secret: Option<&str>) -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 8080,
    app_base_url: "http://127.0.0.1:8080".to_string(),
    database_url: "postgres://unused".to_string(),
    database_max_connections: 1,
    gateway: GatewayConfig {
      api_base: "https://gateway.invalid/v1".to_string(),
      secret_key: "sk_test_key".to_string(),
      currency: "PHP".to_string(),
      success_url: "http://127.0.0.1:8080/functions/v1/payment?redirect=success".to_string(),
      failure_url: "http://127.0.0.1:8080/functions/v1/payment?redirect=failed".to_string(),
      webhook_secret: webhook_secret.map(str::to_string),
      timeout: Duration::from_secs(1),
    },
    mail: MailConfig {
      api_base: "https://mail.invalid".to_string(),
      api_key: "re_test_key".to_string(),
      from: "NuEats <orders@nueats.test>".to_string(),
      timeout: Duration::from_secs(1),
    },
  }
}

pub struct TestApp {
  pub state: AppState,
  pub store: Arc<InMemoryStore>,
  pub gateway: Arc<RecordingGateway>,
  pub mailer: Arc<RecordingMailer>,
}

pub fn test_app_with_secret(webhook_secret: Option<&str>) -> TestApp {
  setup_tracing();
  let store = InMemoryStore::new();
  let gateway = Arc::new(RecordingGateway::default());
  let mailer = Arc::new(RecordingMailer::default());

  let registry = Registry::<AppError>::new();
  register_all_pipelines(&registry);

  let state = AppState {
    orders: store.clone(),
    payments: store.clone(),
    users: store.clone(),
    gateway: gateway.clone(),
    mailer: mailer.clone(),
    registry: Arc::new(registry),
    config: Arc::new(test_config(webhook_secret)),
  };
  TestApp {
    state,
    store,
    gateway,
    mailer,
  }
}

pub fn test_app() -> TestApp {
  test_app_with_secret(None)
}
