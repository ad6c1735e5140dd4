// nueats/functions/src/db/mod.rs

//! Storage seams. The functions only ever talk to these traits; `PgStore` backs
//! them with Postgres and tests back them with in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::{AppError, Result as AppResult};
use crate::models::{
  MenuItem, NewPaymentSession, NewWebhookLogEntry, Order, OrderItem, OrderLine, PaymentSession, PaymentStatus,
};

pub mod postgres;

pub use postgres::PgStore;

#[async_trait]
pub trait OrderRepository: Send + Sync {
  async fn preparing_orders(&self) -> AppResult<Vec<Order>>;

  async fn items_for_orders(&self, order_ids: &[i64]) -> AppResult<Vec<OrderItem>>;

  /// Ids with no row are simply absent from the result.
  async fn menu_items(&self, menu_item_ids: &[i64]) -> AppResult<Vec<MenuItem>>;

  /// Sets `Ready` on every listed order that is still `Preparing` at write time,
  /// in one statement, and returns the ids it actually changed.
  async fn mark_ready(&self, order_ids: &[i64], now: DateTime<Utc>) -> AppResult<Vec<i64>>;

  async fn order(&self, order_id: i64) -> AppResult<Option<Order>>;

  /// Every item of the order joined with its menu item. Fails with
  /// `AppError::Notification` if any item's menu item cannot be found.
  async fn order_lines(&self, order_id: i64) -> AppResult<Vec<OrderLine>>;
}

/// An order item read through `LEFT JOIN menu_items`. `name` is `None` when the
/// menu item no longer exists.
#[derive(Debug, Clone, FromRow)]
pub struct OrderLineRow {
  pub menu_item_id: i64,
  pub name: Option<String>,
  pub quantity: i32,
  pub unit_price: Decimal,
}

/// All-or-nothing: one unresolved item fails the whole order, since a partial
/// list would disagree with the stored total.
pub fn resolve_order_lines(order_id: i64, rows: Vec<OrderLineRow>) -> AppResult<Vec<OrderLine>> {
  let missing: Vec<i64> = rows
    .iter()
    .filter(|row| row.name.is_none())
    .map(|row| row.menu_item_id)
    .collect();
  if !missing.is_empty() {
    return Err(AppError::Notification(format!(
      "Order {} references menu items that no longer exist: {:?}",
      order_id, missing
    )));
  }

  Ok(
    rows
      .into_iter()
      .filter_map(|row| {
        row.name.map(|name| OrderLine {
          menu_item_id: row.menu_item_id,
          name,
          quantity: row.quantity,
          unit_price: row.unit_price,
        })
      })
      .collect(),
  )
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
  async fn insert_session(&self, session: NewPaymentSession) -> AppResult<PaymentSession>;

  async fn session_by_checkout_id(&self, checkout_session_id: &str) -> AppResult<Option<PaymentSession>>;

  /// Writes `target` on the session with this checkout id if its current status
  /// accepts the move (see `PaymentStatus::accepts_transition_to`). Returns rows changed.
  async fn transition_by_checkout_id(
    &self,
    checkout_session_id: &str,
    target: PaymentStatus,
    now: DateTime<Utc>,
  ) -> AppResult<u64>;

  async fn append_webhook_log(&self, entry: NewWebhookLogEntry) -> AppResult<i64>;

  async fn mark_webhook_processed(&self, log_id: i64) -> AppResult<()>;
}

/// The identity provider owning customer accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
  async fn email_for(&self, user_id: Uuid) -> AppResult<Option<String>>;
}
