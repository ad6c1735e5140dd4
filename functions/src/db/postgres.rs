// nueats/functions/src/db/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{resolve_order_lines, OrderLineRow, OrderRepository, PaymentRepository, UserDirectory};
use crate::errors::Result as AppResult;
use crate::models::{
  MenuItem, NewPaymentSession, NewWebhookLogEntry, Order, OrderItem, OrderLine, OrderStatus, PaymentSession,
  PaymentStatus,
};

const ORDER_COLUMNS: &str = "id, user_id, status, total_amount, payment_method, created_at, updated_at";
const SESSION_COLUMNS: &str =
  "id, order_id, checkout_session_id, amount, status, payment_method, user_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str, max_connections: u32) -> AppResult<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    Ok(Self::new(pool))
  }
}

#[async_trait]
impl OrderRepository for PgStore {
  #[instrument(skip(self), err)]
  async fn preparing_orders(&self) -> AppResult<Vec<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE status = $1 ORDER BY created_at", ORDER_COLUMNS);
    let orders = sqlx::query_as::<_, Order>(&sql)
      .bind(OrderStatus::Preparing.as_str())
      .fetch_all(&self.pool)
      .await?;
    debug!(count = orders.len(), "Fetched preparing orders.");
    Ok(orders)
  }

  async fn items_for_orders(&self, order_ids: &[i64]) -> AppResult<Vec<OrderItem>> {
    if order_ids.is_empty() {
      return Ok(Vec::new());
    }
    let items = sqlx::query_as::<_, OrderItem>(
      "SELECT id, order_id, menu_item_id, quantity, price FROM order_items WHERE order_id = ANY($1)",
    )
    .bind(order_ids)
    .fetch_all(&self.pool)
    .await?;
    Ok(items)
  }

  async fn menu_items(&self, menu_item_ids: &[i64]) -> AppResult<Vec<MenuItem>> {
    if menu_item_ids.is_empty() {
      return Ok(Vec::new());
    }
    let items = sqlx::query_as::<_, MenuItem>("SELECT id, name, price, prep_time FROM menu_items WHERE id = ANY($1)")
      .bind(menu_item_ids)
      .fetch_all(&self.pool)
      .await?;
    Ok(items)
  }

  #[instrument(skip(self), err)]
  async fn mark_ready(&self, order_ids: &[i64], now: DateTime<Utc>) -> AppResult<Vec<i64>> {
    if order_ids.is_empty() {
      return Ok(Vec::new());
    }
    // The status predicate is re-checked here, not only at read time, so two
    // overlapping sweeps cannot both promote (and notify) the same order.
    let updated: Vec<(i64,)> =
      sqlx::query_as("UPDATE orders SET status = $1, updated_at = $2 WHERE id = ANY($3) AND status = $4 RETURNING id")
        .bind(OrderStatus::Ready.as_str())
        .bind(now)
        .bind(order_ids)
        .bind(OrderStatus::Preparing.as_str())
        .fetch_all(&self.pool)
        .await?;
    Ok(updated.into_iter().map(|(id,)| id).collect())
  }

  async fn order(&self, order_id: i64) -> AppResult<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    let order = sqlx::query_as::<_, Order>(&sql)
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(order)
  }

  async fn order_lines(&self, order_id: i64) -> AppResult<Vec<OrderLine>> {
    let rows = sqlx::query_as::<_, OrderLineRow>(
      "SELECT oi.menu_item_id, m.name, oi.quantity, oi.price AS unit_price \
       FROM order_items oi LEFT JOIN menu_items m ON m.id = oi.menu_item_id \
       WHERE oi.order_id = $1 ORDER BY oi.id",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await?;
    resolve_order_lines(order_id, rows)
  }
}

#[async_trait]
impl PaymentRepository for PgStore {
  #[instrument(skip(self, session), fields(method = session.payment_method.as_str(), status = %session.status), err)]
  async fn insert_session(&self, session: NewPaymentSession) -> AppResult<PaymentSession> {
    let sql = format!(
      "INSERT INTO payment_sessions (order_id, checkout_session_id, amount, status, payment_method, user_id) \
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
      SESSION_COLUMNS
    );
    let row = sqlx::query_as::<_, PaymentSession>(&sql)
      .bind(session.order_id)
      .bind(session.checkout_session_id)
      .bind(session.amount)
      .bind(session.status.as_str())
      .bind(session.payment_method.as_str())
      .bind(session.user_id)
      .fetch_one(&self.pool)
      .await?;
    Ok(row)
  }

  async fn session_by_checkout_id(&self, checkout_session_id: &str) -> AppResult<Option<PaymentSession>> {
    let sql = format!("SELECT {} FROM payment_sessions WHERE checkout_session_id = $1", SESSION_COLUMNS);
    let row = sqlx::query_as::<_, PaymentSession>(&sql)
      .bind(checkout_session_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row)
  }

  #[instrument(skip(self, now), err)]
  async fn transition_by_checkout_id(
    &self,
    checkout_session_id: &str,
    target: PaymentStatus,
    now: DateTime<Utc>,
  ) -> AppResult<u64> {
    let sources: Vec<&'static str> = PaymentStatus::sources_for(target).iter().map(|s| s.as_str()).collect();
    let result = sqlx::query(
      "UPDATE payment_sessions SET status = $1, updated_at = $2 \
       WHERE checkout_session_id = $3 AND status = ANY($4)",
    )
    .bind(target.as_str())
    .bind(now)
    .bind(checkout_session_id)
    .bind(&sources)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected())
  }

  async fn append_webhook_log(&self, entry: NewWebhookLogEntry) -> AppResult<i64> {
    let (id,): (i64,) = sqlx::query_as(
      "INSERT INTO webhook_logs (event_type, checkout_session_id, payload, processed, error) \
       VALUES ($1, $2, $3, false, $4) RETURNING id",
    )
    .bind(entry.event_type)
    .bind(entry.checkout_session_id)
    .bind(Json(entry.payload))
    .bind(entry.error)
    .fetch_one(&self.pool)
    .await?;
    Ok(id)
  }

  async fn mark_webhook_processed(&self, log_id: i64) -> AppResult<()> {
    sqlx::query("UPDATE webhook_logs SET processed = true WHERE id = $1")
      .bind(log_id)
      .execute(&self.pool)
      .await?;
    Ok(())
  }
}

#[async_trait]
impl UserDirectory for PgStore {
  async fn email_for(&self, user_id: Uuid) -> AppResult<Option<String>> {
    let email: Option<(Option<String>,)> = sqlx::query_as("SELECT email FROM auth.users WHERE id = $1")
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(email.and_then(|(email,)| email))
  }
}
