// nueats/functions/src/models/payment_session.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Success,
  Failed,
  Refunded,
}

impl PaymentStatus {
  pub const ALL: [PaymentStatus; 4] = [
    PaymentStatus::Pending,
    PaymentStatus::Success,
    PaymentStatus::Failed,
    PaymentStatus::Refunded,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Success => "success",
      PaymentStatus::Failed => "failed",
      PaymentStatus::Refunded => "refunded",
    }
  }

  pub fn is_terminal(&self) -> bool {
    !matches!(self, PaymentStatus::Pending)
  }

  /// Whether a session currently in `self` may be written to `next`.
  ///
  /// pending -> any terminal, success -> refunded, and any status -> itself so a
  /// re-delivered event overwrites the same value.
  pub fn accepts_transition_to(&self, next: PaymentStatus) -> bool {
    use PaymentStatus::*;
    *self == next || matches!((self, next), (Pending, Success | Failed | Refunded) | (Success, Refunded))
  }

  /// Statuses a session may currently hold for a write to `target` to apply.
  pub fn sources_for(target: PaymentStatus) -> Vec<PaymentStatus> {
    PaymentStatus::ALL
      .into_iter()
      .filter(|current| current.accepts_transition_to(target))
      .collect()
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown payment value '{0}'")]
pub struct UnknownPaymentValue(pub String);

impl FromStr for PaymentStatus {
  type Err = UnknownPaymentValue;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    PaymentStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s.trim().to_ascii_lowercase())
      .ok_or_else(|| UnknownPaymentValue(s.to_string()))
  }
}

impl TryFrom<String> for PaymentStatus {
  type Error = UnknownPaymentValue;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

/// How the customer pays. Cash settles at the counter; gateway goes through the
/// hosted checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
  Cash,
  Gateway,
}

impl PaymentMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentMethod::Cash => "cash",
      PaymentMethod::Gateway => "gateway",
    }
  }
}

impl FromStr for PaymentMethod {
  type Err = UnknownPaymentValue;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "cash" => Ok(PaymentMethod::Cash),
      "gateway" => Ok(PaymentMethod::Gateway),
      _ => Err(UnknownPaymentValue(s.to_string())),
    }
  }
}

impl TryFrom<String> for PaymentMethod {
  type Error = UnknownPaymentValue;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentSession {
  pub id: Uuid,
  pub order_id: Option<i64>,
  pub checkout_session_id: Option<String>,
  pub amount: Decimal,
  #[sqlx(try_from = "String")]
  pub status: PaymentStatus,
  #[sqlx(try_from = "String")]
  pub payment_method: PaymentMethod,
  pub user_id: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Insert payload; the store assigns `id` and timestamps.
#[derive(Debug, Clone)]
pub struct NewPaymentSession {
  pub order_id: Option<i64>,
  pub checkout_session_id: Option<String>,
  pub amount: Decimal,
  pub status: PaymentStatus,
  pub payment_method: PaymentMethod,
  pub user_id: Uuid,
}

impl NewPaymentSession {
  /// Cash is trusted and settled at order time.
  pub fn settled_cash(order_id: Option<i64>, user_id: Uuid, amount: Decimal) -> Self {
    Self {
      order_id,
      checkout_session_id: None,
      amount,
      status: PaymentStatus::Success,
      payment_method: PaymentMethod::Cash,
      user_id,
    }
  }

  pub fn awaiting_gateway(order_id: Option<i64>, user_id: Uuid, amount: Decimal, checkout_session_id: String) -> Self {
    Self {
      order_id,
      checkout_session_id: Some(checkout_session_id),
      amount,
      status: PaymentStatus::Pending,
      payment_method: PaymentMethod::Gateway,
      user_id,
    }
  }
}
