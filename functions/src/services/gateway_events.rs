// nueats/functions/src/services/gateway_events.rs

//! Normalising inbound gateway events.

use serde_json::Value as JsonValue;

use crate::models::PaymentStatus;

/// Event types that move a payment session. Anything else is acknowledged
/// and left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayEventKind {
  CheckoutSessionPaid,
  PaymentPaid,
  PaymentFailed,
  PaymentRefunded,
  RefundUpdated,
}

impl GatewayEventKind {
  pub const ALL: [GatewayEventKind; 5] = [
    GatewayEventKind::CheckoutSessionPaid,
    GatewayEventKind::PaymentPaid,
    GatewayEventKind::PaymentFailed,
    GatewayEventKind::PaymentRefunded,
    GatewayEventKind::RefundUpdated,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      GatewayEventKind::CheckoutSessionPaid => "checkout_session.payment.paid",
      GatewayEventKind::PaymentPaid => "payment.paid",
      GatewayEventKind::PaymentFailed => "payment.failed",
      GatewayEventKind::PaymentRefunded => "payment.refunded",
      GatewayEventKind::RefundUpdated => "payment.refund.updated",
    }
  }

  pub fn from_event_type(event_type: &str) -> Option<Self> {
    GatewayEventKind::ALL.into_iter().find(|kind| kind.as_str() == event_type)
  }

  pub fn target_status(&self) -> PaymentStatus {
    match self {
      GatewayEventKind::CheckoutSessionPaid | GatewayEventKind::PaymentPaid => PaymentStatus::Success,
      GatewayEventKind::PaymentFailed => PaymentStatus::Failed,
      GatewayEventKind::PaymentRefunded | GatewayEventKind::RefundUpdated => PaymentStatus::Refunded,
    }
  }
}

/// The two facts pulled out of an event envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
  pub event_type: String,
  pub checkout_session_id: Option<String>,
}

impl WebhookEvent {
  /// Reads `{ data: { attributes: { type, data: { id, attributes: { checkout_session_id } } } } }`,
  /// falling back to a top-level `type` for flat envelopes.
  pub fn from_payload(payload: &JsonValue) -> Self {
    let event_type = payload
      .pointer("/data/attributes/type")
      .or_else(|| payload.get("type"))
      .and_then(JsonValue::as_str)
      .unwrap_or("unknown")
      .to_string();

    let resource = payload.pointer("/data/attributes/data");
    let checkout_session_id = resource
      .and_then(|r| r.pointer("/attributes/checkout_session_id"))
      .or_else(|| resource.and_then(|r| r.get("id")))
      .and_then(JsonValue::as_str)
      .filter(|id| !id.is_empty())
      .map(str::to_string);

    Self {
      event_type,
      checkout_session_id,
    }
  }

  pub fn kind(&self) -> Option<GatewayEventKind> {
    GatewayEventKind::from_event_type(&self.event_type)
  }
}
