// nueats/functions/src/services/email_templates.rs
use rust_decimal::Decimal;

use crate::models::{OrderLine, OrderStatus};

/// The status a notification was requested for. Strings outside the closed
/// `OrderStatus` set are carried along so the generic message can name them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifiedStatus {
  Known(OrderStatus),
  Unrecognized(String),
}

impl NotifiedStatus {
  pub fn parse(raw: &str) -> Self {
    raw
      .parse::<OrderStatus>()
      .map(NotifiedStatus::Known)
      .unwrap_or_else(|_| NotifiedStatus::Unrecognized(raw.trim().to_string()))
  }

  pub fn is(&self, status: OrderStatus) -> bool {
    matches!(self, NotifiedStatus::Known(s) if *s == status)
  }

  pub fn label(&self) -> &str {
    match self {
      NotifiedStatus::Known(status) => status.as_str(),
      NotifiedStatus::Unrecognized(raw) => raw,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
  pub subject: String,
  pub headline: String,
  pub body: String,
}

pub fn status_message(order_id: i64, status: &NotifiedStatus) -> StatusMessage {
  let (subject, headline, body) = match status {
    NotifiedStatus::Known(OrderStatus::Pending) => (
      "Order received",
      "We got your order!",
      "Your order has been received and is waiting to be confirmed by the canteen.",
    ),
    NotifiedStatus::Known(OrderStatus::Preparing) => (
      "Order is being prepared",
      "Your food is on the way",
      "The kitchen has started preparing your order.",
    ),
    NotifiedStatus::Known(OrderStatus::Ready) => (
      "Order ready for pickup",
      "Your order is ready!",
      "Your order is ready. Please pick it up at the counter.",
    ),
    NotifiedStatus::Known(OrderStatus::Completed) => (
      "Order completed",
      "Thank you for your order",
      "Your order is complete. Your receipt is attached to this email.",
    ),
    NotifiedStatus::Known(OrderStatus::Cancelled) => (
      "Order cancelled",
      "Your order was cancelled",
      "Your order has been cancelled. Contact the canteen if this is unexpected.",
    ),
    NotifiedStatus::Unrecognized(_) => (
      "Order updated",
      "Your order was updated",
      "There is an update on your order.",
    ),
  };

  StatusMessage {
    subject: format!("NuEats Order #{}: {}", order_id, subject),
    headline: headline.to_string(),
    body: body.to_string(),
  }
}

fn escape_html(raw: &str) -> String {
  raw
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
}

pub fn render_html(
  order_id: i64,
  status: &NotifiedStatus,
  message: &StatusMessage,
  lines: &[OrderLine],
  total: Decimal,
  currency: &str,
) -> String {
  let rows: String = lines
    .iter()
    .map(|line| {
      format!(
        "<tr><td>{}</td><td align=\"center\">{}</td><td align=\"right\">{} {:.2}</td></tr>",
        escape_html(&line.name),
        line.quantity,
        currency,
        line.line_total().round_dp(2)
      )
    })
    .collect();

  format!(
    "<!DOCTYPE html><html><body style=\"font-family:sans-serif\">\
     <h2>{headline}</h2>\
     <p>{body}</p>\
     <p>Order <strong>#{order_id}</strong> is now <strong>{status}</strong>.</p>\
     <table cellpadding=\"6\" style=\"border-collapse:collapse\">\
     <tr><th align=\"left\">Item</th><th>Qty</th><th align=\"right\">Amount</th></tr>\
     {rows}\
     <tr><td colspan=\"2\"><strong>Total</strong></td><td align=\"right\"><strong>{currency} {total:.2}</strong></td></tr>\
     </table>\
     <p>NuEats</p></body></html>",
    headline = escape_html(&message.headline),
    body = escape_html(&message.body),
    order_id = order_id,
    status = escape_html(status.label()),
    rows = rows,
    currency = currency,
    total = total.round_dp(2),
  )
}
