// nueats/functions/src/models/order_item.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// A line of an order. `price` is the unit price captured when the order was
/// placed and never follows later menu changes.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: i64,
  pub order_id: i64,
  pub menu_item_id: i64,
  pub quantity: i32,
  pub price: Decimal,
}

/// An order line joined with the menu item's display name, for e-mails and receipts.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderLine {
  pub menu_item_id: i64,
  pub name: String,
  pub quantity: i32,
  pub unit_price: Decimal,
}

impl OrderLine {
  pub fn line_total(&self) -> Decimal {
    self.unit_price * Decimal::from(self.quantity)
  }
}
