// nueats/functions/src/readiness.rs

//! Deciding which preparing orders are due to become `Ready`.
//!
//! Pure functions only: the auto-ready pipeline fetches the rows, calls
//! [`select_due_orders`], and performs the guarded update itself.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::models::{MenuItem, Order, OrderItem, OrderStatus};

/// Longest prep time, in minutes, over the order's items.
///
/// `None` when the order has no items, or when any item points at a menu item
/// that no longer exists: readiness is never guessed from partial data.
pub fn max_prep_minutes(items: &[&OrderItem], menu_by_id: &HashMap<i64, &MenuItem>) -> Option<i64> {
  let mut max = 0_i64;
  for item in items {
    let menu_item = menu_by_id.get(&item.menu_item_id)?;
    max = max.max(i64::from(menu_item.prep_time.unwrap_or(0)));
  }
  (max > 0).then_some(max)
}

/// When the order is expected to be ready, if it can be known at all.
pub fn ready_at(order: &Order, items: &[&OrderItem], menu_by_id: &HashMap<i64, &MenuItem>) -> Option<DateTime<Utc>> {
  max_prep_minutes(items, menu_by_id).map(|minutes| order.created_at + Duration::minutes(minutes))
}

/// Ids of the orders that should move to `Ready` at `now`, in input order.
///
/// Orders whose current status cannot move to `Ready` are ignored whatever
/// their timing.
pub fn select_due_orders(orders: &[Order], items: &[OrderItem], menu: &[MenuItem], now: DateTime<Utc>) -> Vec<i64> {
  let menu_by_id: HashMap<i64, &MenuItem> = menu.iter().map(|m| (m.id, m)).collect();
  let mut items_by_order: HashMap<i64, Vec<&OrderItem>> = HashMap::new();
  for item in items {
    items_by_order.entry(item.order_id).or_default().push(item);
  }

  orders
    .iter()
    .filter(|order| order.status.can_transition_to(OrderStatus::Ready))
    .filter(|order| {
      let order_items = items_by_order.get(&order.id).map(Vec::as_slice).unwrap_or(&[]);
      match ready_at(order, order_items, &menu_by_id) {
        Some(deadline) => now >= deadline,
        None => {
          tracing::debug!(order_id = order.id, "No known prep time; order left for staff.");
          false
        }
      }
    })
    .map(|order| order.id)
    .collect()
}
