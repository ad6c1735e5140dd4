// nueats/functions/src/models/menu_item.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MenuItem {
  pub id: i64,
  pub name: String,
  pub price: Decimal,
  /// Minutes to prepare. `None` means no known prep time.
  pub prep_time: Option<i32>,
}
