// nueats/functions/src/models/mod.rs

//! Rows of the tables the functions read and write.

pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod payment_session;
pub mod webhook_log;

pub use menu_item::MenuItem;
pub use order::{Order, OrderStatus};
pub use order_item::{OrderItem, OrderLine};
pub use payment_session::{NewPaymentSession, PaymentMethod, PaymentSession, PaymentStatus};
pub use webhook_log::{NewWebhookLogEntry, WebhookLogEntry};
