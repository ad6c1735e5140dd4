// nueats/functions/src/web/handlers/mod.rs

pub mod auto_ready_handlers;
pub mod notification_handlers;
pub mod payment_handlers;
pub mod webhook_handlers;
