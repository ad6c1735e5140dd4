// nueats/functions/src/pipelines/mod.rs

//! One pipeline per lifecycle operation, all registered at startup.

pub mod auto_ready_pipeline;
pub mod checkout_pipeline;
pub mod contexts;
pub mod notification_pipeline;
pub mod redirect_pipeline;
pub mod webhook_pipeline;

use crate::errors::AppError;
use nueats_core::Registry;
use tracing::info;

pub fn register_all_pipelines(registry: &Registry<AppError>) {
  info!("Registering all application pipelines...");

  auto_ready_pipeline::register_auto_ready_pipeline(registry);
  checkout_pipeline::register_checkout_pipeline(registry);
  redirect_pipeline::register_redirect_pipeline(registry);
  webhook_pipeline::register_webhook_pipeline(registry);
  notification_pipeline::register_notification_pipeline(registry);

  info!("All application pipelines registered.");
}
