// nueats/functions/src/state.rs
use crate::config::AppConfig;
use crate::db::{OrderRepository, PaymentRepository, UserDirectory};
use crate::errors::AppError;
use crate::services::mailer::MailRelay;
use crate::services::payment_gateway::PaymentGateway;
use nueats_core::Registry;
use std::sync::Arc;

/// Everything a pipeline step may reach for. Cloned into every run's context.
#[derive(Clone)]
pub struct AppState {
  pub orders: Arc<dyn OrderRepository>,
  pub payments: Arc<dyn PaymentRepository>,
  pub users: Arc<dyn UserDirectory>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub mailer: Arc<dyn MailRelay>,
  pub registry: Arc<Registry<AppError>>,
  pub config: Arc<AppConfig>,
}
