// nueats/functions/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use nueats_core::Registry;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use nueats_functions::config::AppConfig;
use nueats_functions::db::PgStore;
use nueats_functions::errors::AppError;
use nueats_functions::pipelines;
use nueats_functions::services::mailer::ResendMailRelay;
use nueats_functions::services::payment_gateway::PayMongoGateway;
use nueats_functions::state::AppState;
use nueats_functions::web::{configure_app_routes, cors_headers};

fn startup_error(stage: &str, e: AppError) -> std::io::Error {
  tracing::error!(error = %e, "{} failed.", stage);
  std::io::Error::other(format!("{}: {}", stage, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting NuEats functions server...");

  let app_config = Arc::new(AppConfig::from_env().map_err(|e| startup_error("Configuration", e))?);

  let store = Arc::new(
    PgStore::connect(&app_config.database_url, app_config.database_max_connections)
      .await
      .map_err(|e| startup_error("Database connection", e))?,
  );
  tracing::info!("Successfully connected to the database.");

  let gateway = PayMongoGateway::new(app_config.gateway.clone()).map_err(|e| startup_error("Payment gateway", e))?;
  let mailer = ResendMailRelay::new(app_config.mail.clone()).map_err(|e| startup_error("Mail relay", e))?;

  let registry = Registry::<AppError>::new();
  pipelines::register_all_pipelines(&registry);

  let app_state = AppState {
    orders: store.clone(),
    payments: store.clone(),
    users: store,
    gateway: Arc::new(gateway),
    mailer: Arc::new(mailer),
    registry: Arc::new(registry),
    config: app_config.clone(),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(cors_headers())
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
