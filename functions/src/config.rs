// nueats/functions/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Settings for the hosted-checkout payment processor.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
  pub api_base: String,
  pub secret_key: String,
  /// ISO code sent with every checkout; amounts go out in its minor unit.
  pub currency: String,
  pub success_url: String,
  pub failure_url: String,
  /// When set, inbound webhooks must carry a valid signature.
  pub webhook_secret: Option<String>,
  pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
  pub api_base: String,
  pub api_key: String,
  pub from: String,
  pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub app_base_url: String,
  pub database_url: String,
  pub database_max_connections: u32,
  pub gateway: GatewayConfig,
  pub mail: MailConfig,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let parse_env = |var_name: &str, default: &str| -> Result<u64> {
      get_env(var_name)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));
    let database_url = get_env("DATABASE_URL")?;
    let database_max_connections = get_env("DATABASE_MAX_CONNECTIONS")
      .unwrap_or_else(|_| "5".to_string())
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid DATABASE_MAX_CONNECTIONS: {}", e)))?;

    let redirect_target = |outcome: &str| {
      format!(
        "{}/functions/v1/payment?redirect={}&session_id={{CHECKOUT_SESSION_ID}}",
        app_base_url.trim_end_matches('/'),
        outcome
      )
    };
    let gateway = GatewayConfig {
      api_base: get_env("PAYMONGO_API_BASE").unwrap_or_else(|_| "https://api.paymongo.com/v1".to_string()),
      secret_key: get_env("PAYMONGO_SECRET_KEY")?,
      currency: get_env("PAYMENT_CURRENCY").unwrap_or_else(|_| "PHP".to_string()),
      success_url: get_env("PAYMENT_SUCCESS_URL").unwrap_or_else(|_| redirect_target("success")),
      failure_url: get_env("PAYMENT_FAILURE_URL").unwrap_or_else(|_| redirect_target("failed")),
      webhook_secret: get_env("PAYMONGO_WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
      timeout: Duration::from_secs(parse_env("GATEWAY_TIMEOUT_SECS", "15")?),
    };

    let mail = MailConfig {
      api_base: get_env("MAIL_API_BASE").unwrap_or_else(|_| "https://api.resend.com".to_string()),
      api_key: get_env("RESEND_API_KEY")?,
      from: get_env("MAIL_FROM").unwrap_or_else(|_| "NuEats <orders@nueats.app>".to_string()),
      timeout: Duration::from_secs(parse_env("MAIL_TIMEOUT_SECS", "15")?),
    };

    tracing::info!(
      server_host = %server_host,
      server_port,
      currency = %gateway.currency,
      webhook_signatures = gateway.webhook_secret.is_some(),
      "Application configuration loaded."
    );

    Ok(Self {
      server_host,
      server_port,
      app_base_url,
      database_url,
      database_max_connections,
      gateway,
      mail,
    })
  }
}
