// nueats/functions/src/services/payment_gateway.rs
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::GatewayConfig;
use crate::errors::{AppError, Result as AppResult};

/// Wallets and cards offered on the hosted checkout page.
const PAYMENT_METHOD_TYPES: [&str; 3] = ["gcash", "paymaya", "card"];

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
  pub order_id: Option<i64>,
  /// Major currency units, e.g. 250.00.
  pub amount: Decimal,
}

impl CheckoutRequest {
  pub fn label(&self) -> String {
    match self.order_id {
      Some(id) => format!("NuEats Order #{}", id),
      None => "NuEats Order".to_string(),
    }
  }
}

/// What the processor hands back for a created checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
  pub id: String,
  pub checkout_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn create_checkout_session(&self, request: &CheckoutRequest) -> AppResult<CheckoutSession>;
}

/// Converts major units to the processor's integer minor units (centavos).
pub fn to_minor_units(amount: Decimal) -> AppResult<i64> {
  (amount * Decimal::ONE_HUNDRED)
    .round()
    .to_i64()
    .ok_or_else(|| AppError::Validation(format!("Amount {} is out of range", amount)))
}

#[derive(Serialize)]
struct CreateCheckoutBody<'a> {
  data: CreateCheckoutData<'a>,
}

#[derive(Serialize)]
struct CreateCheckoutData<'a> {
  attributes: CheckoutAttributes<'a>,
}

#[derive(Serialize)]
struct CheckoutAttributes<'a> {
  line_items: Vec<LineItem<'a>>,
  payment_method_types: &'a [&'a str],
  description: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  reference_number: Option<String>,
  success_url: &'a str,
  cancel_url: &'a str,
  send_email_receipt: bool,
  show_line_items: bool,
}

#[derive(Serialize)]
struct LineItem<'a> {
  name: String,
  amount: i64,
  currency: &'a str,
  quantity: u32,
}

#[derive(Deserialize)]
struct CheckoutResponse {
  data: CheckoutResponseData,
}

#[derive(Deserialize)]
struct CheckoutResponseData {
  id: String,
  attributes: CheckoutResponseAttributes,
}

#[derive(Deserialize)]
struct CheckoutResponseAttributes {
  checkout_url: String,
}

pub struct PayMongoGateway {
  client: Client,
  config: GatewayConfig,
}

impl PayMongoGateway {
  pub fn new(config: GatewayConfig) -> AppResult<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build gateway HTTP client: {}", e)))?;
    Ok(Self { client, config })
  }
}

#[async_trait]
impl PaymentGateway for PayMongoGateway {
  #[instrument(skip(self, request), fields(order_id = ?request.order_id, amount = %request.amount), err)]
  async fn create_checkout_session(&self, request: &CheckoutRequest) -> AppResult<CheckoutSession> {
    let label = request.label();
    let body = CreateCheckoutBody {
      data: CreateCheckoutData {
        attributes: CheckoutAttributes {
          line_items: vec![LineItem {
            name: label.clone(),
            amount: to_minor_units(request.amount)?,
            currency: &self.config.currency,
            quantity: 1,
          }],
          payment_method_types: &PAYMENT_METHOD_TYPES,
          description: label,
          reference_number: request.order_id.map(|id| id.to_string()),
          success_url: &self.config.success_url,
          cancel_url: &self.config.failure_url,
          send_email_receipt: false,
          show_line_items: true,
        },
      },
    };

    let url = format!("{}/checkout_sessions", self.config.api_base.trim_end_matches('/'));
    let response = self
      .client
      .post(&url)
      .basic_auth(&self.config.secret_key, Some(""))
      .json(&body)
      .send()
      .await
      .map_err(|e| AppError::Gateway(format!("Checkout request failed: {}", e)))?;

    if !response.status().is_success() {
      let status = response.status();
      let detail = response.text().await.unwrap_or_default();
      warn!(%status, "Payment gateway rejected checkout request.");
      return Err(AppError::Gateway(format!("Gateway responded {}: {}", status, detail)));
    }

    let parsed: CheckoutResponse = response
      .json()
      .await
      .map_err(|e| AppError::Gateway(format!("Unreadable checkout response: {}", e)))?;
    info!(checkout_session_id = %parsed.data.id, "Checkout session created.");

    Ok(CheckoutSession {
      id: parsed.data.id,
      checkout_url: parsed.data.attributes.checkout_url,
    })
  }
}
