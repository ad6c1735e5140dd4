// nueats/functions/src/services/mailer.rs
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::MailConfig;
use crate::errors::{AppError, Result as AppResult};

#[derive(Debug, Clone)]
pub struct Attachment {
  pub filename: String,
  pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
  pub to: String,
  pub subject: String,
  pub html: String,
  pub attachments: Vec<Attachment>,
}

/// Outbound transactional mail. Returns the relay's message id.
#[async_trait]
pub trait MailRelay: Send + Sync {
  async fn send(&self, message: EmailMessage) -> AppResult<String>;
}

#[derive(Serialize)]
struct RelayEmail<'a> {
  from: &'a str,
  to: Vec<&'a str>,
  subject: &'a str,
  html: &'a str,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  attachments: Vec<RelayAttachment<'a>>,
}

#[derive(Serialize)]
struct RelayAttachment<'a> {
  filename: &'a str,
  content: String,
}

#[derive(Deserialize)]
struct RelayResponse {
  id: String,
}

pub struct ResendMailRelay {
  client: Client,
  config: MailConfig,
}

impl ResendMailRelay {
  pub fn new(config: MailConfig) -> AppResult<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build mail HTTP client: {}", e)))?;
    Ok(Self { client, config })
  }
}

#[async_trait]
impl MailRelay for ResendMailRelay {
  #[instrument(skip(self, message), fields(to = %message.to, attachments = message.attachments.len()), err)]
  async fn send(&self, message: EmailMessage) -> AppResult<String> {
    let email = RelayEmail {
      from: &self.config.from,
      to: vec![message.to.as_str()],
      subject: &message.subject,
      html: &message.html,
      attachments: message
        .attachments
        .iter()
        .map(|a| RelayAttachment {
          filename: &a.filename,
          content: BASE64.encode(&a.content),
        })
        .collect(),
    };

    let response = self
      .client
      .post(format!("{}/emails", self.config.api_base.trim_end_matches('/')))
      .bearer_auth(&self.config.api_key)
      .json(&email)
      .send()
      .await
      .map_err(|e| AppError::Mail(format!("Failed to reach mail relay: {}", e)))?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(AppError::Mail(format!("Mail relay error: {} - {}", status, body)));
    }

    let sent: RelayResponse = response
      .json()
      .await
      .map_err(|e| AppError::Mail(format!("Unreadable mail relay response: {}", e)))?;
    info!(message_id = %sent.id, "Email accepted by relay.");
    Ok(sent.id)
  }
}
