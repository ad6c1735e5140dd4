// nueats/functions/src/services/webhook_signature.rs

//! `Paymongo-Signature: t=<unix>,te=<hex>,li=<hex>` verification.
//!
//! `te` is filled for test-mode events and `li` for live ones; whichever is
//! present must equal HMAC-SHA256(secret, "{t}.{raw body}").

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::{AppError, Result as AppResult};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Paymongo-Signature";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SignatureHeader<'a> {
  pub timestamp: &'a str,
  pub test_signature: Option<&'a str>,
  pub live_signature: Option<&'a str>,
}

pub fn parse_header(header: &str) -> Option<SignatureHeader<'_>> {
  let mut parsed = SignatureHeader::default();
  for part in header.split(',') {
    let (key, value) = part.trim().split_once('=')?;
    let value = Some(value.trim()).filter(|v| !v.is_empty());
    match key.trim() {
      "t" => parsed.timestamp = value.unwrap_or_default(),
      "te" => parsed.test_signature = value,
      "li" => parsed.live_signature = value,
      _ => {}
    }
  }
  if parsed.timestamp.is_empty() || (parsed.test_signature.is_none() && parsed.live_signature.is_none()) {
    return None;
  }
  Some(parsed)
}

pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> AppResult<String> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| AppError::Config(e.to_string()))?;
  mac.update(timestamp.as_bytes());
  mac.update(b".");
  mac.update(body);
  Ok(hex::encode(mac.finalize().into_bytes()))
}

/// `Unauthorized` on a missing, malformed or mismatching header.
pub fn verify(secret: &str, header: Option<&str>, body: &[u8]) -> AppResult<()> {
  let header = header.ok_or_else(|| AppError::Unauthorized("Missing webhook signature".to_string()))?;
  let parsed = parse_header(header).ok_or_else(|| AppError::Unauthorized("Malformed webhook signature".to_string()))?;
  let provided = parsed
    .live_signature
    .or(parsed.test_signature)
    .ok_or_else(|| AppError::Unauthorized("Malformed webhook signature".to_string()))?;
  let provided = hex::decode(provided).map_err(|_| AppError::Unauthorized("Malformed webhook signature".to_string()))?;

  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| AppError::Config(e.to_string()))?;
  mac.update(parsed.timestamp.as_bytes());
  mac.update(b".");
  mac.update(body);
  mac
    .verify_slice(&provided)
    .map_err(|_| AppError::Unauthorized("Invalid webhook signature".to_string()))
}
