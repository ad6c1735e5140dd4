// nueats/functions/src/services/mod.rs

//! Clients and renderers the pipelines call out to.

pub mod email_templates;
pub mod gateway_events;
pub mod mailer;
pub mod payment_gateway;
pub mod receipt;
pub mod webhook_signature;
