//! relay-facebook: Facebook Messenger side of the relay
//!
//! Receives Messenger webhooks, asks the completion API for a reply and
//! sends it back through the Graph Send API.

pub mod api;
pub mod error;
pub mod handler;
pub mod webhook;

#[cfg(test)]
mod testing;

pub use api::{FacebookApi, MessageSender, WebhookPayload};
pub use error::{FacebookError, Result};
pub use handler::{MessengerHandler, RelayOutcome, FALLBACK_REPLY};
pub use webhook::{create_webhook_router, start_webhook_server, WebhookState};
