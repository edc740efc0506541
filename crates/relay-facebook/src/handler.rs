//! Message relay for Facebook Messenger

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use relay_core::{ContextDocument, ReplyGenerator};

use crate::api::{MessageSender, WebhookMessaging, WebhookPayload};

/// Reply sent when the completion API cannot produce one
pub const FALLBACK_REPLY: &str = "I apologize, but I'm having trouble processing your request right now. Please try again later.";

/// Counts from relaying one webhook payload
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayOutcome {
    /// Messages answered (including fallback answers)
    pub relayed: usize,
    /// Events without a sender or text
    pub skipped: usize,
    /// Replies the Send API call failed for
    pub send_failures: usize,
}

/// Relays Messenger text messages through the completion API
pub struct MessengerHandler {
    generator: Arc<dyn ReplyGenerator>,
    sender: Arc<dyn MessageSender>,
    context: ContextDocument,
}

impl MessengerHandler {
    /// Create a new Messenger handler
    pub fn new(
        generator: Arc<dyn ReplyGenerator>,
        sender: Arc<dyn MessageSender>,
        context: ContextDocument,
    ) -> Self {
        Self {
            generator,
            sender,
            context,
        }
    }

    /// Relay every text message in a page payload, in order
    ///
    /// Failures are logged per message and never abort the rest.
    pub async fn process_payload(&self, payload: &WebhookPayload) -> RelayOutcome {
        let mut outcome = RelayOutcome::default();

        for entry in &payload.entry {
            for messaging in &entry.messaging {
                self.handle_messaging(messaging, &mut outcome).await;
            }
        }

        info!(
            "Webhook processed: relayed={}, skipped={}, send_failures={}",
            outcome.relayed, outcome.skipped, outcome.send_failures
        );
        outcome
    }

    /// Handle a single messaging event
    async fn handle_messaging(&self, messaging: &WebhookMessaging, outcome: &mut RelayOutcome) {
        let Some(text) = messaging.text() else {
            debug!("Ignoring event without message text");
            outcome.skipped += 1;
            return;
        };

        let Some(sender_id) = messaging.sender_id() else {
            warn!("Ignoring message without sender ID");
            outcome.skipped += 1;
            return;
        };

        info!("Received message from {}: {}", sender_id, text);

        let reply = self.reply_to(text).await;

        match self.sender.send_message(sender_id, &reply).await {
            Ok(_) => debug!("Reply handed to Send API for {}", sender_id),
            Err(e) => {
                error!("Failed to send reply to {}: {}", sender_id, e);
                outcome.send_failures += 1;
            }
        }
        outcome.relayed += 1;
    }

    /// Generate a reply for `text`, falling back to [`FALLBACK_REPLY`]
    pub async fn reply_to(&self, text: &str) -> String {
        match self.generator.generate(text, self.context.text()).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Error generating completion: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }
}
