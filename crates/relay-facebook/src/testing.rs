//! Recording fakes for the relay seams

use std::sync::Mutex;

use async_trait::async_trait;
use relay_core::{CompletionError, ReplyGenerator};

use crate::api::MessageSender;
use crate::error::{FacebookError, Result};

/// Records every `(user_text, context)` it is asked about
pub struct RecordingGenerator {
    pub calls: Mutex<Vec<(String, String)>>,
    reply: Option<String>,
}

impl RecordingGenerator {
    /// Answers every message with `reply`
    pub fn replying(reply: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply: Some(reply.to_string()),
        }
    }

    /// Fails every call
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply: None,
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplyGenerator for RecordingGenerator {
    async fn generate(
        &self,
        user_text: &str,
        context: &str,
    ) -> std::result::Result<String, CompletionError> {
        self.calls
            .lock()
            .unwrap()
            .push((user_text.to_string(), context.to_string()));

        self.reply.clone().ok_or(CompletionError::EmptyResponse)
    }
}

/// Records every `(recipient_id, text)` it is asked to send
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_message(&self, recipient_id: &str, text: &str) -> Result<serde_json::Value> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient_id.to_string(), text.to_string()));

        if self.fail {
            return Err(FacebookError::InvalidPayload("send rejected".to_string()));
        }
        Ok(serde_json::json!({"recipient_id": recipient_id, "message_id": "m_test"}))
    }
}
