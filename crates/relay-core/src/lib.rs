//! relay-core: shared pieces of the Messenger relay
//!
//! Configuration, the static context document, and the chat-completion
//! client that turns a user message into a reply.

pub mod config;
pub mod context;
pub mod error;
pub mod llm;

pub use config::{Config, ContextConfig, FacebookConfig, LlmConfig, ServerConfig};
pub use context::ContextDocument;
pub use error::{Error, Result};
pub use llm::{CompletionClient, CompletionError, ReplyGenerator};
