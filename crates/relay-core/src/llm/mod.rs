//! Chat-completion client and types
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint.

mod client;
mod types;

pub use client::{system_prompt, CompletionClient, CompletionError, ReplyGenerator};
pub use types::*;
