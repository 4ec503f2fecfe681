//! # Scorecard AI Client
//!
//! Universal chat-completion interface with two concrete adapters.
//!
//! Every scoring call in the pipeline goes through [`ChatClient`]: one
//! operation, JSON-mode toggle, default generation parameters, usage
//! counters back. [`OpenAiClient`] speaks the OpenAI-compatible
//! `chat/completions` shape, [`AnthropicClient`] speaks `v1/messages`.
//! [`safe_json_chat`] wraps either one with parse-and-retry semantics for
//! callers that need a JSON object or nothing.

mod anthropic;
mod client;
mod error;
mod openai;
mod safe_json;
mod types;

pub use anthropic::AnthropicClient;
pub use client::{client_from_env, ChatClient, Provider};
pub use error::{AiError, Result};
pub use openai::OpenAiClient;
pub use safe_json::safe_json_chat;
pub use types::{ChatMessage, ChatParams, ChatRequest, ChatResponse, Usage};
