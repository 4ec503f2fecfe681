use crate::anthropic::AnthropicClient;
use crate::error::{AiError, Result};
use crate::openai::OpenAiClient;
use crate::types::{ChatRequest, ChatResponse};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// The one operation every adapter implements.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Model identifier this client targets (used in scorecards and logs).
    fn model(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Anthropic,
}

impl Provider {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(AiError::Config(format!("Unsupported provider: {other}"))),
        }
    }
}

/// Build a client for `provider`/`model`, reading the API key (and optional
/// base URL override) from that provider's environment variables.
pub fn client_from_env(
    provider: Provider,
    model: &str,
    timeout: Duration,
) -> Result<Arc<dyn ChatClient>> {
    match provider {
        Provider::OpenAi => {
            let key = std::env::var("OPENAI_API_KEY")
                .map_err(|_| AiError::MissingKey("OPENAI_API_KEY".to_string()))?;
            let base = std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
            Ok(Arc::new(OpenAiClient::new(base, key, model.to_string(), timeout)?))
        }
        Provider::Anthropic => {
            let key = std::env::var("ANTHROPIC_API_KEY")
                .map_err(|_| AiError::MissingKey("ANTHROPIC_API_KEY".to_string()))?;
            let base = std::env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string());
            Ok(Arc::new(AnthropicClient::new(base, key, model.to_string(), timeout)?))
        }
    }
}
