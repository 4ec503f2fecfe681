use thiserror::Error;

pub type Result<T> = std::result::Result<T, AiError>;

#[derive(Error, Debug)]
pub enum AiError {
    /// Network or timeout failure before a response arrived.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered, but not with a usable completion.
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Missing API key: set {0}")]
    MissingKey(String),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl AiError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }
}
