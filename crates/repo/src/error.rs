use thiserror::Error;

pub type Result<T> = std::result::Result<T, RepoError>;

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Failed to acquire repository: {0}")]
    Acquire(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid repository path: {0}")]
    InvalidPath(String),
}

impl RepoError {
    pub fn acquire(msg: impl Into<String>) -> Self {
        Self::Acquire(msg.into())
    }
}
