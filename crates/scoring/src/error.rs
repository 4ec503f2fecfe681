use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScoringError>;

#[derive(Error, Debug)]
pub enum ScoringError {
    /// No file could be admitted to the final-review dossier. Terminal for
    /// the run.
    #[error("No files qualified for the final-review dossier")]
    EmptyDossier,

    #[error("no files were selected")]
    NoFilesSelected,

    #[error("AI client error: {0}")]
    Ai(#[from] scorecard_ai_client::AiError),

    #[error("Chunker error: {0}")]
    Chunk(#[from] scorecard_chunker::ChunkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
