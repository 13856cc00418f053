use thiserror::Error;

#[derive(Error, Debug)]
pub enum RootMapError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Arbitration error: {0}")]
    Arbitration(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
