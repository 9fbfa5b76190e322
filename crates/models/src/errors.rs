use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Applying changes produced a value the record type cannot hold.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
