use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// File or directory absent in the store.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-2xx response from the remote API.
    #[error("Storage API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed payload from the store (bad base64, unexpected shape).
    #[error("Invalid content: {0}")]
    Decode(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
