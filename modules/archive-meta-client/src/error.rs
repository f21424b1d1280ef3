use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArchiveMetaError>;

#[derive(Debug, Error)]
pub enum ArchiveMetaError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response body: {0}")]
    Decode(String),

    #[error("Service reported: {0}")]
    Service(String),
}

impl From<reqwest::Error> for ArchiveMetaError {
    fn from(err: reqwest::Error) -> Self {
        ArchiveMetaError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ArchiveMetaError {
    fn from(err: serde_json::Error) -> Self {
        ArchiveMetaError::Decode(err.to_string())
    }
}
