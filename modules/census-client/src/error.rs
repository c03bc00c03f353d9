use thiserror::Error;

pub type Result<T> = std::result::Result<T, CensusError>;

#[derive(Debug, Error)]
pub enum CensusError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for CensusError {
    fn from(err: reqwest::Error) -> Self {
        CensusError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for CensusError {
    fn from(err: serde_json::Error) -> Self {
        CensusError::Parse(err.to_string())
    }
}
