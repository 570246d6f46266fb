use thiserror::Error;

#[derive(Debug, Error)]
pub enum BiError {
    #[error("franchise not found: {0}")]
    UnknownFranchise(String),
    #[error("summary date {0} is in the future")]
    FutureDate(String),
    #[error("database: {0}")]
    Database(String),
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("io: {0}")]
    Io(String),
}

impl From<rusqlite::Error> for BiError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Database(value.to_string())
    }
}

impl From<serde_json::Error> for BiError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

impl From<std::io::Error> for BiError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

pub type BiResult<T> = Result<T, BiError>;
