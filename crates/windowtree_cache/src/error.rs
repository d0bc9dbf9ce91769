use std::fmt;

/// Error types for name cache and persistence store operations.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheError {
    /// The caller passed an argument the cache refuses to store.
    Contract(String),
    ReadError(String),
    WriteError(String),
    ParseError(String),
    SerializeError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Contract(msg) => write!(f, "invalid cache argument: {}", msg),
            CacheError::ReadError(msg) => write!(f, "failed to read name cache: {}", msg),
            CacheError::WriteError(msg) => write!(f, "failed to write name cache: {}", msg),
            CacheError::ParseError(msg) => write!(f, "failed to parse name cache: {}", msg),
            CacheError::SerializeError(msg) => {
                write!(f, "failed to serialize name cache: {}", msg)
            }
        }
    }
}

impl std::error::Error for CacheError {}

impl From<std::io::Error> for CacheError {
    fn from(e: std::io::Error) -> Self {
        CacheError::ReadError(e.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::ParseError(e.to_string())
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
