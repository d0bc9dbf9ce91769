use thiserror::Error;
use windowtree_cache::CacheError;

use crate::host::WindowId;

#[derive(Debug, Error)]
pub enum Error {
    /// An argument had the wrong type or shape. Nothing was mutated.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("no window manager attached to {0}")]
    Detached(WindowId),

    #[error(transparent)]
    Cache(CacheError),
}

impl Error {
    pub(crate) fn contract(message: impl Into<String>) -> Self {
        Error::ContractViolation(message.into())
    }
}

impl From<CacheError> for Error {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Contract(msg) => Error::ContractViolation(msg),
            other => Error::Cache(other),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
