use thiserror::Error;

use crate::store::StoreError;

/// Error type for the product data operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductDataError {
    /// Caller input is structurally invalid. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),
    /// A point lookup found nothing.
    #[error("not found: {0}")]
    NotFound(String),
    /// The Entry Store failed to execute a read or write.
    #[error("store error: {0}")]
    Store(StoreError),
    /// The operation was called without a configured Entry Store.
    #[error("no database connection")]
    NoStore,
}

impl From<StoreError> for ProductDataError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidFilter(message) => ProductDataError::Validation(message),
            other => ProductDataError::Store(other),
        }
    }
}

impl ProductDataError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            ProductDataError::Validation(_) => 400,
            ProductDataError::NotFound(_) => 404,
            ProductDataError::Store(_) => 500,
            ProductDataError::NoStore => 500,
        }
    }

    /// The message safe to show to callers. Server-side failures are not
    /// described beyond their class.
    pub fn public_message(&self) -> String {
        match self {
            ProductDataError::Store(_) | ProductDataError::NoStore => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Short label for the error class, used by observers and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProductDataError::Validation(_) => "validation",
            ProductDataError::NotFound(_) => "not_found",
            ProductDataError::Store(_) => "store",
            ProductDataError::NoStore => "no_store",
        }
    }
}
