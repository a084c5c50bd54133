use crate::crypto::CryptoError;
use crate::domain::LedgerError;
use crate::storage::StorageError;

/// Terminal outcome of a failed request.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("All fields are required. Missing: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    #[error("{role} already registered.")]
    AlreadyRegistered { role: &'static str },

    #[error("{0}")]
    LoginRejected(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Failed to store data: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("{0}")]
    Internal(String),
}
