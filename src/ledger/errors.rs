use crate::domain::DomainError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Fund is already initialized")]
    AlreadyInitialized,
    #[error("Fund is not initialized")]
    NotInitialized,
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
