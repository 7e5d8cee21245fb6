use crate::domain::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed JSON under key {key}: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u64),
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(#[from] DomainError),
    #[error("Storage quota exceeded writing {key} ({size} bytes)")]
    QuotaExceeded { key: String, size: usize },
}
