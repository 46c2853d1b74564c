//! Error types for DropVault.
//!
//! All store failures are strongly typed and propagated to the caller.
//! Messages never include token values or key material.

/// Store error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Catalog unreadable: {0}")]
    CatalogUnreadable(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Invalid username or email")]
    InvalidCredentials,

    #[error("Email not found")]
    EmailNotFound,

    #[error("Mail delivery failed: {0}")]
    MailDelivery(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether this error reflects a fault of the storage layer rather than
    /// of the request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            StoreError::CatalogUnreadable(_)
                | StoreError::StorageUnavailable(_)
                | StoreError::InvalidFileFormat(_)
                | StoreError::SerializationError(_)
                | StoreError::MailDelivery(_)
                | StoreError::DerivationFailed(_)
                | StoreError::EncryptionFailed(_)
                | StoreError::Io(_)
        )
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::SerializationError(e.to_string())
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, StoreError>;
