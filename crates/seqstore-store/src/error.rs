/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Listing keys under a prefix failed.
    #[error("list failed under prefix [{prefix}]: {message}")]
    List { prefix: String, message: String },

    /// The existence check for a key failed for a reason other than "not found".
    #[error("head failed for [{key}]: {message}")]
    Head { key: String, message: String },

    /// Writing an object failed.
    #[error("put failed for [{key}]: {message}")]
    Put { key: String, message: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend is misconfigured (bad bucket, unsupported ACL, ...).
    #[error("store configuration error: {0}")]
    Config(String),

    /// The backend could not be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
