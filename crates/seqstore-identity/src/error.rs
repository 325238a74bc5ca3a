//! Error types for identity allocation and entity writes.

use thiserror::Error;

use seqstore_store::StoreError;

use crate::entity::EntityId;

/// How an [`IdentityError`] should be treated by callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input or configuration; detected before any store call.
    Validation,
    /// The replace target does not exist.
    NotFound,
    /// Listing, existence check, write, or allocation failed.
    Failure,
}

/// Errors that can occur while allocating ids or writing entities.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The entity is missing, not a JSON object, or empty.
    #[error("invalid entity: {0}")]
    InvalidEntity(String),

    /// The id is not acceptable for the operation.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// The id supplied by the caller differs from the one on the entity.
    #[error("provided id [{expected}] does not match identity key on entity [{found}]")]
    IdMismatch { expected: EntityId, found: String },

    /// A required writer setting is absent or malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The key a replace targets does not exist.
    #[error("key [{key}] not found")]
    NotFound { key: String },

    /// The highest existing id is `u64::MAX`; no next id exists.
    #[error("id space exhausted: highest existing id is {max}")]
    IdSpaceExhausted { max: u64 },

    /// The entity could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The object store rejected a list, head, or put.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEntity(_)
            | Self::InvalidId(_)
            | Self::IdMismatch { .. }
            | Self::InvalidConfig(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::IdSpaceExhausted { .. } | Self::Serialization(_) | Self::Store(_) => {
                ErrorKind::Failure
            }
        }
    }
}

/// Convenience type alias for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
