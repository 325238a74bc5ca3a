use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use seqstore_identity::{ErrorKind, IdentityError};
use seqstore_store::StoreError;

use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Identity(#[from] IdentityError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Status code reported to the client.
    ///
    /// A replace whose target key does not exist is reported as 500, the
    /// same as any other failed store round trip.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Identity(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound | ErrorKind::Failure => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Store(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        ApiResponse::message(self.status(), self.to_string()).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use seqstore_identity::EntityId;

    #[test]
    fn validation_errors_are_bad_requests() {
        assert_eq!(ServerError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        let mismatch = IdentityError::IdMismatch {
            expected: EntityId::new(5).unwrap(),
            found: "6".into(),
        };
        assert_eq!(ServerError::from(mismatch).status(), StatusCode::BAD_REQUEST);
        let config = IdentityError::InvalidConfig("invalid extension".into());
        assert_eq!(ServerError::from(config).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_and_store_failures_are_server_errors() {
        let not_found = IdentityError::NotFound { key: "p/5.json".into() };
        assert_eq!(
            ServerError::from(not_found).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let store = IdentityError::Store(StoreError::List {
            prefix: "p/".into(),
            message: "denied".into(),
        });
        assert_eq!(ServerError::from(store).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ServerError::Config("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn identity_messages_pass_through() {
        let err = ServerError::from(IdentityError::NotFound { key: "p/5.json".into() });
        assert_eq!(err.to_string(), "key [p/5.json] not found");
    }
}
