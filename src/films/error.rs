use super::protocol::{MSG_BODY_TOO_LARGE, MSG_INVALID_BODY, MSG_INVALID_ID, MSG_NOT_FOUND};
use super::types::FilmId;
use crate::store::StoreError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Terminal outcome of a failed films request.
///
/// Converting into a response logs the failure once, at the level matching
/// its class: `warn` for a missing film, `error` for bad input and store
/// failures.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid film id '{raw}'")]
    InvalidId { raw: String },

    #[error("invalid film data: {reason}")]
    InvalidBody { reason: String },

    #[error("film data exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("film {0} not found")]
    NotFound(FilmId),

    /// `message` is the operation-specific text sent to the client.
    #[error("{message}: {source}")]
    Store {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// Classifies a store failure. `NotFound` keeps its identity; anything
    /// else becomes a 500 carrying `message`.
    pub fn from_store(source: StoreError, message: &'static str) -> Self {
        match source {
            StoreError::NotFound(id) => ApiError::NotFound(id),
            source => ApiError::Store { message, source },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidId { .. } | ApiError::InvalidBody { .. } => StatusCode::BAD_REQUEST,
            ApiError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ApiError::InvalidId { .. } => MSG_INVALID_ID,
            ApiError::InvalidBody { .. } => MSG_INVALID_BODY,
            ApiError::BodyTooLarge { .. } => MSG_BODY_TOO_LARGE,
            ApiError::NotFound(_) => MSG_NOT_FOUND,
            ApiError::Store { message, .. } => *message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::InvalidId { raw } => {
                tracing::error!(id = %raw, "Invalid ID");
            }
            ApiError::InvalidBody { reason } => {
                tracing::error!(error = %reason, "Invalid film data");
            }
            ApiError::BodyTooLarge { limit } => {
                tracing::error!(limit, "Film data too large");
            }
            ApiError::NotFound(id) => {
                tracing::warn!(film_id = id, "Film not found");
            }
            ApiError::Store { message, source } => {
                tracing::error!(error = %source, "{}", message);
            }
        }

        (self.status(), self.message()).into_response()
    }
}
