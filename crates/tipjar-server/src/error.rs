use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tipjar_sdk::{ErrorKind, SdkError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("tipjar error: {0}")]
    Sdk(#[from] SdkError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// JSON error body returned by every endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// An error ready to be sent to an HTTP client.
#[derive(Clone, Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                message: message.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidAmount
        | ErrorKind::InvalidAddress
        | ErrorKind::InvalidExternalRef
        | ErrorKind::InvalidTransactionId => StatusCode::BAD_REQUEST,
        ErrorKind::NotRegistered => StatusCode::NOT_FOUND,
        ErrorKind::DuplicateRegistration | ErrorKind::DuplicateTransaction => StatusCode::CONFLICT,
        ErrorKind::InsufficientBalance | ErrorKind::AmountOverflow => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorKind::Integrity
        | ErrorKind::Serialization
        | ErrorKind::Config
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<SdkError> for ApiError {
    fn from(err: SdkError) -> Self {
        let kind = err.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self::new(status, kind.as_str(), err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
