//! Error types for the HTTP boundary.
//!
//! Every failure is rendered as a `text/plain` response whose status code
//! distinguishes client mistakes (400/405/415) from internal failures
//! (500). Messages are one line and safe to display.

use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::model::IngestError;

/// A failure while handling a `/geoip` request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required query parameter was absent or empty.
    #[error("missing required parameter \"{0}\"")]
    MissingParameter(&'static str),

    /// A query parameter was present but not a valid float.
    #[error("invalid value for parameter \"{name}\": {source}")]
    InvalidParameter {
        name: &'static str,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// The POST body carried a Content-Type we cannot ingest.
    #[error("cannot accept requests of type {0}")]
    UnsupportedMediaType(String),

    /// The method is not one of GET/HEAD/POST.
    #[error("method {0} is not allowed")]
    MethodNotAllowed(Method),

    /// A multipart upload did not include a "file" field.
    #[error("multipart upload is missing a \"file\" field")]
    MissingUploadField,

    /// The multipart payload could not be parsed.
    #[error("invalid multipart upload: {0}")]
    InvalidUpload(String),

    /// The raw request body could not be read.
    #[error("failed to read request body: {0}")]
    Body(String),

    /// CSV ingestion failed.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// The storage collaborator failed.
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_) | ApiError::InvalidParameter { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::MissingUploadField | ApiError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::Ingest(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Ingest(_) | ApiError::Storage(_) | ApiError::Body(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("{self}\n"),
        )
            .into_response()
    }
}
