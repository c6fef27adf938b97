//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::Envelope;

pub const MSG_INVALID_ID: &str = "ID inválido";
pub const MSG_INVALID_DATA: &str = "Dados inválidos";
pub const MSG_INTERNAL: &str = "Erro interno do servidor";
pub const MSG_ENDPOINT_NOT_FOUND: &str = "Endpoint não encontrado";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("resource '{resource}' references undeclared field '{field}' in {usage}")]
    MissingField {
        resource: String,
        field: String,
        usage: &'static str,
    },
    #[error("duplicate path segment: {0}")]
    DuplicatePathSegment(String),
    #[error("duplicate collection: {0}")]
    DuplicateCollection(String),
    #[error("invalid rule for {resource}.{field}: {reason}")]
    InvalidRule {
        resource: String,
        field: String,
        reason: String,
    },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate value for unique field '{field}' in {collection}")]
    Duplicate { collection: String, field: String },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("invalid database url: {0}")]
    InvalidUrl(String),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("corrupt document in {collection}: {reason}")]
    Corrupt { collection: String, reason: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid id")]
    InvalidId,
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("no endpoint at {0}")]
    UnknownEndpoint(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidId
            | AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::UnknownEndpoint(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::Store(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Envelope for this error. Internal detail is attached only when `expose_details` is set.
    pub fn envelope(&self, expose_details: bool) -> Envelope<()> {
        match self {
            AppError::InvalidId => Envelope::failure(MSG_INVALID_ID),
            AppError::Validation(reasons) => {
                Envelope::failure(MSG_INVALID_DATA).with_errors(reasons.clone())
            }
            AppError::BadRequest(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                Envelope::failure(msg.clone())
            }
            AppError::UnknownEndpoint(endpoint) => {
                Envelope::failure(MSG_ENDPOINT_NOT_FOUND).with_endpoint(endpoint.clone())
            }
            AppError::Config(_) | AppError::Store(_) | AppError::Internal(_) => {
                let body = Envelope::failure(MSG_INTERNAL);
                if expose_details {
                    body.with_detail(self.to_string())
                } else {
                    body
                }
            }
        }
    }
}

/// An error bound to the response policy of the running server.
#[derive(Debug)]
pub struct ErrorResponse {
    pub error: AppError,
    pub expose_details: bool,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.error.status();
        if status.is_server_error() {
            tracing::error!(error = %self.error, "request failed");
        } else {
            tracing::debug!(error = %self.error, status = status.as_u16(), "request rejected");
        }
        (status, Json(self.error.envelope(self.expose_details))).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ErrorResponse {
            error: self,
            expose_details: false,
        }
        .into_response()
    }
}
