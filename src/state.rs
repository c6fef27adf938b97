//! Shared application state for all routes.

use crate::config::{Operation, ResolvedModel, ResolvedResource};
use crate::error::{AppError, ErrorResponse};
use crate::store::DocumentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub model: Arc<ResolvedModel>,
    /// Attach internal error detail (`erro`) to 500 responses.
    pub expose_errors: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, model: ResolvedModel) -> Self {
        AppState {
            store,
            model: Arc::new(model),
            expose_errors: false,
        }
    }

    pub fn with_exposed_errors(mut self, expose: bool) -> Self {
        self.expose_errors = expose;
        self
    }

    /// Resource under `path_segment` that allows `op`; otherwise `endpoint` does not exist.
    pub fn resource(&self, path_segment: &str, op: Operation, endpoint: &str) -> Result<&ResolvedResource, AppError> {
        self.model
            .resource_by_path(path_segment)
            .filter(|r| r.allows(op))
            .ok_or_else(|| AppError::UnknownEndpoint(endpoint.to_string()))
    }

    pub fn reject(&self, error: AppError) -> ErrorResponse {
        ErrorResponse {
            error,
            expose_details: self.expose_errors,
        }
    }
}
