//! Router assembly.

mod common;
mod resource;

pub use common::{common_routes, HEALTH_MESSAGE};
pub use resource::resource_routes;

use crate::handlers::resource::endpoint_not_found;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower::{Layer, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Full application router: common routes, resource routes, a not-found fallback,
/// and a request body limit of `body_limit` bytes.
pub fn app(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .merge(common_routes())
        .merge(resource_routes())
        .fallback(endpoint_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .with_state(state)
}

/// Trims trailing slashes before routing, so `/posts/` serves the same as `/posts`.
pub fn trim_trailing_slash(router: Router) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router)
}
