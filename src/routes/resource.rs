//! Resource routes built from the resolved model.
//! Parameterized paths; handlers resolve the resource by path segment.

use crate::handlers::resource::{create, delete as delete_handler, list, read, search, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn resource_routes() -> Router<AppState> {
    Router::new()
        .route("/:path_segment", get(list).post(create))
        .route("/:path_segment/search", get(search))
        .route(
            "/:path_segment/:id",
            get(read).put(update).delete(delete_handler),
        )
}
