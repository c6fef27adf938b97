//! HTTP handlers for resource CRUD and search.

pub mod resource;
pub use resource::*;
