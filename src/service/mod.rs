//! CrudService: generic resource operations over the document store.

mod crud;
mod validation;
pub use crud::{now_timestamp, CrudService, Page};
pub use validation::{Mode, RequestValidator};
