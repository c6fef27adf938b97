//! Lesson blog: descriptor-driven REST backend for posts, professores and alunos.

pub mod config;
pub mod error;
pub mod handlers;
pub mod id;
pub mod query;
pub mod response;
pub mod routes;
pub mod seed;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{builtin_config, load_from_path, resolve, FullConfig, ResolvedModel, ResolvedResource, Settings};
pub use error::{AppError, ConfigError, StoreError};
pub use id::DocumentId;
pub use response::{success_many, success_one, Envelope, Pagination};
pub use routes::{app, common_routes, resource_routes, trim_trailing_slash};
pub use seed::seed_posts;
pub use service::CrudService;
pub use state::AppState;
pub use store::{
    ensure_collections, ensure_database_exists, ensure_unique_indexes, DocumentStore, Filter, InMemoryStore,
    PgDocumentStore,
};
