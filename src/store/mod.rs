//! Document store boundary: one collection per resource, JSON documents keyed by `_id`.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{ensure_database_exists, ensure_collections, PgDocumentStore};

use crate::config::ResolvedModel;
use crate::error::StoreError;
use crate::id::DocumentId;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

/// Predicate over documents.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Case-insensitive literal substring. On an array field, any string element may match.
    Contains { field: String, pattern: String },
    /// Exact string equality.
    Equals { field: String, value: String },
    /// Exact string inequality; a missing field counts as not equal.
    NotEquals { field: String, value: String },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    /// Matches every document.
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    pub fn contains(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Contains {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn not_equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::NotEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Filter::And(v) if v.is_empty())
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Contains { field, pattern } => {
                let needle = pattern.to_lowercase();
                match doc.get(field) {
                    Some(Value::String(s)) => s.to_lowercase().contains(&needle),
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .any(|s| s.to_lowercase().contains(&needle)),
                    _ => false,
                }
            }
            Filter::Equals { field, value } => doc.get(field).and_then(Value::as_str) == Some(value.as_str()),
            Filter::NotEquals { field, value } => doc.get(field).and_then(Value::as_str) != Some(value.as_str()),
            Filter::And(parts) => parts.iter().all(|f| f.matches(doc)),
            Filter::Or(parts) => parts.iter().any(|f| f.matches(doc)),
        }
    }
}

/// Descending sort on one field, ties broken by `_id` descending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

impl Sort {
    pub fn newest_first(field: impl Into<String>) -> Self {
        Sort {
            field: field.into(),
            descending: true,
        }
    }
}

/// Document-store operations needed by the resource engine.
///
/// `skip` below zero is treated as zero. `limit == 0` returns every match;
/// a negative limit is treated as its absolute value.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError>;

    async fn find_by_id(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError>;

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        sort: &Sort,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Shallow-merges `partial` into the stored document and returns the result.
    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: &DocumentId,
        partial: Document,
    ) -> Result<Option<Document>, StoreError>;

    async fn find_by_id_and_delete(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>, StoreError>;

    /// Case-insensitive unique constraint on a string field. Idempotent.
    async fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Declare every configured unique field on its collection.
pub async fn ensure_unique_indexes(store: &dyn DocumentStore, model: &ResolvedModel) -> Result<(), StoreError> {
    for res in &model.resources {
        for field in &res.unique {
            store.ensure_unique_index(&res.collection, field).await?;
        }
    }
    Ok(())
}
