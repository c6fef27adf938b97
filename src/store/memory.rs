//! In-memory document store for tests and database-less runs.

use super::{Document, DocumentStore, Filter, Sort, ID_FIELD};
use crate::error::StoreError;
use crate::id::DocumentId;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct Collection {
    docs: HashMap<String, Document>,
    /// Fields with a case-insensitive unique constraint.
    unique: Vec<String>,
}

impl Collection {
    /// First unique field on which `doc` collides with a document other than `doc` itself.
    fn violated_unique(&self, doc: &Document) -> Option<&str> {
        let own_id = doc.get(ID_FIELD).and_then(Value::as_str);
        self.unique.iter().map(String::as_str).find(|field| {
            let Some(value) = doc.get(*field).and_then(Value::as_str).map(str::to_lowercase) else {
                return false;
            };
            self.docs.iter().any(|(id, other)| {
                Some(id.as_str()) != own_id
                    && other.get(*field).and_then(Value::as_str).map(str::to_lowercase).as_deref() == Some(value.as_str())
            })
        })
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_key<'a>(doc: &'a Document, field: &str) -> &'a str {
    doc.get(field).and_then(Value::as_str).unwrap_or("")
}

fn compare(a: &Document, b: &Document, sort: &Sort) -> Ordering {
    let ord = sort_key(a, &sort.field)
        .cmp(sort_key(b, &sort.field))
        .then_with(|| sort_key(a, ID_FIELD).cmp(sort_key(b, ID_FIELD)));
    if sort.descending {
        ord.reverse()
    } else {
        ord
    }
}

fn duplicate(collection: &str, field: &str) -> StoreError {
    StoreError::Duplicate {
        collection: collection.to_string(),
        field: field.to_string(),
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        let id = doc
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::Corrupt {
                collection: collection.to_string(),
                reason: "document without _id".into(),
            })?;
        let mut guard = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let coll = guard.entry(collection.to_string()).or_default();
        if coll.docs.contains_key(&id) {
            return Err(duplicate(collection, ID_FIELD));
        }
        if let Some(field) = coll.violated_unique(&doc) {
            return Err(duplicate(collection, field));
        }
        coll.docs.insert(id, doc.clone());
        Ok(doc)
    }

    async fn find_by_id(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        let guard = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard
            .get(collection)
            .and_then(|c| c.docs.get(&id.to_string()))
            .cloned())
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        sort: &Sort,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Document>, StoreError> {
        let guard = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        let Some(coll) = guard.get(collection) else {
            return Ok(Vec::new());
        };
        let mut matching: Vec<&Document> = coll.docs.values().filter(|d| filter.matches(d)).collect();
        matching.sort_by(|a, b| compare(a, b, sort));

        let skip = usize::try_from(skip.max(0)).unwrap_or(usize::MAX);
        let take = match limit.unsigned_abs() {
            0 => usize::MAX,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        };
        Ok(matching.into_iter().skip(skip).take(take).cloned().collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let guard = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard
            .get(collection)
            .map(|c| c.docs.values().filter(|d| filter.matches(d)).count() as u64)
            .unwrap_or(0))
    }

    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: &DocumentId,
        partial: Document,
    ) -> Result<Option<Document>, StoreError> {
        let mut guard = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let Some(coll) = guard.get_mut(collection) else {
            return Ok(None);
        };
        let key = id.to_string();
        let Some(current) = coll.docs.get(&key) else {
            return Ok(None);
        };
        let mut merged = current.clone();
        for (k, v) in partial {
            if k != ID_FIELD {
                merged.insert(k, v);
            }
        }
        if let Some(field) = coll.violated_unique(&merged) {
            return Err(duplicate(collection, field));
        }
        coll.docs.insert(key, merged.clone());
        Ok(Some(merged))
    }

    async fn find_by_id_and_delete(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        let mut guard = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        Ok(guard
            .get_mut(collection)
            .and_then(|c| c.docs.remove(&id.to_string())))
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let guard = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard
            .get(collection)
            .and_then(|c| c.docs.values().find(|d| filter.matches(d)))
            .cloned())
    }

    async fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        let mut guard = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let coll = guard.entry(collection.to_string()).or_default();
        if !coll.unique.iter().any(|f| f == field) {
            coll.unique.push(field.to_string());
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.collections.read().map(|_| ()).map_err(|_| StoreError::Poisoned)
    }
}
