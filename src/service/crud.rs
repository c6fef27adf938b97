//! Generic resource operations against any `DocumentStore`.

use crate::config::ResolvedResource;
use crate::error::{AppError, StoreError};
use crate::id::DocumentId;
use crate::query::{ListQuery, PageWindow, SearchQuery};
use crate::response::Pagination;
use crate::store::{Document, DocumentStore, Filter, Sort, ID_FIELD};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

/// One page of documents plus the totals needed for the pagination block.
#[derive(Debug)]
pub struct Page {
    pub items: Vec<Document>,
    pub total: u64,
    pub window: PageWindow,
}

impl Page {
    pub fn pagination(&self, resource: &ResolvedResource) -> Pagination {
        Pagination::new(
            self.window.page,
            self.window.limit,
            self.total,
            self.items.len() as u64,
            resource.pagination.clone(),
        )
    }
}

/// RFC 3339 UTC with milliseconds; lexical order is chronological.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn map_store_error(resource: &ResolvedResource, err: StoreError) -> AppError {
    match err {
        StoreError::Duplicate { .. } => AppError::Conflict(resource.conflict_message.clone()),
        other => AppError::Store(other),
    }
}

pub struct CrudService;

impl CrudService {
    pub async fn list(
        store: &dyn DocumentStore,
        resource: &ResolvedResource,
        query: &ListQuery,
    ) -> Result<Page, AppError> {
        Self::page(store, resource, &query.filter, query.window).await
    }

    pub async fn search(
        store: &dyn DocumentStore,
        resource: &ResolvedResource,
        query: &SearchQuery,
    ) -> Result<Page, AppError> {
        tracing::debug!(resource = %resource.name, term = %query.term, "search");
        Self::page(store, resource, &query.filter, query.window).await
    }

    async fn page(
        store: &dyn DocumentStore,
        resource: &ResolvedResource,
        filter: &Filter,
        window: PageWindow,
    ) -> Result<Page, AppError> {
        let sort = Sort::newest_first(resource.sort_field());
        let items = store
            .find_many(&resource.collection, filter, &sort, window.skip, window.limit)
            .await?;
        let total = store.count(&resource.collection, filter).await?;
        tracing::debug!(
            resource = %resource.name,
            page = window.page,
            limit = window.limit,
            total,
            "list"
        );
        Ok(Page { items, total, window })
    }

    pub async fn read(
        store: &dyn DocumentStore,
        resource: &ResolvedResource,
        id: &DocumentId,
    ) -> Result<Document, AppError> {
        tracing::debug!(resource = %resource.name, %id, "read");
        store
            .find_by_id(&resource.collection, id)
            .await?
            .ok_or_else(|| AppError::NotFound(resource.not_found_message.clone()))
    }

    /// Insert a validated payload with a fresh id and both timestamp pairs.
    pub async fn create(
        store: &dyn DocumentStore,
        resource: &ResolvedResource,
        payload: Document,
    ) -> Result<Document, AppError> {
        Self::check_unique(store, resource, &payload, None).await?;

        let id = DocumentId::generate();
        let now = Value::String(now_timestamp());
        let mut doc = Document::new();
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        doc.extend(payload);
        for field in resource.created_fields.iter().chain(&resource.updated_fields) {
            doc.insert(field.clone(), now.clone());
        }

        let created = store
            .insert(&resource.collection, doc)
            .await
            .map_err(|e| map_store_error(resource, e))?;
        tracing::info!(resource = %resource.name, %id, "created");
        Ok(created)
    }

    /// Merge a validated partial payload and refresh the update timestamps.
    pub async fn update(
        store: &dyn DocumentStore,
        resource: &ResolvedResource,
        id: &DocumentId,
        partial: Document,
    ) -> Result<Document, AppError> {
        Self::check_unique(store, resource, &partial, Some(id)).await?;

        let mut partial = partial;
        let now = Value::String(now_timestamp());
        for field in &resource.updated_fields {
            partial.insert(field.clone(), now.clone());
        }
        let updated = store
            .find_by_id_and_update(&resource.collection, id, partial)
            .await
            .map_err(|e| map_store_error(resource, e))?
            .ok_or_else(|| AppError::NotFound(resource.not_found_message.clone()))?;
        tracing::info!(resource = %resource.name, %id, "updated");
        Ok(updated)
    }

    pub async fn delete(
        store: &dyn DocumentStore,
        resource: &ResolvedResource,
        id: &DocumentId,
    ) -> Result<Document, AppError> {
        let removed = store
            .find_by_id_and_delete(&resource.collection, id)
            .await?
            .ok_or_else(|| AppError::NotFound(resource.not_found_message.clone()))?;
        tracing::info!(resource = %resource.name, %id, "deleted");
        Ok(removed)
    }

    /// Reject a payload whose unique fields are already taken by another document.
    async fn check_unique(
        store: &dyn DocumentStore,
        resource: &ResolvedResource,
        payload: &Document,
        exclude: Option<&DocumentId>,
    ) -> Result<(), AppError> {
        for field in &resource.unique {
            let Some(value) = payload.get(field).and_then(Value::as_str) else {
                continue;
            };
            let taken = Filter::equals(field.as_str(), value.to_lowercase());
            let filter = match exclude {
                Some(id) => Filter::And(vec![taken, Filter::not_equals(ID_FIELD, id.to_string())]),
                None => taken,
            };
            if store.find_one(&resource.collection, &filter).await?.is_some() {
                tracing::debug!(resource = %resource.name, field = %field, "unique value taken");
                return Err(AppError::Conflict(resource.conflict_message.clone()));
            }
        }
        Ok(())
    }
}
