//! PostgreSQL document store: one JSONB table per collection.

use super::{Document, DocumentStore, Filter, Sort};
use crate::config::ResolvedModel;
use crate::error::StoreError;
use crate::id::DocumentId;
use crate::sql::{self, bind_all, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    schema: String,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgDocumentStore {
            pool,
            schema: schema.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    async fn fetch_doc(&self, collection: &str, q: QueryBuf) -> Result<Option<Document>, StoreError> {
        tracing::debug!(sql = %q.sql, "store query");
        let row: Option<(Json<Value>,)> = bind_all(sqlx::query_as(&q.sql), &q.params)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(collection, e))?;
        row.map(|(Json(v),)| into_document(collection, v)).transpose()
    }
}

fn into_document(collection: &str, value: Value) -> Result<Document, StoreError> {
    match value {
        Value::Object(m) => Ok(m),
        other => Err(StoreError::Corrupt {
            collection: collection.to_string(),
            reason: format!("expected object, found {}", other),
        }),
    }
}

/// Unique violations become `Duplicate`; the field is recovered from the index name.
fn map_db_error(collection: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let field = db
                .constraint()
                .and_then(|c| unique_field(collection, c))
                .unwrap_or(super::ID_FIELD)
                .to_string();
            return StoreError::Duplicate {
                collection: collection.to_string(),
                field,
            };
        }
    }
    StoreError::Db(err)
}

/// Field behind a `<collection>_<field>_unique` index name.
fn unique_field<'c>(collection: &str, constraint: &'c str) -> Option<&'c str> {
    constraint
        .strip_prefix(collection)?
        .strip_prefix('_')?
        .strip_suffix("_unique")
        .filter(|f| !f.is_empty())
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        let id = doc
            .get(super::ID_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Corrupt {
                collection: collection.to_string(),
                reason: "document without _id".into(),
            })?
            .to_string();
        let q = sql::insert(&self.schema, collection, &id, &doc);
        self.fetch_doc(collection, q).await?.ok_or_else(|| StoreError::Corrupt {
            collection: collection.to_string(),
            reason: "insert returned no row".into(),
        })
    }

    async fn find_by_id(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        let q = sql::select_by_id(&self.schema, collection, &id.to_string());
        self.fetch_doc(collection, q).await
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        sort: &Sort,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Document>, StoreError> {
        let q = sql::select_many(&self.schema, collection, filter, sort, skip, limit);
        tracing::debug!(sql = %q.sql, "store query");
        let rows: Vec<(Json<Value>,)> = bind_all(sqlx::query_as(&q.sql), &q.params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error(collection, e))?;
        rows.into_iter()
            .map(|(Json(v),)| into_document(collection, v))
            .collect()
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let q = sql::count(&self.schema, collection, filter);
        tracing::debug!(sql = %q.sql, "store query");
        let (n,): (i64,) = bind_all(sqlx::query_as(&q.sql), &q.params)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(collection, e))?;
        Ok(n.max(0) as u64)
    }

    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: &DocumentId,
        partial: Document,
    ) -> Result<Option<Document>, StoreError> {
        let q = sql::update_merge(&self.schema, collection, &id.to_string(), &partial);
        self.fetch_doc(collection, q).await
    }

    async fn find_by_id_and_delete(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        let q = sql::delete(&self.schema, collection, &id.to_string());
        self.fetch_doc(collection, q).await
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let q = sql::select_one(&self.schema, collection, filter);
        self.fetch_doc(collection, q).await
    }

    async fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        let ddl = sql::create_unique_index(&self.schema, collection, field);
        tracing::debug!(sql = %ddl, "ensure unique index");
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create the schema and one table per configured collection. Idempotent.
pub async fn ensure_collections(store: &PgDocumentStore, model: &ResolvedModel) -> Result<(), StoreError> {
    sqlx::query(&sql::create_schema(store.schema()))
        .execute(store.pool())
        .await?;
    for res in &model.resources {
        let ddl = sql::create_collection_table(store.schema(), &res.collection);
        tracing::debug!(sql = %ddl, "ensure collection");
        sqlx::query(&ddl).execute(store.pool()).await?;
    }
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", sql::quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), StoreError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| StoreError::InvalidUrl("no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_database_name() {
        let (admin, name) = parse_db_name_from_url("postgres://u:p@localhost:5432/blog_aulas?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(name, "blog_aulas");
        assert!(parse_db_name_from_url("nopath").is_err());
    }

    #[test]
    fn unique_index_names_resolve_to_fields() {
        let index = sql::create_unique_index("blog", "professores", "email");
        assert!(index.contains("\"professores_email_unique\""));
        assert_eq!(unique_field("professores", "professores_email_unique"), Some("email"));
        assert_eq!(unique_field("alunos", "alunos_nome_completo_unique"), Some("nome_completo"));
        assert_eq!(unique_field("alunos", "professores_email_unique"), None);
        assert_eq!(unique_field("alunos", "alunos_pkey"), None);
        assert_eq!(unique_field("alunos", "alunos__unique"), None);
    }

    #[test]
    fn into_document_rejects_non_objects() {
        assert!(into_document("posts", serde_json::json!({"a": 1})).is_ok());
        assert!(matches!(
            into_document("posts", serde_json::json!([1])),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
