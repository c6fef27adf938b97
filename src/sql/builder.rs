//! Builds parameterized statements over `(id TEXT PRIMARY KEY, doc JSONB)` collection tables.
//!
//! Schema, table and index names are quoted identifiers from configuration; JSON keys are
//! quoted string literals from configuration. User input only ever travels as parameters.

use super::params::{like_pattern, PgBindValue};
use crate::store::{Document, Filter, Sort, ID_FIELD};
use serde_json::Value;

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

/// JSON key as a SQL string literal.
fn key_literal(key: &str) -> String {
    format!("'{}'", key.replace('\'', "''"))
}

/// Text expression for a document field; `_id` maps to the id column.
fn text_expr(field: &str) -> String {
    if field == ID_FIELD {
        "id".to_string()
    } else {
        format!("doc->>{}", key_literal(field))
    }
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Compile a filter into a boolean SQL expression, pushing its parameters.
    fn push_filter(&mut self, filter: &Filter) -> String {
        match filter {
            Filter::Contains { field, pattern } => {
                let n = self.push_param(PgBindValue::Text(like_pattern(pattern)));
                if field == ID_FIELD {
                    return format!("id ILIKE ${} ESCAPE '\\'", n);
                }
                let key = key_literal(field);
                format!(
                    "(CASE jsonb_typeof(doc->{key}) WHEN 'array' THEN EXISTS (SELECT 1 FROM jsonb_array_elements_text(doc->{key}) AS e(v) WHERE e.v ILIKE ${n} ESCAPE '\\') ELSE doc->>{key} ILIKE ${n} ESCAPE '\\' END)",
                )
            }
            Filter::Equals { field, value } => {
                let n = self.push_param(PgBindValue::text(value.as_str()));
                format!("{} = ${}", text_expr(field), n)
            }
            Filter::NotEquals { field, value } => {
                let n = self.push_param(PgBindValue::text(value.as_str()));
                format!("{} IS DISTINCT FROM ${}", text_expr(field), n)
            }
            Filter::And(parts) => self.join_filters(parts, " AND ", "TRUE"),
            Filter::Or(parts) => self.join_filters(parts, " OR ", "FALSE"),
        }
    }

    fn join_filters(&mut self, parts: &[Filter], sep: &str, empty: &str) -> String {
        if parts.is_empty() {
            return empty.to_string();
        }
        let compiled: Vec<String> = parts.iter().map(|p| self.push_filter(p)).collect();
        format!("({})", compiled.join(sep))
    }

    fn where_clause(&mut self, filter: &Filter) -> String {
        if filter.is_all() {
            String::new()
        } else {
            format!(" WHERE {}", self.push_filter(filter))
        }
    }
}

pub fn create_schema(schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema))
}

pub fn create_collection_table(schema: &str, collection: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY, doc JSONB NOT NULL)",
        qualified_table(schema, collection)
    )
}

/// Case-insensitive unique expression index on one document field.
pub fn create_unique_index(schema: &str, collection: &str, field: &str) -> String {
    format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ((lower(doc->>{})))",
        quoted(&format!("{}_{}_unique", collection, field)),
        qualified_table(schema, collection),
        key_literal(field)
    )
}

/// INSERT one document; `_id` is stored in the id column and kept inside `doc`.
pub fn insert(schema: &str, collection: &str, id: &str, doc: &Document) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_n = q.push_param(PgBindValue::text(id));
    let doc_n = q.push_param(PgBindValue::Json(Value::Object(doc.clone())));
    q.sql = format!(
        "INSERT INTO {} (id, doc) VALUES (${}, ${}::jsonb) RETURNING doc",
        qualified_table(schema, collection),
        id_n,
        doc_n
    );
    q
}

pub fn select_by_id(schema: &str, collection: &str, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(PgBindValue::text(id));
    q.sql = format!("SELECT doc FROM {} WHERE id = ${}", qualified_table(schema, collection), n);
    q
}

/// SELECT with filter, sort (ties on id), OFFSET clamped to zero, and LIMIT (`0` = no limit).
pub fn select_many(schema: &str, collection: &str, filter: &Filter, sort: &Sort, skip: i64, limit: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = q.where_clause(filter);
    let dir = if sort.descending { "DESC" } else { "ASC" };
    let limit_clause = match limit.unsigned_abs() {
        0 => " LIMIT ALL".to_string(),
        n => {
            let p = q.push_param(PgBindValue::I64(i64::try_from(n).unwrap_or(i64::MAX)));
            format!(" LIMIT ${}", p)
        }
    };
    let offset_n = q.push_param(PgBindValue::I64(skip.max(0)));
    q.sql = format!(
        "SELECT doc FROM {}{} ORDER BY {} {dir}, id {dir}{} OFFSET ${}",
        qualified_table(schema, collection),
        where_clause,
        text_expr(&sort.field),
        limit_clause,
        offset_n
    );
    q
}

pub fn select_one(schema: &str, collection: &str, filter: &Filter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = q.where_clause(filter);
    q.sql = format!("SELECT doc FROM {}{} LIMIT 1", qualified_table(schema, collection), where_clause);
    q
}

pub fn count(schema: &str, collection: &str, filter: &Filter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = q.where_clause(filter);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", qualified_table(schema, collection), where_clause);
    q
}

/// UPDATE by id: shallow JSONB merge of `partial` (minus `_id`) into the stored document.
pub fn update_merge(schema: &str, collection: &str, id: &str, partial: &Document) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut partial = partial.clone();
    partial.remove(ID_FIELD);
    let doc_n = q.push_param(PgBindValue::Json(Value::Object(partial)));
    let id_n = q.push_param(PgBindValue::text(id));
    q.sql = format!(
        "UPDATE {} SET doc = doc || ${}::jsonb WHERE id = ${} RETURNING doc",
        qualified_table(schema, collection),
        doc_n,
        id_n
    );
    q
}

/// DELETE by id.
pub fn delete(schema: &str, collection: &str, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(PgBindValue::text(id));
    q.sql = format!(
        "DELETE FROM {} WHERE id = ${} RETURNING doc",
        qualified_table(schema, collection),
        n
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_many_without_filter() {
        let q = select_many("public", "posts", &Filter::all(), &Sort::newest_first("dataCriacao"), 10, 5);
        assert_eq!(
            q.sql,
            "SELECT doc FROM \"public\".\"posts\" ORDER BY doc->>'dataCriacao' DESC, id DESC LIMIT $1 OFFSET $2"
        );
        assert_eq!(q.params, [PgBindValue::I64(5), PgBindValue::I64(10)]);
    }

    #[test]
    fn zero_limit_is_unlimited_and_negative_skip_clamps() {
        let q = select_many("public", "posts", &Filter::all(), &Sort::newest_first("dataCriacao"), -10, 0);
        assert!(q.sql.contains(" LIMIT ALL OFFSET $1"));
        assert_eq!(q.params, [PgBindValue::I64(0)]);

        let q = select_many("public", "posts", &Filter::all(), &Sort::newest_first("dataCriacao"), 0, -3);
        assert_eq!(q.params[0], PgBindValue::I64(3));
    }

    #[test]
    fn contains_filters_compile_to_escaped_ilike() {
        let filter = Filter::And(vec![Filter::contains("autor", "50%"), Filter::contains("disciplina", "mat")]);
        let q = count("public", "posts", &filter);
        assert!(q.sql.starts_with("SELECT COUNT(*) FROM \"public\".\"posts\" WHERE ("));
        assert!(q.sql.contains("doc->>'autor' ILIKE $1 ESCAPE '\\'"));
        assert!(q.sql.contains("jsonb_array_elements_text(doc->'disciplina')"));
        assert!(q.sql.contains(") AND ("));
        assert_eq!(
            q.params,
            [PgBindValue::text("%50\\%%"), PgBindValue::text("%mat%")]
        );
    }

    #[test]
    fn or_filter_joins_with_or() {
        let filter = Filter::Or(vec![Filter::contains("titulo", "math"), Filter::contains("tags", "math")]);
        let q = select_one("public", "posts", &filter);
        assert!(q.sql.contains(" OR "));
        assert!(q.sql.ends_with(" LIMIT 1"));
        assert_eq!(q.params.len(), 2);
    }

    #[test]
    fn unique_check_excluding_self_uses_id_column() {
        let filter = Filter::And(vec![
            Filter::equals("email", "a@b.com"),
            Filter::not_equals(ID_FIELD, "65a1b2c3d4e5f60718293a4b"),
        ]);
        let q = select_one("public", "alunos", &filter);
        assert_eq!(
            q.sql,
            "SELECT doc FROM \"public\".\"alunos\" WHERE (doc->>'email' = $1 AND id IS DISTINCT FROM $2) LIMIT 1"
        );
    }

    #[test]
    fn keys_and_identifiers_are_quoted() {
        assert_eq!(quoted("a\"b"), "\"a\"\"b\"");
        let q = select_one("public", "posts", &Filter::equals("o'brien", "x"));
        assert!(q.sql.contains("doc->>'o''brien' = $1"));
        assert_eq!(
            create_unique_index("blog", "alunos", "email"),
            "CREATE UNIQUE INDEX IF NOT EXISTS \"alunos_email_unique\" ON \"blog\".\"alunos\" ((lower(doc->>'email')))"
        );
    }

    #[test]
    fn update_merges_without_id() {
        let mut partial = Document::new();
        partial.insert("titulo".into(), Value::String("Novo".into()));
        partial.insert(ID_FIELD.into(), Value::String("x".into()));
        let q = update_merge("public", "posts", "abc", &partial);
        assert_eq!(
            q.sql,
            "UPDATE \"public\".\"posts\" SET doc = doc || $1::jsonb WHERE id = $2 RETURNING doc"
        );
        assert_eq!(q.params[0], PgBindValue::Json(serde_json::json!({"titulo": "Novo"})));
    }
}
