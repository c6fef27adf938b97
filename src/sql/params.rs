//! Values bound to generated document queries.

use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;
use sqlx::types::Json;

/// A parameter for a generated statement. Each variant binds with its own Postgres type.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Text(String),
    I64(i64),
    Json(Value),
}

impl PgBindValue {
    pub fn text(s: impl Into<String>) -> Self {
        PgBindValue::Text(s.into())
    }
}

/// Bind every parameter in placeholder order.
pub fn bind_all<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    params: &[PgBindValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for p in params {
        query = match p {
            PgBindValue::Text(s) => query.bind(s.clone()),
            PgBindValue::I64(n) => query.bind(*n),
            PgBindValue::Json(v) => query.bind(Json(v.clone())),
        };
    }
    query
}

/// Escape `%`, `_` and `\` so a user term is matched literally by `ILIKE ... ESCAPE '\'`.
pub fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}
