//! Standard response envelope helpers.
//!
//! Every body has the shape `{sucesso, dados?, mensagem?, erros?, paginacao?}`.
//! Fields are private so a success can never carry `erros` and a failure can
//! never carry `paginacao`.

use axum::{http::StatusCode, Json};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::PaginationKeys;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    #[serde(rename = "sucesso")]
    success: bool,
    #[serde(rename = "dados", skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(rename = "mensagem", skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(rename = "erros", skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
    #[serde(rename = "paginacao", skip_serializing_if = "Option::is_none")]
    pagination: Option<Pagination>,
    #[serde(rename = "termoBusca", skip_serializing_if = "Option::is_none")]
    search_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    #[serde(rename = "erro", skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            pagination: None,
            search_term: None,
            endpoint: None,
            detail: None,
        }
    }

    pub fn page(data: T, pagination: Pagination) -> Self {
        Envelope {
            pagination: Some(pagination),
            ..Envelope::ok(data)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Echo of the search term; only meaningful on successful searches.
    pub fn with_search_term(mut self, term: impl Into<String>) -> Self {
        if self.success {
            self.search_term = Some(term.into());
        }
        self
    }
}

impl Envelope<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Envelope {
            success: false,
            data: None,
            message: Some(message.into()),
            errors: None,
            pagination: None,
            search_term: None,
            endpoint: None,
            detail: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Pagination block; the total and per-page keys are named per resource.
#[derive(Clone, Debug, PartialEq)]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: u64,
    pub total: u64,
    pub on_page: u64,
    pub keys: PaginationKeys,
}

impl Pagination {
    /// `limit == 0` means unlimited: everything fits on one page.
    pub fn new(current_page: i64, limit: i64, total: u64, on_page: u64, keys: PaginationKeys) -> Self {
        let per_page = limit.unsigned_abs();
        let total_pages = if per_page == 0 {
            u64::from(total > 0)
        } else {
            total.div_ceil(per_page)
        };
        Pagination {
            current_page,
            total_pages,
            total,
            on_page,
            keys,
        }
    }
}

impl Serialize for Pagination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("paginaAtual", &self.current_page)?;
        map.serialize_entry("totalPaginas", &self.total_pages)?;
        map.serialize_entry(&self.keys.total, &self.total)?;
        map.serialize_entry(&self.keys.per_page, &self.on_page)?;
        map.end()
    }
}

pub fn success_one<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(Envelope::ok(data).with_message(message)))
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::OK, Json(Envelope::ok(data)))
}

pub fn success_with_message<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::OK, Json(Envelope::ok(data).with_message(message)))
}

pub fn success_many<T: Serialize>(data: Vec<T>, pagination: Pagination) -> (StatusCode, Json<Envelope<Vec<T>>>) {
    (StatusCode::OK, Json(Envelope::page(data, pagination)))
}
