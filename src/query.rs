//! Turns raw query-string parameters into a page window and a store filter.

use crate::config::ResolvedResource;
use crate::error::AppError;
use crate::store::Filter;
use std::collections::HashMap;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MIN_SEARCH_LEN: usize = 2;

pub const MSG_SEARCH_REQUIRED: &str = "Parâmetro de busca (q) é obrigatório";
pub const MSG_SEARCH_TOO_SHORT: &str = "Termo de busca deve ter pelo menos 2 caracteres";

/// Leading optionally-signed integer, after leading whitespace: `"2abc"` is 2, `"1.9"` is 1.
/// Values beyond `i64` saturate.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return None;
    }
    let mut n: i64 = 0;
    for b in digits[..end].bytes() {
        let d = i64::from(b - b'0');
        n = n.saturating_mul(10);
        n = if negative { n.saturating_sub(d) } else { n.saturating_add(d) };
    }
    Some(n)
}

fn int_param(params: &HashMap<String, String>, key: &str, default: i64) -> i64 {
    params.get(key).and_then(|v| parse_int_prefix(v)).unwrap_or(default)
}

/// Offset and size of one page. `limit == 0` means unlimited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub skip: i64,
    pub limit: i64,
}

impl PageWindow {
    pub fn new(page: i64, limit: i64) -> Self {
        PageWindow {
            page,
            skip: page.saturating_sub(1).saturating_mul(limit),
            limit,
        }
    }

    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self::new(
            int_param(params, "page", DEFAULT_PAGE),
            int_param(params, "limit", DEFAULT_LIMIT),
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListQuery {
    pub window: PageWindow,
    pub filter: Filter,
}

impl ListQuery {
    /// Each configured filter field that is present and non-blank becomes a substring match.
    pub fn from_params(params: &HashMap<String, String>, resource: &ResolvedResource) -> Self {
        let filters: Vec<Filter> = resource
            .filters
            .iter()
            .filter_map(|field| {
                let value = params.get(field)?.trim();
                (!value.is_empty()).then(|| Filter::contains(field.as_str(), value))
            })
            .collect();
        ListQuery {
            window: PageWindow::from_params(params),
            filter: Filter::And(filters),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchQuery {
    /// Trimmed search term, echoed back as `termoBusca`.
    pub term: String,
    pub window: PageWindow,
    pub filter: Filter,
}

impl SearchQuery {
    pub fn from_params(params: &HashMap<String, String>, resource: &ResolvedResource) -> Result<Self, AppError> {
        let term = params.get("q").map(|q| q.trim()).unwrap_or("");
        if term.is_empty() {
            return Err(AppError::BadRequest(MSG_SEARCH_REQUIRED.into()));
        }
        if term.chars().count() < MIN_SEARCH_LEN {
            return Err(AppError::BadRequest(MSG_SEARCH_TOO_SHORT.into()));
        }
        let filter = Filter::Or(
            resource
                .search
                .iter()
                .map(|field| Filter::contains(field.as_str(), term))
                .collect(),
        );
        Ok(SearchQuery {
            term: term.to_string(),
            window: PageWindow::from_params(params),
            filter,
        })
    }
}
