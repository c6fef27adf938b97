//! Resource handlers: list, search, read, create, update, delete.
//!
//! Each handler resolves the resource by path segment, runs the inner operation, and
//! renders errors through the state's response policy.

use crate::config::Operation;
use crate::error::AppError;
use crate::id::DocumentId;
use crate::query::{ListQuery, SearchQuery};
use crate::response::{success_many, success_one, success_one_ok, success_with_message, Envelope};
use crate::service::{CrudService, Mode, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

fn respond(state: &AppState, result: Result<Response, AppError>) -> Response {
    match result {
        Ok(r) => r,
        Err(e) => state.reject(e).into_response(),
    }
}

/// Malformed ids are rejected before any store access.
fn parse_id(raw: &str) -> Result<DocumentId, AppError> {
    raw.parse()
}

fn body_value(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(v)| v)
        .map_err(|rejection| AppError::Validation(vec![rejection_reason(&rejection).to_string()]))
}

fn rejection_reason(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => "O cabeçalho Content-Type deve ser application/json",
        JsonRejection::JsonSyntaxError(_) => "O corpo da requisição não é um JSON válido",
        JsonRejection::JsonDataError(_) => "O corpo da requisição deve ser um objeto JSON",
        _ => "Não foi possível ler o corpo da requisição",
    }
}

async fn list_inner(
    state: &AppState,
    endpoint: &str,
    path_segment: &str,
    params: &HashMap<String, String>,
) -> Result<Response, AppError> {
    let resource = state.resource(path_segment, Operation::List, endpoint)?;
    let query = ListQuery::from_params(params, resource);
    let page = CrudService::list(state.store.as_ref(), resource, &query).await?;
    let pagination = page.pagination(resource);
    Ok(success_many(page.items, pagination).into_response())
}

pub async fn list(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(path_segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let result = list_inner(&state, uri.path(), &path_segment, &params).await;
    respond(&state, result)
}

async fn search_inner(
    state: &AppState,
    endpoint: &str,
    path_segment: &str,
    params: &HashMap<String, String>,
) -> Result<Response, AppError> {
    let resource = state.resource(path_segment, Operation::Search, endpoint)?;
    let query = SearchQuery::from_params(params, resource)?;
    let page = CrudService::search(state.store.as_ref(), resource, &query).await?;
    let pagination = page.pagination(resource);
    let body = Envelope::page(page.items, pagination).with_search_term(query.term);
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub async fn search(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(path_segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let result = search_inner(&state, uri.path(), &path_segment, &params).await;
    respond(&state, result)
}

async fn read_inner(state: &AppState, endpoint: &str, path_segment: &str, id: &str) -> Result<Response, AppError> {
    let resource = state.resource(path_segment, Operation::Read, endpoint)?;
    let id = parse_id(id)?;
    let doc = CrudService::read(state.store.as_ref(), resource, &id).await?;
    Ok(success_one_ok(doc).into_response())
}

pub async fn read(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path((path_segment, id)): Path<(String, String)>,
) -> Response {
    let result = read_inner(&state, uri.path(), &path_segment, &id).await;
    respond(&state, result)
}

async fn create_inner(
    state: &AppState,
    endpoint: &str,
    path_segment: &str,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let resource = state.resource(path_segment, Operation::Create, endpoint)?;
    let body = body_value(body)?;
    let payload = RequestValidator::validate(&body, &resource.fields, Mode::Create)?;
    let doc = CrudService::create(state.store.as_ref(), resource, payload).await?;
    Ok(success_one(doc, &resource.created_message).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(path_segment): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let result = create_inner(&state, uri.path(), &path_segment, body).await;
    respond(&state, result)
}

async fn update_inner(
    state: &AppState,
    endpoint: &str,
    path_segment: &str,
    id: &str,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let resource = state.resource(path_segment, Operation::Update, endpoint)?;
    let id = parse_id(id)?;
    let body = body_value(body)?;
    let partial = RequestValidator::validate(&body, &resource.fields, Mode::Update)?;
    let doc = CrudService::update(state.store.as_ref(), resource, &id, partial).await?;
    Ok(success_with_message(doc, &resource.updated_message).into_response())
}

pub async fn update(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path((path_segment, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let result = update_inner(&state, uri.path(), &path_segment, &id, body).await;
    respond(&state, result)
}

async fn delete_inner(state: &AppState, endpoint: &str, path_segment: &str, id: &str) -> Result<Response, AppError> {
    let resource = state.resource(path_segment, Operation::Delete, endpoint)?;
    let id = parse_id(id)?;
    let doc = CrudService::delete(state.store.as_ref(), resource, &id).await?;
    Ok(success_with_message(doc, &resource.deleted_message).into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path((path_segment, id)): Path<(String, String)>,
) -> Response {
    let result = delete_inner(&state, uri.path(), &path_segment, &id).await;
    respond(&state, result)
}

/// Fallback for every unmatched route.
pub async fn endpoint_not_found(State(state): State<AppState>, OriginalUri(uri): OriginalUri) -> Response {
    state
        .reject(AppError::UnknownEndpoint(uri.path().to_string()))
        .into_response()
}
