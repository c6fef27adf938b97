//! Load resource descriptors from the embedded JSON or from a file, and resolve them.

use crate::config::resolved::{Operation, ResolvedField, ResolvedMessages, ResolvedModel, ResolvedResource};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Email shape accepted for `format: email` fields.
/// Word characters are ASCII only.
pub const EMAIL_PATTERN: &str =
    r"^[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*@[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*(\.[A-Za-z0-9_]{2,3})+$";

const BUILTIN: &str = include_str!("../../config/resources.json");

/// Built-in descriptors for posts, professores and alunos.
pub fn builtin_config() -> Result<FullConfig, ConfigError> {
    serde_json::from_str(BUILTIN).map_err(|e| ConfigError::Load(format!("builtin resources: {}", e)))
}

pub async fn load_from_path(path: impl AsRef<Path>) -> Result<FullConfig, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}

/// Build resolved model from full config (validates first).
pub fn resolve(config: &FullConfig) -> Result<ResolvedModel, ConfigError> {
    validate(config)?;

    let mut resources = Vec::new();
    let mut resource_by_path = HashMap::new();
    for res in &config.resources {
        let resolved = resolve_resource(res)?;
        resource_by_path.insert(resolved.path_segment.clone(), resolved.clone());
        resources.push(resolved);
    }
    Ok(ResolvedModel {
        resources,
        resource_by_path,
    })
}

fn resolve_resource(res: &ResourceConfig) -> Result<ResolvedResource, ConfigError> {
    let fields = res
        .fields
        .iter()
        .map(|f| resolve_field(&res.name, f))
        .collect::<Result<Vec<_>, _>>()?;
    let operations = res.operations.iter().filter_map(|o| Operation::parse(o)).collect();
    let conflict_message = res
        .messages
        .conflict
        .clone()
        .unwrap_or_else(|| format!("Já existe um registro de {} com estes dados", res.name));

    Ok(ResolvedResource {
        name: res.name.clone(),
        path_segment: res.path_segment.clone(),
        collection: res.collection.clone(),
        operations,
        fields,
        filters: res.filters.clone(),
        search: res.search.clone(),
        unique: res.unique.clone(),
        pagination: res.pagination.clone(),
        created_message: res.messages.created.clone(),
        updated_message: res.messages.updated.clone(),
        deleted_message: res.messages.deleted.clone(),
        not_found_message: res.messages.not_found.clone(),
        conflict_message,
        created_fields: res.timestamps.created.clone(),
        updated_fields: res.timestamps.updated.clone(),
    })
}

fn resolve_field(resource: &str, f: &FieldConfig) -> Result<ResolvedField, ConfigError> {
    let pattern = match f.format {
        Some(FieldFormat::Email) => Some(Regex::new(EMAIL_PATTERN).map_err(|e| ConfigError::InvalidRule {
            resource: resource.to_string(),
            field: f.name.clone(),
            reason: e.to_string(),
        })?),
        None => None,
    };
    Ok(ResolvedField {
        name: f.name.clone(),
        kind: f.kind,
        required: f.required,
        trim: f.trim,
        lowercase: f.lowercase,
        allow_empty: f.allow_empty,
        min_length: f.min_length.map(|n| n as usize),
        max_length: f.max_length.map(|n| n as usize),
        pattern,
        messages: default_messages(f),
    })
}

fn default_messages(f: &FieldConfig) -> ResolvedMessages {
    let label = &f.label;
    let m = &f.messages;
    let required = m.required.clone().unwrap_or_else(|| format!("{} é obrigatório", label));
    ResolvedMessages {
        empty: m.empty.clone().unwrap_or_else(|| required.clone()),
        min_length: m.min_length.clone().unwrap_or_else(|| {
            format!("{} deve ter pelo menos {} caracteres", label, f.min_length.unwrap_or(0))
        }),
        max_length: m.max_length.clone().unwrap_or_else(|| {
            format!("{} deve ter no máximo {} caracteres", label, f.max_length.unwrap_or(0))
        }),
        format: m.format.clone().unwrap_or_else(|| format!("{} deve ter um formato válido", label)),
        type_: m.type_.clone().unwrap_or_else(|| match f.kind {
            FieldKind::String => format!("{} deve ser um texto", label),
            FieldKind::StringArray => format!("{} deve ser uma lista de textos", label),
        }),
        required,
    }
}
