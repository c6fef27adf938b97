//! Request validation from resolved field rules.

use crate::config::{FieldKind, ResolvedField};
use crate::error::AppError;
use crate::store::Document;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Required fields must be present.
    Create,
    /// Every field is optional; present fields obey the create rules.
    Update,
}

pub struct RequestValidator;

impl RequestValidator {
    /// Validate and normalise `body`. Every violated rule is reported, in field order,
    /// followed by one entry per undeclared key.
    pub fn validate(body: &Value, fields: &[ResolvedField], mode: Mode) -> Result<Document, AppError> {
        let Some(obj) = body.as_object() else {
            return Err(AppError::Validation(vec!["O corpo da requisição deve ser um objeto JSON".into()]));
        };

        let mut out = Document::new();
        let mut errors = Vec::new();
        for field in fields {
            match (obj.get(&field.name), mode) {
                (None, Mode::Create) | (Some(Value::Null), Mode::Create) if field.required => {
                    errors.push(field.messages.required.clone());
                }
                (None, _) => {}
                (Some(value), _) => {
                    if let Some(v) = normalise(field, value, &mut errors) {
                        out.insert(field.name.clone(), v);
                    }
                }
            }
        }
        for key in obj.keys() {
            if !fields.iter().any(|f| &f.name == key) {
                errors.push(format!("\"{}\" não é permitido", key));
            }
        }

        if errors.is_empty() {
            Ok(out)
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

/// Normalised value, or `None` after pushing the field's violations.
fn normalise(field: &ResolvedField, value: &Value, errors: &mut Vec<String>) -> Option<Value> {
    match field.kind {
        FieldKind::String => {
            let Some(raw) = value.as_str() else {
                errors.push(field.messages.type_.clone());
                return None;
            };
            normalise_text(field, raw, errors).map(Value::String)
        }
        FieldKind::StringArray => {
            let Some(items) = value.as_array() else {
                errors.push(field.messages.type_.clone());
                return None;
            };
            let mut trimmed = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str().map(|s| if field.trim { s.trim() } else { s }) {
                    Some(s) if !s.is_empty() => trimmed.push(Value::String(s.to_string())),
                    _ => {
                        errors.push(field.messages.type_.clone());
                        return None;
                    }
                }
            }
            Some(Value::Array(trimmed))
        }
    }
}

fn normalise_text(field: &ResolvedField, raw: &str, errors: &mut Vec<String>) -> Option<String> {
    let mut text = if field.trim { raw.trim().to_string() } else { raw.to_string() };
    if field.lowercase {
        text = text.to_lowercase();
    }
    if text.is_empty() {
        if field.allow_empty {
            return Some(text);
        }
        errors.push(field.messages.empty.clone());
        return None;
    }

    let before = errors.len();
    let len = text.chars().count();
    if field.min_length.is_some_and(|min| len < min) {
        errors.push(field.messages.min_length.clone());
    }
    if field.max_length.is_some_and(|max| len > max) {
        errors.push(field.messages.max_length.clone());
    }
    if field.pattern.as_ref().is_some_and(|re| !re.is_match(&text)) {
        errors.push(field.messages.format.clone());
    }
    (errors.len() == before).then_some(text)
}
