//! Descriptor validation: referential integrity and rule consistency.

use crate::config::{FieldKind, FullConfig, Operation, ResourceConfig};
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(config: &FullConfig) -> Result<(), ConfigError> {
    if config.resources.is_empty() {
        return Err(ConfigError::Validation("at least one resource required".into()));
    }

    let mut path_segments = HashSet::new();
    let mut collections = HashSet::new();
    for res in &config.resources {
        if !path_segments.insert(res.path_segment.as_str()) {
            return Err(ConfigError::DuplicatePathSegment(res.path_segment.clone()));
        }
        if !collections.insert(res.collection.as_str()) {
            return Err(ConfigError::DuplicateCollection(res.collection.clone()));
        }
        validate_resource(res)?;
    }
    Ok(())
}

fn validate_resource(res: &ResourceConfig) -> Result<(), ConfigError> {
    if res.path_segment.is_empty() || res.path_segment.contains('/') || res.path_segment == "health" || res.path_segment == "ready" {
        return Err(ConfigError::Validation(format!(
            "resource '{}' has invalid path segment '{}'",
            res.name, res.path_segment
        )));
    }
    if !is_plain_identifier(&res.collection) {
        return Err(ConfigError::Validation(format!(
            "resource '{}' has invalid collection name '{}'",
            res.name, res.collection
        )));
    }
    for op in &res.operations {
        if Operation::parse(op).is_none() {
            return Err(ConfigError::Validation(format!(
                "resource '{}' has unknown operation '{}'",
                res.name, op
            )));
        }
    }

    let mut names = HashSet::new();
    for f in &res.fields {
        if f.name.starts_with('_') || !names.insert(f.name.as_str()) {
            return Err(ConfigError::InvalidRule {
                resource: res.name.clone(),
                field: f.name.clone(),
                reason: "field names must be unique and must not start with '_'".into(),
            });
        }
        if let (Some(min), Some(max)) = (f.min_length, f.max_length) {
            if min > max {
                return Err(ConfigError::InvalidRule {
                    resource: res.name.clone(),
                    field: f.name.clone(),
                    reason: format!("min_length {} exceeds max_length {}", min, max),
                });
            }
        }
        if f.kind == FieldKind::StringArray && (f.format.is_some() || f.lowercase) {
            return Err(ConfigError::InvalidRule {
                resource: res.name.clone(),
                field: f.name.clone(),
                reason: "format and lowercase apply to string fields only".into(),
            });
        }
    }
    let stamped: Vec<&String> = res.timestamps.created.iter().chain(&res.timestamps.updated).collect();
    for ts in &stamped {
        if names.contains(ts.as_str()) {
            return Err(ConfigError::InvalidRule {
                resource: res.name.clone(),
                field: (*ts).clone(),
                reason: "timestamp fields are system managed and cannot be declared".into(),
            });
        }
    }

    let require_declared = |list: &[String], usage: &'static str| -> Result<(), ConfigError> {
        for name in list {
            if !names.contains(name.as_str()) {
                return Err(ConfigError::MissingField {
                    resource: res.name.clone(),
                    field: name.clone(),
                    usage,
                });
            }
        }
        Ok(())
    };
    require_declared(&res.filters, "filters")?;
    require_declared(&res.search, "search")?;
    require_declared(&res.unique, "unique")?;

    for u in &res.unique {
        if res.fields.iter().any(|f| &f.name == u && f.kind != FieldKind::String) {
            return Err(ConfigError::InvalidRule {
                resource: res.name.clone(),
                field: u.clone(),
                reason: "unique fields must be strings".into(),
            });
        }
    }
    if res.operations.iter().any(|o| o == "search") && res.search.is_empty() {
        return Err(ConfigError::Validation(format!(
            "resource '{}' enables search without search fields",
            res.name
        )));
    }
    Ok(())
}

/// Letters, digits and underscores, not starting with a digit.
pub(crate) fn is_plain_identifier(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin_config;

    #[test]
    fn builtin_descriptors_are_valid() {
        validate(&builtin_config().unwrap()).unwrap();
    }

    #[test]
    fn rejects_duplicate_path_segment() {
        let mut cfg = builtin_config().unwrap();
        let mut copy = cfg.resources[0].clone();
        copy.collection = "other".into();
        cfg.resources.push(copy);
        assert!(matches!(validate(&cfg), Err(ConfigError::DuplicatePathSegment(p)) if p == "posts"));
    }

    #[test]
    fn rejects_filter_on_undeclared_field() {
        let mut cfg = builtin_config().unwrap();
        cfg.resources[1].filters.push("telefone".into());
        assert!(matches!(
            validate(&cfg),
            Err(ConfigError::MissingField { usage: "filters", .. })
        ));
    }

    #[test]
    fn rejects_inverted_length_bounds() {
        let mut cfg = builtin_config().unwrap();
        cfg.resources[0].fields[0].min_length = Some(300);
        assert!(matches!(validate(&cfg), Err(ConfigError::InvalidRule { .. })));
    }

    #[test]
    fn rejects_collection_names_unsafe_for_sql() {
        let mut cfg = builtin_config().unwrap();
        cfg.resources[2].collection = "alunos; drop".into();
        assert!(validate(&cfg).is_err());
        assert!(is_plain_identifier("alunos_2024"));
        assert!(!is_plain_identifier("2024"));
    }
}
