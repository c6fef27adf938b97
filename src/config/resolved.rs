//! Resolved resource model: descriptors validated and flattened for runtime use.

use crate::config::{FieldKind, PaginationKeys};
use regex::Regex;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Read,
    Create,
    Update,
    Delete,
    Search,
}

impl Operation {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "list" => Operation::List,
            "read" => Operation::Read,
            "create" => Operation::Create,
            "update" => Operation::Update,
            "delete" => Operation::Delete,
            "search" => Operation::Search,
            _ => return None,
        })
    }
}

/// Messages with label-derived defaults already filled in.
#[derive(Clone, Debug)]
pub struct ResolvedMessages {
    pub required: String,
    pub empty: String,
    pub min_length: String,
    pub max_length: String,
    pub format: String,
    pub type_: String,
}

#[derive(Clone, Debug)]
pub struct ResolvedField {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub trim: bool,
    pub lowercase: bool,
    pub allow_empty: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Compiled pattern for the field's `format`, if any.
    pub pattern: Option<Regex>,
    pub messages: ResolvedMessages,
}

#[derive(Clone, Debug)]
pub struct ResolvedResource {
    pub name: String,
    pub path_segment: String,
    pub collection: String,
    pub operations: HashSet<Operation>,
    pub fields: Vec<ResolvedField>,
    pub filters: Vec<String>,
    pub search: Vec<String>,
    pub unique: Vec<String>,
    pub pagination: PaginationKeys,
    pub created_message: String,
    pub updated_message: String,
    pub deleted_message: String,
    pub not_found_message: String,
    pub conflict_message: String,
    pub created_fields: Vec<String>,
    pub updated_fields: Vec<String>,
}

impl ResolvedResource {
    pub fn allows(&self, op: Operation) -> bool {
        self.operations.contains(&op)
    }

    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field the list and search results are ordered by (newest first).
    pub fn sort_field(&self) -> &str {
        self.created_fields.first().map(String::as_str).unwrap_or("_id")
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedModel {
    pub resources: Vec<ResolvedResource>,
    pub resource_by_path: HashMap<String, ResolvedResource>,
}

impl ResolvedModel {
    pub fn resource_by_path(&self, path: &str) -> Option<&ResolvedResource> {
        self.resource_by_path.get(path)
    }
}
