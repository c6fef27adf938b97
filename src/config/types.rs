//! Raw resource descriptor types matching the JSON config (`config/resources.json`).

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    String,
    StringArray,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldFormat {
    Email,
}

/// Per-rule message overrides. Missing entries get a default built from the field label.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FieldMessages {
    #[serde(default)]
    pub required: Option<String>,
    #[serde(default)]
    pub empty: Option<String>,
    #[serde(default)]
    pub min_length: Option<String>,
    #[serde(default)]
    pub max_length: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    /// Human label used in default messages, e.g. "Título".
    pub label: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_true")]
    pub trim: bool,
    #[serde(default)]
    pub lowercase: bool,
    #[serde(default)]
    pub allow_empty: bool,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub format: Option<FieldFormat>,
    #[serde(default)]
    pub messages: FieldMessages,
}

fn default_true() -> bool {
    true
}

/// Key names of the resource-specific counters in the pagination block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationKeys {
    pub total: String,
    pub per_page: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceMessages {
    pub created: String,
    pub updated: String,
    pub deleted: String,
    pub not_found: String,
    #[serde(default)]
    pub conflict: Option<String>,
}

/// Document fields stamped on create and on every update. The first created field is the list sort key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimestampConfig {
    pub created: Vec<String>,
    pub updated: Vec<String>,
}

impl Default for TimestampConfig {
    fn default() -> Self {
        TimestampConfig {
            created: vec!["createdAt".into()],
            updated: vec!["updatedAt".into()],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    pub path_segment: String,
    pub collection: String,
    pub operations: Vec<String>,
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub search: Vec<String>,
    #[serde(default)]
    pub unique: Vec<String>,
    pub pagination: PaginationKeys,
    pub messages: ResourceMessages,
    #[serde(default)]
    pub timestamps: TimestampConfig,
}

/// All resource descriptors in one struct for in-memory loading.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FullConfig {
    pub resources: Vec<ResourceConfig>,
}
