//! Process settings loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn from_value(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub store_schema: String,
    pub environment: Environment,
    pub resource_config: Option<PathBuf>,
    pub body_limit: usize,
    pub seed_data: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "0.0.0.0".into(),
            port: 3000,
            database_url: None,
            max_connections: 5,
            store_schema: "public".into(),
            environment: Environment::Production,
            resource_config: None,
            body_limit: DEFAULT_BODY_LIMIT,
            seed_data: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; unset or unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Settings::default();
        Settings {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            database_url: lookup("DATABASE_URL").filter(|s| !s.trim().is_empty()),
            max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS").unwrap_or(defaults.max_connections),
            store_schema: lookup("STORE_SCHEMA").unwrap_or(defaults.store_schema),
            environment: lookup("APP_ENV")
                .map(|v| Environment::from_value(&v))
                .unwrap_or(defaults.environment),
            resource_config: lookup("RESOURCE_CONFIG").filter(|s| !s.is_empty()).map(PathBuf::from),
            body_limit: parsed(&lookup, "BODY_LIMIT_BYTES").unwrap_or(defaults.body_limit),
            seed_data: lookup("SEED_DATA")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.seed_data),
        }
    }

    pub fn expose_errors(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}
