//! Effective settings with provenance
//!
//! The merged settings object plus the list of sources that contributed to
//! it, each with the SHA-256 of its raw bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults::BuiltinDefaults;
use crate::overlay::{get_path, merge_layers};

/// Schema version for effective settings
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "preset-overlay/effective_settings@1";

/// Project config file name, looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = "preset-overlay.toml";

const MAX_CACHE_CAPACITY: u64 = 100_000;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Origin of a settings source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Host,
    Project,
    Cli,
}

/// A contributing settings source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Merged settings with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub schema_version: u32,
    pub schema_id: String,
    pub created_at: DateTime<Utc>,

    /// The merged settings object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

/// Typed view of the settings the binary consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub store_path: PathBuf,
    pub cache_enabled: bool,
    pub cache_capacity: usize,
    pub log_level: String,
    pub seed_dir: Option<PathBuf>,
}

/// `$XDG_CONFIG_HOME/preset-overlay/config.toml`, else under `$HOME/.config`.
pub fn host_config_path() -> Option<PathBuf> {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(std::env::var("HOME").ok()?).join(".config"),
    };
    Some(base.join("preset-overlay").join("config.toml"))
}

impl EffectiveSettings {
    /// Build effective settings from layers. Missing files are skipped.
    pub fn build(
        host_config_path: Option<&Path>,
        project_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        for (origin, path) in [
            (ConfigOrigin::Host, host_config_path),
            (ConfigOrigin::Project, project_config_path),
        ] {
            let Some(path) = path.filter(|p| p.exists()) else {
                continue;
            };
            let (value, digest) = load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        validate(&merged)?;

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config: merged,
            sources,
        })
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&Value> {
        get_path(&self.config, path)
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(Value::as_u64)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    /// Typed settings. Values were checked in `build`; anything absent
    /// falls back to the built-in default.
    pub fn settings(&self) -> Settings {
        let defaults = BuiltinDefaults::default();
        Settings {
            store_path: PathBuf::from(self.get_str("store.path").unwrap_or(&defaults.store_path)),
            cache_enabled: self.get_bool("cache.enabled").unwrap_or(defaults.cache_enabled),
            cache_capacity: self.get_u64("cache.capacity").unwrap_or(defaults.cache_capacity) as usize,
            log_level: self
                .get_str("log.level")
                .unwrap_or(&defaults.log_level)
                .to_string(),
            seed_dir: self.get_str("seed.dir").map(PathBuf::from),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Load and parse a TOML file, returning the value and digest
fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path).map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes)
        .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

    let toml_value: toml::Value = toml::from_str(&contents)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

    Ok((toml_to_json(toml_value), digest))
}

fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn validate(config: &Value) -> Result<(), ConfigError> {
    if let Some(path) = get_path(config, "store.path") {
        if path.as_str().map_or(true, str::is_empty) {
            return Err(ConfigError::ValidationError(
                "store.path must be a non-empty string".to_string(),
            ));
        }
    }

    if let Some(enabled) = get_path(config, "cache.enabled") {
        if !enabled.is_boolean() {
            return Err(ConfigError::ValidationError(
                "cache.enabled must be a boolean".to_string(),
            ));
        }
    }

    if let Some(capacity) = get_path(config, "cache.capacity") {
        match capacity.as_u64() {
            Some(n) if n > 0 && n <= MAX_CACHE_CAPACITY => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "cache.capacity must be in (0, {}]",
                    MAX_CACHE_CAPACITY
                )))
            }
        }
    }

    if let Some(level) = get_path(config, "log.level") {
        if !level.as_str().is_some_and(|l| LOG_LEVELS.contains(&l)) {
            return Err(ConfigError::ValidationError(format!(
                "log.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
    }

    if let Some(dir) = get_path(config, "seed.dir") {
        if !dir.is_string() {
            return Err(ConfigError::ValidationError(
                "seed.dir must be a string".to_string(),
            ));
        }
    }

    Ok(())
}

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
