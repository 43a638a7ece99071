//! Layered settings
//!
//! Settings are merged from four layers, later layers winning:
//! 1. Built-in defaults
//! 2. Host config (`~/.config/preset-overlay/config.toml`)
//! 3. Project config (`preset-overlay.toml`)
//! 4. CLI flags

mod defaults;
mod effective;

pub use defaults::BuiltinDefaults;
pub use effective::{
    host_config_path, ConfigError, ConfigOrigin, ConfigSource, EffectiveSettings, Settings,
    PROJECT_CONFIG_FILE, SCHEMA_ID, SCHEMA_VERSION,
};
