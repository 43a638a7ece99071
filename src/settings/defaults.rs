//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

use crate::resolve::DEFAULT_CACHE_CAPACITY;

/// Built-in default settings values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Snapshot file backing the entity store (default: ".preset-overlay/store.json")
    pub store_path: String,

    /// Cache resolved documents (default: true)
    pub cache_enabled: bool,

    /// Maximum cached resolutions (default: 1024)
    pub cache_capacity: u64,

    /// Log level when RUST_LOG is unset (default: "info")
    pub log_level: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            store_path: ".preset-overlay/store.json".to_string(),
            cache_enabled: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY as u64,
            log_level: "info".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "store": {
                "path": self.store_path
            },
            "cache": {
                "enabled": self.cache_enabled,
                "capacity": self.cache_capacity
            },
            "log": {
                "level": self.log_level
            }
        })
    }
}
