//! Resolution cache
//!
//! Presets never change in place and overrides change only through guarded
//! writes, so a resolution stays valid for as long as the entity's version
//! and its base's version do. The write path invalidates on every
//! successful write to the entity or its base.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

use super::ResolvedConfig;
use crate::entity::ConfigEntity;

/// Default number of cached resolutions
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Identity of one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub entity_id: String,
    pub version: String,
    pub base_id: Option<String>,
    pub base_version: Option<String>,
}

impl CacheKey {
    pub fn new(entity: &ConfigEntity, base: Option<&ConfigEntity>) -> Self {
        Self {
            entity_id: entity.id.clone(),
            version: entity.version.clone(),
            base_id: entity.base_preset.clone(),
            base_version: base.map(|b| b.version.clone()),
        }
    }

    fn touches(&self, id: &str) -> bool {
        self.entity_id == id || self.base_id.as_deref() == Some(id)
    }
}

/// Thread-safe map from `CacheKey` to resolved documents.
#[derive(Debug)]
pub struct ResolveCache {
    entries: Mutex<HashMap<CacheKey, ResolvedConfig>>,
    capacity: usize,
}

impl Default for ResolveCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ResolveCache {
    /// A cache holding at most `capacity` entries. Zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, key: &CacheKey) -> Option<ResolvedConfig> {
        let entries = self.entries.lock().ok()?;
        entries.get(key).cloned()
    }

    pub fn insert(&self, key: CacheKey, resolved: ResolvedConfig) {
        if !self.is_enabled() {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() >= self.capacity && !entries.contains_key(&key) {
                warn!(
                    capacity = self.capacity,
                    "resolution cache full, evicting all entries"
                );
                entries.clear();
            }
            entries.insert(key, resolved);
        }
    }

    /// Drop every resolution of `id` and every resolution derived from it.
    pub fn invalidate(&self, id: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            let before = entries.len();
            entries.retain(|key, _| !key.touches(id));
            let dropped = before - entries.len();
            if dropped > 0 {
                debug!(entity = %id, dropped, "invalidated cached resolutions");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}
