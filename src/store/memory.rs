//! In-memory store with JSON snapshot persistence

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::{EntityStore, StoreError};
use crate::entity::ConfigEntity;
use crate::guard::Usage;
use crate::tenant::TenantSelection;
use preset_protocol::DomainKind;

/// Schema version for store snapshots
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Schema identifier for store snapshots
pub const SNAPSHOT_SCHEMA_ID: &str = "preset-overlay/store@1";

/// On-disk snapshot of a `MemoryStore`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u32,
    pub schema_id: String,
    pub entities: Vec<ConfigEntity>,
    pub selections: Vec<TenantSelection>,
}

/// Entities and selections held in ordered maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entities: BTreeMap<String, ConfigEntity>,
    selections: BTreeMap<String, TenantSelection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            schema_id: SNAPSHOT_SCHEMA_ID.to_string(),
            entities: self.entities.values().cloned().collect(),
            selections: self.selections.values().cloned().collect(),
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        if snapshot.schema_id != SNAPSHOT_SCHEMA_ID {
            return Err(StoreError::SchemaMismatch {
                expected: SNAPSHOT_SCHEMA_ID.to_string(),
                actual: snapshot.schema_id,
            });
        }

        Ok(Self {
            entities: snapshot
                .entities
                .into_iter()
                .map(|e| (e.id.clone(), e))
                .collect(),
            selections: snapshot
                .selections
                .into_iter()
                .map(|s| (s.owner.clone(), s))
                .collect(),
        })
    }

    /// Load from a snapshot file. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let json = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&json)?;
        Self::from_snapshot(snapshot)
    }

    /// Write atomically to file (write-then-rename)
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.to_snapshot())?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &json)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<ConfigEntity>, StoreError> {
        Ok(self.entities.get(id).cloned())
    }

    fn find_by_name(
        &self,
        kind: DomainKind,
        owner: Option<&str>,
        name: &str,
    ) -> Result<Option<ConfigEntity>, StoreError> {
        let is_preset = owner.is_none();
        Ok(self
            .entities
            .values()
            .find(|e| {
                e.kind == kind
                    && e.is_preset == is_preset
                    && e.owner.as_deref() == owner
                    && e.name == name
            })
            .cloned())
    }

    fn list(&self) -> Result<Vec<ConfigEntity>, StoreError> {
        Ok(self.entities.values().cloned().collect())
    }

    fn usage(&self, id: &str) -> Result<Usage, StoreError> {
        let derived = self
            .entities
            .values()
            .filter(|e| e.base_preset.as_deref() == Some(id))
            .count();
        let active_selections = self
            .selections
            .values()
            .filter(|s| s.references(id))
            .count();

        Ok(Usage {
            derived,
            active_selections,
        })
    }

    fn put(&mut self, entity: ConfigEntity) -> Result<(), StoreError> {
        self.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<Option<ConfigEntity>, StoreError> {
        Ok(self.entities.remove(id))
    }

    fn selection(&self, owner: &str) -> Result<Option<TenantSelection>, StoreError> {
        Ok(self.selections.get(owner).cloned())
    }

    fn selections(&self) -> Result<Vec<TenantSelection>, StoreError> {
        Ok(self.selections.values().cloned().collect())
    }

    fn put_selection(&mut self, selection: TenantSelection) -> Result<(), StoreError> {
        self.selections.insert(selection.owner.clone(), selection);
        Ok(())
    }
}
