//! Persistence boundary
//!
//! The core never owns storage. `EntityStore` is the collaborator contract
//! the write and read paths consume; `MemoryStore` is an in-process
//! implementation backed by an optional JSON snapshot file.

mod memory;

pub use memory::{MemoryStore, Snapshot, SNAPSHOT_SCHEMA_ID, SNAPSHOT_SCHEMA_VERSION};

use std::io;

use crate::entity::ConfigEntity;
use crate::guard::Usage;
use crate::tenant::TenantSelection;
use preset_protocol::DomainKind;

/// Storage failures. Never masked by the core.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },

    #[error("store lock poisoned")]
    Poisoned,
}

/// Persistence collaborator contract.
pub trait EntityStore {
    /// Fetch an entity by id.
    fn get(&self, id: &str) -> Result<Option<ConfigEntity>, StoreError>;

    /// Fetch the entity holding `name` in a namespace. `owner == None` is the
    /// global preset namespace.
    fn find_by_name(
        &self,
        kind: DomainKind,
        owner: Option<&str>,
        name: &str,
    ) -> Result<Option<ConfigEntity>, StoreError>;

    /// All entities, in id order.
    fn list(&self) -> Result<Vec<ConfigEntity>, StoreError>;

    /// How many entities derive from `id` and how many tenants have it
    /// selected as active.
    fn usage(&self, id: &str) -> Result<Usage, StoreError>;

    /// Insert or replace an entity.
    fn put(&mut self, entity: ConfigEntity) -> Result<(), StoreError>;

    /// Remove an entity, returning it if it existed.
    fn remove(&mut self, id: &str) -> Result<Option<ConfigEntity>, StoreError>;

    /// A tenant's active selection.
    fn selection(&self, owner: &str) -> Result<Option<TenantSelection>, StoreError>;

    /// Every tenant's active selection, in owner order.
    fn selections(&self) -> Result<Vec<TenantSelection>, StoreError>;

    /// Insert or replace a tenant's active selection.
    fn put_selection(&mut self, selection: TenantSelection) -> Result<(), StoreError>;
}
