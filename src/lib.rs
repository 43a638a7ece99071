//! Preset Overlay - immutable presets with tenant overrides
//!
//! This crate lets a multi-tenant platform ship official theme and template
//! presets while each tenant derives a variant by storing only a sparse
//! override fragment. A tenant's effective document is computed on read by
//! merging the preset with its overrides.

pub mod entity;
pub mod error;
pub mod guard;
pub mod overlay;
pub mod registry;
pub mod resolve;
pub mod schema;
pub mod seed;
pub mod settings;
pub mod store;
pub mod tenant;

#[cfg(test)]
pub(crate) mod fixtures;

pub use entity::ConfigEntity;
pub use error::{CoreError, ErrorKind, ErrorPayload, ReasonCode, ValidationError};
pub use guard::{IntegrityGuard, SaveContext, Usage, WriteMode};
pub use overlay::{diff, merge, merge_layers, Fragment};
pub use registry::Registry;
pub use resolve::{resolve, ResolveCache, ResolvedConfig};
pub use settings::{EffectiveSettings, Settings};
pub use store::{EntityStore, MemoryStore, StoreError};
pub use tenant::{SelectionSummary, TenantSelection};
pub use preset_protocol::{DomainKind, InheritanceInfo, PresetRef, ResolvedResponse, WriteRequest};
