//! Persisted configuration entities
//!
//! An entity is either a preset (global, immutable, complete document), a
//! standalone tenant entity (complete document, owned), or a derived tenant
//! entity (base preset reference plus a sparse override fragment).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::overlay::{self, Fragment};
use preset_protocol::{DomainKind, PresetRef, WriteRequest};

/// Persisted record wrapping a configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntity {
    /// Stable identity
    pub id: String,

    /// Document family
    pub kind: DomainKind,

    pub name: String,

    /// Semver version string
    pub version: String,

    pub is_preset: bool,

    /// Full document; required for standalone entities and presets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Value>,

    /// Id of the preset this entity derives from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_preset: Option<String>,

    /// Sparse fragment applied over the base preset
    #[serde(default = "overlay::empty", skip_serializing_if = "overlay::is_empty_map")]
    pub override_fragment: Fragment,

    /// Owning tenant; `None` for presets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl ConfigEntity {
    /// Build a preset entity from a complete document. Name and version are
    /// read from `document.meta`; missing values become empty strings and are
    /// rejected by the guard.
    pub fn preset(id: impl Into<String>, kind: DomainKind, document: Value) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            kind,
            name: meta_str(&document, "name").unwrap_or_default().to_string(),
            version: meta_str(&document, "version").unwrap_or_default().to_string(),
            is_preset: true,
            document: Some(document),
            base_preset: None,
            override_fragment: overlay::empty(),
            owner: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build an entity from a write request whose identity has already been
    /// populated.
    pub fn from_request(id: impl Into<String>, owner: Option<String>, request: WriteRequest) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            kind: request.kind,
            name: request.name.unwrap_or_default(),
            version: request.version.unwrap_or_default(),
            is_preset: request.is_preset,
            document: request.document,
            base_preset: request.base_preset,
            override_fragment: request.override_fragment.unwrap_or_else(overlay::empty),
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this entity derives from a preset.
    pub fn is_derived(&self) -> bool {
        self.base_preset.is_some()
    }

    /// The `meta` block of the stored document, if any.
    pub fn meta(&self) -> Option<&Value> {
        self.document.as_ref().and_then(|d| d.get("meta"))
    }

    /// Identity triple used in `basedOn` pointers.
    pub fn to_ref(&self) -> PresetRef {
        PresetRef {
            id: self.id.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }

    /// Whether `owner` may see this entity (presets are visible to all).
    pub fn visible_to(&self, owner: &str) -> bool {
        self.is_preset || self.owner.as_deref() == Some(owner)
    }
}

/// Read a string field from a document's `meta` block.
pub fn meta_str<'a>(document: &'a Value, field: &str) -> Option<&'a str> {
    document.get("meta")?.get(field)?.as_str()
}
