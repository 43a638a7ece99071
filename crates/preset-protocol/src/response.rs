//! Read response types.

use serde::{Deserialize, Serialize};

/// Identity triple pointing at a preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetRef {
    pub id: String,
    pub name: String,
    pub version: String,
}

/// Inheritance summary for derived entities. Used for UI and telemetry only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritanceInfo {
    /// The preset this entity derives from.
    pub base_preset: PresetRef,
    /// Whether the override fragment changes anything.
    pub has_overrides: bool,
    /// Number of terminal values in the override fragment.
    pub override_leaf_count: usize,
}

/// Body returned for "GET resolved config for entity X".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedResponse {
    /// Entity the document was resolved for.
    pub entity_id: String,
    /// The resolved document, opaque to the core.
    pub document: serde_json::Value,
    /// SHA-256 of the canonical JSON form of `document`.
    pub digest: String,
    /// Present only for derived entities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inheritance_info: Option<InheritanceInfo>,
}
