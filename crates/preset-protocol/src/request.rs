//! Write request types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Document family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainKind {
    /// Visual theme: `tokens` plus optional `modes`.
    Theme,
    /// Page template: `pages` keyed by path.
    Template,
}

impl DomainKind {
    /// The section tenants may override for this kind.
    pub fn primary_section(&self) -> &'static str {
        match self {
            DomainKind::Theme => "tokens",
            DomainKind::Template => "pages",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DomainKind::Theme => "theme",
            DomainKind::Template => "template",
        }
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "theme" => Ok(DomainKind::Theme),
            "template" => Ok(DomainKind::Template),
            other => Err(format!("unknown domain kind '{}', expected theme or template", other)),
        }
    }
}

/// Tenant-facing write request.
///
/// On `basePreset` set, `document` may be omitted or carry only `meta`.
/// On standalone creation, `document` is required and fully validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest {
    /// Document family.
    pub kind: DomainKind,
    /// Entity name; populated from `document.meta.name` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Semver version; populated from `document.meta.version` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Tenant writes must leave this false.
    #[serde(default)]
    pub is_preset: bool,
    /// Id of the preset this entity derives from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_preset: Option<String>,
    /// Sparse override fragment applied over the base preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_fragment: Option<serde_json::Value>,
    /// Full document for standalone entities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<serde_json::Value>,
}

impl WriteRequest {
    /// Request for a standalone entity carrying its full document.
    pub fn standalone(kind: DomainKind, document: serde_json::Value) -> Self {
        Self {
            kind,
            name: None,
            version: None,
            is_preset: false,
            base_preset: None,
            override_fragment: None,
            document: Some(document),
        }
    }

    /// Request for an entity derived from a preset.
    pub fn derived(
        kind: DomainKind,
        name: impl Into<String>,
        version: impl Into<String>,
        base_preset: impl Into<String>,
        override_fragment: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            version: Some(version.into()),
            is_preset: false,
            base_preset: Some(base_preset.into()),
            override_fragment: Some(override_fragment),
            document: None,
        }
    }
}
