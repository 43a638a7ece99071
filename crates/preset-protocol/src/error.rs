//! Error types shared by the write and read surfaces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason codes attached to every rejected write.
///
/// These codes are stable and used for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// The document does not conform to its domain schema.
    SchemaViolation,
    /// A tenant write tried to create or promote a preset.
    PresetCreationForbidden,
    /// The target entity is a preset and cannot be modified or deleted.
    PresetReadOnly,
    /// The referenced base entity is not a preset.
    BaseNotPreset,
    /// The base preset has a base of its own, or a preset declares a base.
    InheritanceDepthExceeded,
    /// A non-preset entity has no owner.
    OwnershipRequired,
    /// A preset entity has an owner.
    OwnershipForbidden,
    /// Entity name/version disagree with `document.meta`.
    IdentityMismatch,
    /// `owner` or `isPreset` changed on update.
    ImmutableField,
    /// The preset is still referenced as a base or selected as active.
    PresetInUse,
    /// The tenant entity is still selected as a tenant's active configuration.
    EntityInUse,
    /// `version` is not a semantic version string.
    InvalidVersion,
    /// Another entity in the same namespace already uses this name.
    NameConflict,
    /// Base preset and entity belong to different domain kinds.
    KindMismatch,
    /// An override fragment was supplied without a base preset.
    OverrideWithoutBase,
    /// A tenant selected an entity it does not own.
    SelectionForbidden,
    /// A selected theme mode does not exist in the selected theme.
    UnknownMode,
}

impl ReasonCode {
    /// Returns the wire representation of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaViolation => "schema_violation",
            Self::PresetCreationForbidden => "preset_creation_forbidden",
            Self::PresetReadOnly => "preset_read_only",
            Self::BaseNotPreset => "base_not_preset",
            Self::InheritanceDepthExceeded => "inheritance_depth_exceeded",
            Self::OwnershipRequired => "ownership_required",
            Self::OwnershipForbidden => "ownership_forbidden",
            Self::IdentityMismatch => "identity_mismatch",
            Self::ImmutableField => "immutable_field",
            Self::PresetInUse => "preset_in_use",
            Self::EntityInUse => "entity_in_use",
            Self::InvalidVersion => "invalid_version",
            Self::NameConflict => "name_conflict",
            Self::KindMismatch => "kind_mismatch",
            Self::OverrideWithoutBase => "override_without_base",
            Self::SelectionForbidden => "selection_forbidden",
            Self::UnknownMode => "unknown_mode",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single path-qualified violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Dotted path of the offending value (e.g. `tokens.colors.primary`).
    pub path: String,
    /// Human-readable, single-line message.
    pub message: String,
    /// Stable reason code.
    pub code: ReasonCode,
}

impl ValidationError {
    /// Create a new violation.
    pub fn new(code: ReasonCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            code,
        }
    }

    /// Create a schema violation.
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ReasonCode::SchemaViolation, path, message)
    }

    /// Whether this violation comes from schema validation.
    pub fn is_schema(&self) -> bool {
        self.code == ReasonCode::SchemaViolation
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Error categories surfaced to collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SchemaViolation,
    IntegrityViolation,
    NotFound,
    IntegrityCorruption,
    Storage,
    Internal,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable, single-line message.
    pub message: String,
    /// Individual violations (empty for non-validation errors).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<ValidationError>,
}

impl ErrorPayload {
    /// Create a payload without violations.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// Attach violations.
    pub fn with_violations(mut self, violations: Vec<ValidationError>) -> Self {
        self.violations = violations;
        self
    }

    /// Codes of all attached violations, in order.
    pub fn codes(&self) -> Vec<ReasonCode> {
        self.violations.iter().map(|v| v.code).collect()
    }
}
