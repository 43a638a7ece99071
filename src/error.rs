//! Error taxonomy
//!
//! Expected bad input never panics: validators return `Vec<ValidationError>`
//! and the write path turns a non-empty list into a `CoreError`. Storage
//! failures pass through untouched.

pub use preset_protocol::{ErrorKind, ErrorPayload, ReasonCode, ValidationError};

use crate::store::StoreError;

/// Errors surfaced by the write and read paths.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("document failed schema validation: {}", join(.0))]
    SchemaViolation(Vec<ValidationError>),

    #[error("write rejected: {}", join(.0))]
    IntegrityViolation(Vec<ValidationError>),

    #[error("{what} '{id}' not found")]
    NotFound { what: &'static str, id: String },

    #[error("entity '{entity}' references missing base preset '{base}'")]
    IntegrityCorruption { entity: String, base: String },

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("failed to canonicalize document: {0}")]
    Canonicalize(String),
}

impl CoreError {
    /// Classify a non-empty violation list.
    ///
    /// A list made only of schema violations is a `SchemaViolation`; anything
    /// carrying an integrity code is an `IntegrityViolation`.
    pub fn rejected(violations: Vec<ValidationError>) -> Self {
        if violations.iter().all(ValidationError::is_schema) {
            CoreError::SchemaViolation(violations)
        } else {
            CoreError::IntegrityViolation(violations)
        }
    }

    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            what,
            id: id.into(),
        }
    }

    /// Violations carried by this error (empty for other variants).
    pub fn violations(&self) -> &[ValidationError] {
        match self {
            CoreError::SchemaViolation(v) | CoreError::IntegrityViolation(v) => v,
            _ => &[],
        }
    }

    /// Whether any carried violation has the given code.
    pub fn has_code(&self, code: ReasonCode) -> bool {
        self.violations().iter().any(|v| v.code == code)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::SchemaViolation(_) => ErrorKind::SchemaViolation,
            CoreError::IntegrityViolation(_) => ErrorKind::IntegrityViolation,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::IntegrityCorruption { .. } => ErrorKind::IntegrityCorruption,
            CoreError::Storage(_) => ErrorKind::Storage,
            CoreError::Canonicalize(_) => ErrorKind::Internal,
        }
    }

    /// Convert to a wire error payload
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload::new(self.kind(), self.to_string()).with_violations(self.violations().to_vec())
    }
}

fn join(violations: &[ValidationError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
