//! Document schema validation
//!
//! Validates a standalone configuration document against the table for its
//! domain kind. Every violation is collected in one pass; malformed input
//! never panics, it simply produces errors.

mod descriptor;
mod template;
mod theme;
mod validator;

pub use descriptor::{Expect, Field, Presence};
pub use theme::{REQUIRED_COLORS, TOKEN_CATEGORIES};

use serde_json::Value;

use crate::error::ValidationError;
use preset_protocol::DomainKind;

/// Root field table for a domain kind.
pub fn table_for(kind: DomainKind) -> &'static [Field] {
    match kind {
        DomainKind::Theme => theme::THEME,
        DomainKind::Template => template::TEMPLATE,
    }
}

/// Validate a document, returning every violation found.
pub fn validate(document: &Value, kind: DomainKind) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    validator::check_object(document, table_for(kind), "", &mut errors);
    errors
}

/// Human-readable validation report.
pub fn summary(document: &Value, kind: DomainKind) -> String {
    let errors = validate(document, kind);
    if errors.is_empty() {
        return format!("{} document is valid", kind);
    }

    let mut out = format!(
        "{} document failed validation ({} violation{}):",
        kind,
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );
    for error in &errors {
        out.push_str("\n  - ");
        out.push_str(&error.message);
    }
    out
}
