//! Tenant active selection
//!
//! Each tenant points at the theme and template it currently uses, plus
//! the theme modes it has switched on. A selection may only name presets
//! or entities the tenant owns, and every enabled mode must exist in the
//! resolved theme.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::ConfigEntity;
use crate::error::{ReasonCode, ValidationError};
use crate::resolve::ResolvedConfig;
use preset_protocol::{DomainKind, PresetRef};

/// A tenant's active configuration pointers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSelection {
    /// Tenant identity
    pub owner: String,

    /// Selected theme entity id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    /// Selected template entity id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Enabled theme modes (e.g. `["dark"]`)
    #[serde(default)]
    pub theme_modes: Vec<String>,

    pub updated_at: DateTime<Utc>,
}

impl TenantSelection {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            theme: None,
            template: None,
            theme_modes: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_theme(mut self, id: impl Into<String>) -> Self {
        self.theme = Some(id.into());
        self
    }

    pub fn with_template(mut self, id: impl Into<String>) -> Self {
        self.template = Some(id.into());
        self
    }

    pub fn with_modes<I, S>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.theme_modes = modes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this selection points at `id`.
    pub fn references(&self, id: &str) -> bool {
        self.theme.as_deref() == Some(id) || self.template.as_deref() == Some(id)
    }
}

/// Mode names declared by a resolved theme document.
pub fn available_modes(document: &Value) -> Vec<String> {
    document
        .get("modes")
        .and_then(Value::as_object)
        .map(|modes| modes.keys().cloned().collect())
        .unwrap_or_default()
}

/// Check a selection against the entities it names.
///
/// `theme_modes` is the list returned by [`available_modes`] for the
/// resolved theme, or empty when no theme is selected.
pub fn validate_selection(
    selection: &TenantSelection,
    theme: Option<&ConfigEntity>,
    template: Option<&ConfigEntity>,
    theme_modes: &[String],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    check_slot(selection, theme, DomainKind::Theme, "theme", &mut errors);
    check_slot(selection, template, DomainKind::Template, "template", &mut errors);

    if !selection.theme_modes.is_empty() && theme.is_none() {
        errors.push(ValidationError::new(
            ReasonCode::UnknownMode,
            "themeModes",
            "theme modes require a selected theme",
        ));
        return errors;
    }

    for mode in &selection.theme_modes {
        if !theme_modes.contains(mode) {
            errors.push(ValidationError::new(
                ReasonCode::UnknownMode,
                "themeModes",
                format!(
                    "theme mode '{}' is not available in the selected theme; available modes: {}",
                    mode,
                    if theme_modes.is_empty() {
                        "none".to_string()
                    } else {
                        theme_modes.join(", ")
                    }
                ),
            ));
        }
    }

    errors
}

fn check_slot(
    selection: &TenantSelection,
    entity: Option<&ConfigEntity>,
    expected: DomainKind,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    let Some(entity) = entity else {
        return;
    };

    if !entity.visible_to(&selection.owner) {
        errors.push(ValidationError::new(
            ReasonCode::SelectionForbidden,
            path,
            format!(
                "can only select preset {}s or {}s owned by this tenant",
                expected, expected
            ),
        ));
    }
    if entity.kind != expected {
        errors.push(ValidationError::new(
            ReasonCode::KindMismatch,
            path,
            format!("'{}' is a {}, not a {}", entity.name, entity.kind, expected),
        ));
    }
}

/// Lightweight description of a tenant's selected theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSummary {
    pub id: String,
    pub name: String,
    pub version: String,
    pub is_preset: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub available_modes: Vec<String>,
    pub selected_modes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub based_on: Option<PresetRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_overrides: Option<bool>,
}

impl SelectionSummary {
    /// Summarize a selected entity from its resolution.
    pub fn new(selection: &TenantSelection, entity: &ConfigEntity, resolved: &ResolvedConfig) -> Self {
        let category = resolved
            .document
            .get("meta")
            .and_then(|m| m.get("category"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            id: entity.id.clone(),
            name: entity.name.clone(),
            version: entity.version.clone(),
            is_preset: entity.is_preset,
            category,
            available_modes: available_modes(&resolved.document),
            selected_modes: selection.theme_modes.clone(),
            based_on: resolved.inheritance.as_ref().map(|i| i.base_preset.clone()),
            has_overrides: resolved.inheritance.as_ref().map(|i| i.has_overrides),
        }
    }
}
