//! Shared test fixtures built from the bundled preset documents.

use serde_json::{json, Value};

use crate::entity::ConfigEntity;
use crate::overlay::Fragment;
use preset_protocol::DomainKind;

const DEFAULT_THEME: &str = include_str!("../presets/themes/default.json");
const MODERN_LANDING: &str = include_str!("../presets/templates/modern-landing.json");

fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

fn with_identity(raw: &str, name: &str, version: &str) -> Value {
    let mut doc: Value = serde_json::from_str(raw).unwrap();
    doc["meta"]["id"] = json!(slug(name));
    doc["meta"]["name"] = json!(name);
    doc["meta"]["version"] = json!(version);
    doc
}

/// A complete, valid theme document.
pub fn theme_document(name: &str, version: &str) -> Value {
    with_identity(DEFAULT_THEME, name, version)
}

/// A complete, valid template document.
pub fn template_document(name: &str, version: &str) -> Value {
    with_identity(MODERN_LANDING, name, version)
}

pub fn preset_theme(name: &str) -> ConfigEntity {
    ConfigEntity::preset(
        format!("preset-{}", slug(name)),
        DomainKind::Theme,
        theme_document(name, "1.0.0"),
    )
}

pub fn preset_template(name: &str) -> ConfigEntity {
    ConfigEntity::preset(
        format!("preset-{}", slug(name)),
        DomainKind::Template,
        template_document(name, "2.0.0"),
    )
}

/// Tenant-owned theme with a full document.
pub fn standalone_theme(owner: &str, name: &str, version: &str) -> ConfigEntity {
    let mut entity = ConfigEntity::preset(
        format!("{}-{}", owner, slug(name)),
        DomainKind::Theme,
        theme_document(name, version),
    );
    entity.is_preset = false;
    entity.owner = Some(owner.to_string());
    entity
}

/// Tenant-owned entity deriving from `base`.
pub fn derived(owner: &str, base: &ConfigEntity, fragment: Fragment) -> ConfigEntity {
    let mut entity = ConfigEntity::preset(
        format!("{}-{}-custom", owner, slug(&base.name)),
        base.kind,
        Value::Null,
    );
    entity.name = format!("{} Custom", base.name);
    entity.version = "1.0.0".to_string();
    entity.is_preset = false;
    entity.document = None;
    entity.base_preset = Some(base.id.clone());
    entity.override_fragment = fragment;
    entity.owner = Some(owner.to_string());
    entity
}
