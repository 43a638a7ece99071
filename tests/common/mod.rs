//! Shared helpers for integration tests

#![allow(dead_code)]

use preset_overlay::registry::Registry;
use preset_overlay::seed::{self, SeedPreset};
use preset_overlay::{DomainKind, MemoryStore};
use serde_json::{json, Value};

/// A registry holding the built-in presets.
pub fn seeded_registry() -> Registry<MemoryStore> {
    let registry = Registry::new(MemoryStore::new());
    seed::apply(&registry, seed::builtin().unwrap(), false).unwrap();
    registry
}

pub fn builtin(kind: DomainKind, name: &str) -> SeedPreset {
    seed::builtin()
        .unwrap()
        .into_iter()
        .find(|p| p.kind == kind && p.name() == Some(name))
        .unwrap()
}

/// The Default theme document renamed for a tenant.
pub fn theme_doc(name: &str, version: &str) -> Value {
    let mut doc = builtin(DomainKind::Theme, "Default").document;
    doc["meta"]["id"] = json!(name.to_lowercase());
    doc["meta"]["name"] = json!(name);
    doc["meta"]["version"] = json!(version);
    doc
}

pub fn preset_id(kind: DomainKind, name: &str) -> String {
    seed::preset_id(kind, name)
}
