//! Read-path resolution
//!
//! A standalone entity resolves to its own document. A derived entity
//! resolves to its base preset's document with the primary section
//! (`tokens` or `pages`) merged with the override fragment. `modes` and any
//! other non-meta base section are carried over verbatim.

mod cache;

pub use cache::{CacheKey, ResolveCache, DEFAULT_CACHE_CAPACITY};

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::entity::ConfigEntity;
use crate::error::CoreError;
use crate::overlay::{self, merge};
use preset_protocol::{DomainKind, InheritanceInfo, PresetRef, ResolvedResponse};

/// Effective content of an entity. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub entity_id: String,
    pub document: Value,
    /// Preset this document was derived from, if any.
    pub based_on: Option<PresetRef>,
    pub inheritance: Option<InheritanceInfo>,
    /// SHA-256 hex of the canonical JSON form of `document`.
    pub digest: String,
}

impl ResolvedConfig {
    pub fn to_response(&self) -> ResolvedResponse {
        ResolvedResponse {
            entity_id: self.entity_id.clone(),
            document: self.document.clone(),
            digest: self.digest.clone(),
            inheritance_info: self.inheritance.clone(),
        }
    }
}

/// Resolve an entity. `base` must be the entity named by `basePreset` when
/// the entity is derived; it is ignored otherwise.
pub fn resolve(entity: &ConfigEntity, base: Option<&ConfigEntity>) -> Result<ResolvedConfig, CoreError> {
    let Some(base_id) = entity.base_preset.as_deref() else {
        let document = entity
            .document
            .clone()
            .ok_or_else(|| CoreError::not_found("document", &entity.id))?;
        return finish(entity, document, None, None);
    };

    let corrupt = || CoreError::IntegrityCorruption {
        entity: entity.id.clone(),
        base: base_id.to_string(),
    };

    let base = base.filter(|b| b.id == base_id).ok_or_else(corrupt)?;
    let base_doc = base
        .document
        .as_ref()
        .and_then(Value::as_object)
        .ok_or_else(corrupt)?;

    let section = entity.kind.primary_section();
    let empty = overlay::empty();

    let mut document: Map<String, Value> = base_doc
        .iter()
        .filter(|(key, _)| key.as_str() != "meta")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let base_section = base_doc.get(section).unwrap_or(&empty);
    let override_section = entity.override_fragment.get(section).unwrap_or(&empty);
    document.insert(section.to_string(), merge(base_section, override_section));

    let meta = explicit_meta(entity).unwrap_or_else(|| synthesize_meta(entity, base));
    document.insert("meta".to_string(), meta);

    debug!(
        entity = %entity.id,
        base = %base.id,
        section,
        "merged override over base preset"
    );

    finish(
        entity,
        Value::Object(document),
        Some(base.to_ref()),
        inheritance_info(entity, Some(base)),
    )
}

/// Inheritance summary for a derived entity; `None` for standalone ones.
pub fn inheritance_info(entity: &ConfigEntity, base: Option<&ConfigEntity>) -> Option<InheritanceInfo> {
    entity.base_preset.as_ref()?;
    let base = base?;

    let section = entity.override_fragment.get(entity.kind.primary_section());
    let override_leaf_count = section.map(overlay::count_leaves).unwrap_or(0);
    let has_overrides = match section {
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    };

    Some(InheritanceInfo {
        base_preset: base.to_ref(),
        has_overrides,
        override_leaf_count,
    })
}

/// SHA-256 of the RFC 8785 canonical form of a document.
pub fn digest(document: &Value) -> Result<String, CoreError> {
    let jcs_bytes = serde_json_canonicalizer::to_vec(document)
        .map_err(|e| CoreError::Canonicalize(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(&jcs_bytes);
    Ok(hex::encode(hasher.finalize()))
}

fn finish(
    entity: &ConfigEntity,
    document: Value,
    based_on: Option<PresetRef>,
    inheritance: Option<InheritanceInfo>,
) -> Result<ResolvedConfig, CoreError> {
    let digest = digest(&document)?;
    Ok(ResolvedConfig {
        entity_id: entity.id.clone(),
        document,
        based_on,
        inheritance,
        digest,
    })
}

// overrideFragment.meta wins, then a meta block stored alongside the
// override.
fn explicit_meta(entity: &ConfigEntity) -> Option<Value> {
    entity
        .override_fragment
        .get("meta")
        .filter(|m| m.is_object())
        .or_else(|| entity.meta().filter(|m| m.is_object()))
        .cloned()
}

fn synthesize_meta(entity: &ConfigEntity, base: &ConfigEntity) -> Value {
    let base_meta = base.meta();
    let category = base_meta
        .and_then(|m| m.get("category"))
        .cloned()
        .unwrap_or(Value::Null);

    let mut meta = json!({
        "id": entity.id,
        "name": entity.name,
        "version": entity.version,
        "category": category,
        "description": format!("Based on {}", base.name),
        "basedOn": base.to_ref(),
    });

    if entity.kind == DomainKind::Template {
        if let Some(tier) = base_meta.and_then(|m| m.get("tier")) {
            meta["tier"] = tier.clone();
        }
    }
    meta
}
