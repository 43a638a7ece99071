//! Write-time integrity checks
//!
//! The guard runs before persistence and returns every violated rule. It
//! never touches storage itself: the write path gathers the existing record,
//! the base preset, the current holder of the name, and usage counts inside
//! one store transaction and hands them in.
//!
//! Rules:
//! - tenant writes cannot create presets or touch existing ones
//! - presets have no owner and no base; tenant entities have an owner
//! - a base must be a preset of the same kind with no base of its own
//! - standalone documents pass schema validation and agree with the
//!   entity's name and version
//! - `owner` and `isPreset` never change on update
//! - presets in use (as a base, or selected active) cannot be deleted

mod version;

pub use version::is_semver;

use serde_json::Value;
use tracing::debug;

use crate::entity::{meta_str, ConfigEntity};
use crate::error::{ReasonCode, ValidationError};
use crate::schema;
use preset_protocol::WriteRequest;

/// Which surface a write arrives through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Tenant-facing write path.
    Tenant,
    /// Administrative preset seeding. Bypasses the tenant-only rules.
    Seeding,
}

/// Records gathered by the write path for one save.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveContext<'a> {
    /// Currently persisted version of the entity, on update.
    pub existing: Option<&'a ConfigEntity>,
    /// The entity named by `basePreset`.
    pub base: Option<&'a ConfigEntity>,
    /// Entity already holding this name in the same namespace.
    pub name_holder: Option<&'a ConfigEntity>,
}

/// Dependents of an entity about to be deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    /// Entities using it as `basePreset`.
    pub derived: usize,
    /// Tenants with it selected as active.
    pub active_selections: usize,
}

impl Usage {
    pub fn is_unused(&self) -> bool {
        self.derived == 0 && self.active_selections == 0
    }
}

/// Pre-commit integrity checks.
#[derive(Debug, Clone, Copy)]
pub struct IntegrityGuard {
    mode: WriteMode,
}

impl IntegrityGuard {
    pub fn new(mode: WriteMode) -> Self {
        Self { mode }
    }

    pub fn tenant() -> Self {
        Self::new(WriteMode::Tenant)
    }

    pub fn seeding() -> Self {
        Self::new(WriteMode::Seeding)
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Check an entity about to be created or updated.
    pub fn before_save(&self, entity: &ConfigEntity, ctx: &SaveContext<'_>) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.mode == WriteMode::Tenant {
            if let Some(existing) = ctx.existing {
                if existing.is_preset {
                    errors.push(ValidationError::new(
                        ReasonCode::PresetReadOnly,
                        "",
                        format!("preset '{}' is read-only", existing.name),
                    ));
                }
            }
            if entity.is_preset {
                errors.push(ValidationError::new(
                    ReasonCode::PresetCreationForbidden,
                    "isPreset",
                    "presets can only be created by the seeding process",
                ));
            }
        }

        if let Some(existing) = ctx.existing {
            check_immutable_fields(entity, existing, &mut errors);
        }

        check_identity_fields(entity, &mut errors);
        check_ownership(entity, &mut errors);

        match &entity.base_preset {
            Some(_) => check_base(entity, ctx.base, &mut errors),
            None => check_standalone(entity, &mut errors),
        }

        if let Some(holder) = ctx.name_holder {
            if holder.id != entity.id {
                errors.push(ValidationError::new(
                    ReasonCode::NameConflict,
                    "name",
                    format!("name '{}' is already in use", entity.name),
                ));
            }
        }

        debug!(
            entity = %entity.id,
            mode = ?self.mode,
            violations = errors.len(),
            "integrity check before save"
        );
        errors
    }

    /// Check an entity about to be deleted.
    pub fn before_delete(&self, existing: &ConfigEntity, usage: Usage) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if existing.is_preset {
            if self.mode == WriteMode::Tenant {
                errors.push(ValidationError::new(
                    ReasonCode::PresetReadOnly,
                    "",
                    format!("preset '{}' is read-only", existing.name),
                ));
            }
            if !usage.is_unused() {
                errors.push(ValidationError::new(
                    ReasonCode::PresetInUse,
                    "",
                    format!(
                        "preset '{}' is in use by {} derived entit{} and {} active selection{}",
                        existing.name,
                        usage.derived,
                        if usage.derived == 1 { "y" } else { "ies" },
                        usage.active_selections,
                        if usage.active_selections == 1 { "" } else { "s" }
                    ),
                ));
            }
        } else if usage.active_selections > 0 {
            errors.push(ValidationError::new(
                ReasonCode::EntityInUse,
                "",
                format!("'{}' is selected as an active configuration", existing.name),
            ));
        }

        errors
    }
}

/// Fill omitted `name`/`version` from `document.meta`.
pub fn populate_identity(request: &mut WriteRequest) {
    let Some(document) = request.document.as_ref() else {
        return;
    };

    if request.name.is_none() {
        request.name = meta_str(document, "name").map(str::to_string);
    }
    if request.version.is_none() {
        request.version = meta_str(document, "version").map(str::to_string);
    }
}

fn check_immutable_fields(
    entity: &ConfigEntity,
    existing: &ConfigEntity,
    errors: &mut Vec<ValidationError>,
) {
    if entity.owner != existing.owner {
        errors.push(ValidationError::new(
            ReasonCode::ImmutableField,
            "owner",
            "owner cannot be changed",
        ));
    }
    if entity.is_preset != existing.is_preset {
        errors.push(ValidationError::new(
            ReasonCode::ImmutableField,
            "isPreset",
            "isPreset cannot be changed",
        ));
    }
    if entity.kind != existing.kind {
        errors.push(ValidationError::new(
            ReasonCode::ImmutableField,
            "kind",
            format!("kind cannot be changed from {} to {}", existing.kind, entity.kind),
        ));
    }
}

fn check_identity_fields(entity: &ConfigEntity, errors: &mut Vec<ValidationError>) {
    if entity.name.trim().is_empty() {
        errors.push(ValidationError::new(
            ReasonCode::IdentityMismatch,
            "name",
            "name is required",
        ));
    }
    if !is_semver(&entity.version) {
        errors.push(ValidationError::new(
            ReasonCode::InvalidVersion,
            "version",
            format!("version '{}' is not a semantic version", entity.version),
        ));
    }
}

fn check_ownership(entity: &ConfigEntity, errors: &mut Vec<ValidationError>) {
    if entity.is_preset {
        if entity.owner.is_some() {
            errors.push(ValidationError::new(
                ReasonCode::OwnershipForbidden,
                "owner",
                "presets cannot be associated with a tenant",
            ));
        }
        if entity.base_preset.is_some() {
            errors.push(ValidationError::new(
                ReasonCode::InheritanceDepthExceeded,
                "basePreset",
                "presets cannot extend other entities",
            ));
        }
    } else if entity.owner.is_none() {
        errors.push(ValidationError::new(
            ReasonCode::OwnershipRequired,
            "owner",
            "non-preset entities must be associated with a tenant",
        ));
    }
}

fn check_base(entity: &ConfigEntity, base: Option<&ConfigEntity>, errors: &mut Vec<ValidationError>) {
    if !entity.override_fragment.is_object() {
        errors.push(ValidationError::schema(
            "overrideFragment",
            "overrideFragment must be a map",
        ));
    }
    check_meta_identity(entity, &entity.override_fragment, errors);

    // A derived entity stores at most its own meta block.
    if let Some(document) = entity.document.as_ref() {
        match document.as_object() {
            Some(map) if map.keys().all(|key| key == "meta") => {
                check_meta_identity(entity, document, errors);
            }
            _ => errors.push(ValidationError::schema(
                "document",
                "document of a derived entity may only carry meta",
            )),
        }
    }

    // A missing base is reported as not-found by the write path.
    let Some(base) = base else {
        return;
    };

    if !base.is_preset {
        errors.push(ValidationError::new(
            ReasonCode::BaseNotPreset,
            "basePreset",
            format!("basePreset '{}' is not a preset", base.name),
        ));
    }
    if base.base_preset.is_some() {
        errors.push(ValidationError::new(
            ReasonCode::InheritanceDepthExceeded,
            "basePreset",
            "only one level of inheritance is supported",
        ));
    }
    if base.kind != entity.kind {
        errors.push(ValidationError::new(
            ReasonCode::KindMismatch,
            "basePreset",
            format!("a {} cannot derive from a {} preset", entity.kind, base.kind),
        ));
    }
}

fn check_standalone(entity: &ConfigEntity, errors: &mut Vec<ValidationError>) {
    if !crate::overlay::is_empty_map(&entity.override_fragment) {
        errors.push(ValidationError::new(
            ReasonCode::OverrideWithoutBase,
            "overrideFragment",
            "overrideFragment requires a basePreset",
        ));
    }

    let Some(document) = entity.document.as_ref() else {
        errors.push(ValidationError::schema(
            "document",
            "document is required for standalone entities",
        ));
        return;
    };

    errors.extend(schema::validate(document, entity.kind));
    check_meta_identity(entity, document, errors);
}

fn check_meta_identity(entity: &ConfigEntity, document: &Value, errors: &mut Vec<ValidationError>) {
    if let Some(meta_name) = meta_str(document, "name") {
        if meta_name != entity.name {
            errors.push(ValidationError::new(
                ReasonCode::IdentityMismatch,
                "name",
                format!(
                    "name '{}' must match document.meta.name '{}'",
                    entity.name, meta_name
                ),
            ));
        }
    }
    if let Some(meta_version) = meta_str(document, "version") {
        if meta_version != entity.version {
            errors.push(ValidationError::new(
                ReasonCode::IdentityMismatch,
                "version",
                format!(
                    "version '{}' must match document.meta.version '{}'",
                    entity.version, meta_version
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{derived, preset_theme, standalone_theme};
    use preset_protocol::DomainKind;
    use serde_json::json;

    fn codes(errors: &[ValidationError]) -> Vec<ReasonCode> {
        errors.iter().map(|e| e.code).collect()
    }

    #[test]
    fn test_valid_standalone() {
        let entity = standalone_theme("acme", "Acme", "1.0.0");
        let errors = IntegrityGuard::tenant().before_save(&entity, &SaveContext::default());
        assert!(errors.is_empty(), "unexpected: {:?}", errors);
    }

    #[test]
    fn test_valid_derived() {
        let base = preset_theme("Default");
        let entity = derived("acme", &base, json!({"tokens": {"colors": {"primary": "#f00"}}}));
        let ctx = SaveContext {
            base: Some(&base),
            ..Default::default()
        };
        assert!(IntegrityGuard::tenant().before_save(&entity, &ctx).is_empty());
    }

    #[test]
    fn test_tenant_cannot_create_preset() {
        let entity = preset_theme("Sneaky");
        let errors = IntegrityGuard::tenant().before_save(&entity, &SaveContext::default());
        assert_eq!(codes(&errors), vec![ReasonCode::PresetCreationForbidden]);

        // The seeding path may
        assert!(IntegrityGuard::seeding()
            .before_save(&entity, &SaveContext::default())
            .is_empty());
    }

    #[test]
    fn test_preset_read_only_on_partial_update() {
        let existing = preset_theme("Default");
        let mut update = existing.clone();
        update.is_preset = false;
        update.owner = Some("acme".to_string());

        let ctx = SaveContext {
            existing: Some(&existing),
            ..Default::default()
        };
        let errors = IntegrityGuard::tenant().before_save(&update, &ctx);
        let found = codes(&errors);
        assert!(found.contains(&ReasonCode::PresetReadOnly));
        assert!(found.contains(&ReasonCode::ImmutableField));

        // Unchanged copy is still rejected
        let errors = IntegrityGuard::tenant().before_save(&existing, &ctx);
        assert!(codes(&errors).contains(&ReasonCode::PresetReadOnly));
    }

    #[test]
    fn test_base_must_be_preset() {
        let base = standalone_theme("acme", "Acme", "1.0.0");
        let entity = derived("acme", &base, json!({}));
        let ctx = SaveContext {
            base: Some(&base),
            ..Default::default()
        };
        let errors = IntegrityGuard::tenant().before_save(&entity, &ctx);
        assert_eq!(codes(&errors), vec![ReasonCode::BaseNotPreset]);
        assert_eq!(errors[0].path, "basePreset");
    }

    #[test]
    fn test_inheritance_depth() {
        let root = preset_theme("Default");
        let mut middle = preset_theme("Middle");
        middle.base_preset = Some(root.id.clone());
        let entity = derived("acme", &middle, json!({}));
        let ctx = SaveContext {
            base: Some(&middle),
            ..Default::default()
        };
        let errors = IntegrityGuard::tenant().before_save(&entity, &ctx);
        assert_eq!(codes(&errors), vec![ReasonCode::InheritanceDepthExceeded]);

        // A preset declaring a base is rejected on its own
        let errors = IntegrityGuard::seeding().before_save(&middle, &SaveContext::default());
        assert!(codes(&errors).contains(&ReasonCode::InheritanceDepthExceeded));
    }

    #[test]
    fn test_kind_mismatch() {
        let base = preset_theme("Default");
        let mut entity = derived("acme", &base, json!({}));
        entity.kind = DomainKind::Template;
        let ctx = SaveContext {
            base: Some(&base),
            ..Default::default()
        };
        let errors = IntegrityGuard::tenant().before_save(&entity, &ctx);
        assert_eq!(codes(&errors), vec![ReasonCode::KindMismatch]);
    }

    #[test]
    fn test_ownership() {
        let mut entity = standalone_theme("acme", "Acme", "1.0.0");
        entity.owner = None;
        let errors = IntegrityGuard::tenant().before_save(&entity, &SaveContext::default());
        assert_eq!(codes(&errors), vec![ReasonCode::OwnershipRequired]);

        let mut preset = preset_theme("Default");
        preset.owner = Some("acme".to_string());
        let errors = IntegrityGuard::seeding().before_save(&preset, &SaveContext::default());
        assert_eq!(codes(&errors), vec![ReasonCode::OwnershipForbidden]);
    }

    #[test]
    fn test_identity_mismatch() {
        let mut entity = standalone_theme("acme", "Acme", "1.0.0");
        entity.name = "Acme Renamed".to_string();
        entity.version = "1.1.0".to_string();
        let errors = IntegrityGuard::tenant().before_save(&entity, &SaveContext::default());
        assert_eq!(
            codes(&errors),
            vec![ReasonCode::IdentityMismatch, ReasonCode::IdentityMismatch]
        );
        assert_eq!(errors[0].path, "name");
        assert_eq!(errors[1].path, "version");
    }

    #[test]
    fn test_invalid_version() {
        let mut entity = standalone_theme("acme", "Acme", "v1");
        entity.version = "v1".to_string();
        let errors = IntegrityGuard::tenant().before_save(&entity, &SaveContext::default());
        assert_eq!(codes(&errors), vec![ReasonCode::InvalidVersion]);
    }

    #[test]
    fn test_standalone_schema_errors_are_reported() {
        let mut entity = standalone_theme("acme", "Acme", "1.0.0");
        if let Some(doc) = entity.document.as_mut() {
            doc["tokens"].as_object_mut().unwrap().remove("shadows");
        }
        let errors = IntegrityGuard::tenant().before_save(&entity, &SaveContext::default());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_schema());
        assert_eq!(errors[0].path, "tokens.shadows");

        entity.document = None;
        let errors = IntegrityGuard::tenant().before_save(&entity, &SaveContext::default());
        assert_eq!(errors[0].path, "document");
    }

    #[test]
    fn test_override_without_base() {
        let mut entity = standalone_theme("acme", "Acme", "1.0.0");
        entity.override_fragment = json!({"tokens": {"colors": {"primary": "#f00"}}});
        let errors = IntegrityGuard::tenant().before_save(&entity, &SaveContext::default());
        assert_eq!(codes(&errors), vec![ReasonCode::OverrideWithoutBase]);
    }

    #[test]
    fn test_name_conflict() {
        let holder = standalone_theme("acme", "Acme", "1.0.0");
        let mut entity = standalone_theme("acme", "Acme", "1.0.0");
        entity.id = "another".to_string();
        let ctx = SaveContext {
            name_holder: Some(&holder),
            ..Default::default()
        };
        let errors = IntegrityGuard::tenant().before_save(&entity, &ctx);
        assert_eq!(codes(&errors), vec![ReasonCode::NameConflict]);

        // Holding your own name is fine
        let ctx = SaveContext {
            name_holder: Some(&entity),
            ..Default::default()
        };
        assert!(IntegrityGuard::tenant().before_save(&entity, &ctx).is_empty());
    }

    #[test]
    fn test_kind_is_immutable() {
        let existing = standalone_theme("acme", "Acme", "1.0.0");
        let mut update = existing.clone();
        update.kind = DomainKind::Template;

        let ctx = SaveContext {
            existing: Some(&existing),
            ..Default::default()
        };
        let errors = IntegrityGuard::tenant().before_save(&update, &ctx);
        let immutable: Vec<&ValidationError> = errors
            .iter()
            .filter(|e| e.code == ReasonCode::ImmutableField)
            .collect();
        assert_eq!(immutable.len(), 1);
        assert_eq!(immutable[0].path, "kind");
    }

    #[test]
    fn test_derived_meta_must_match_identity() {
        let base = preset_theme("Default");
        let ctx = SaveContext {
            base: Some(&base),
            ..Default::default()
        };

        let mut entity = derived("acme", &base, json!({}));
        entity.document = Some(json!({"meta": {"name": "Other", "version": "1.0.0"}}));
        let errors = IntegrityGuard::tenant().before_save(&entity, &ctx);
        assert_eq!(codes(&errors), vec![ReasonCode::IdentityMismatch]);
        assert_eq!(errors[0].path, "name");

        let entity = derived("acme", &base, json!({"meta": {"version": "9.9.9"}}));
        let errors = IntegrityGuard::tenant().before_save(&entity, &ctx);
        assert_eq!(codes(&errors), vec![ReasonCode::IdentityMismatch]);
        assert_eq!(errors[0].path, "version");

        // Matching meta is fine
        let mut entity = derived("acme", &base, json!({}));
        entity.document = Some(json!({"meta": {"name": entity.name.clone(), "version": "1.0.0"}}));
        assert!(IntegrityGuard::tenant().before_save(&entity, &ctx).is_empty());
    }

    #[test]
    fn test_derived_document_only_carries_meta() {
        let base = preset_theme("Default");
        let ctx = SaveContext {
            base: Some(&base),
            ..Default::default()
        };

        let mut entity = derived("acme", &base, json!({}));
        entity.document = Some(json!({"meta": {}, "tokens": {}}));
        let errors = IntegrityGuard::tenant().before_save(&entity, &ctx);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "document");
    }

    #[test]
    fn test_delete_rules() {
        let preset = preset_theme("Default");
        let tenant_guard = IntegrityGuard::tenant();
        let seed_guard = IntegrityGuard::seeding();

        let in_use = Usage {
            derived: 0,
            active_selections: 1,
        };
        let errors = tenant_guard.before_delete(&preset, in_use);
        assert_eq!(
            codes(&errors),
            vec![ReasonCode::PresetReadOnly, ReasonCode::PresetInUse]
        );

        let errors = seed_guard.before_delete(&preset, in_use);
        assert_eq!(codes(&errors), vec![ReasonCode::PresetInUse]);
        assert!(errors[0].message.contains("1 active selection"));

        assert!(seed_guard.before_delete(&preset, Usage::default()).is_empty());

        let owned = standalone_theme("acme", "Acme", "1.0.0");
        assert!(tenant_guard.before_delete(&owned, Usage::default()).is_empty());
        let errors = tenant_guard.before_delete(&owned, in_use);
        assert_eq!(codes(&errors), vec![ReasonCode::EntityInUse]);
    }

    #[test]
    fn test_populate_identity() {
        let mut request = WriteRequest::standalone(
            DomainKind::Theme,
            json!({"meta": {"name": "Acme", "version": "2.1.0"}}),
        );
        populate_identity(&mut request);
        assert_eq!(request.name.as_deref(), Some("Acme"));
        assert_eq!(request.version.as_deref(), Some("2.1.0"));

        // Explicit values are kept
        let mut request = WriteRequest::standalone(
            DomainKind::Theme,
            json!({"meta": {"name": "Acme", "version": "2.1.0"}}),
        );
        request.name = Some("Other".to_string());
        populate_identity(&mut request);
        assert_eq!(request.name.as_deref(), Some("Other"));
    }
}
