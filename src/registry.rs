//! Write-path and read-path orchestration
//!
//! `Registry` owns the store behind a single mutex. Every write gathers its
//! dependent records (existing entity, base preset, name holder, usage),
//! runs the integrity guard, and persists while holding that lock, so a
//! preset cannot be deleted between the check and a new entity starting to
//! reference it. Reads resolve under the same lock and go through the
//! resolution cache.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::ConfigEntity;
use crate::error::CoreError;
use crate::guard::{populate_identity, IntegrityGuard, SaveContext};
use crate::resolve::{resolve, CacheKey, ResolveCache, ResolvedConfig};
use crate::store::{EntityStore, StoreError};
use crate::tenant::{available_modes, validate_selection, SelectionSummary, TenantSelection};
use preset_protocol::{DomainKind, WriteRequest};

/// Guarded access to an `EntityStore`.
#[derive(Debug)]
pub struct Registry<S> {
    store: Mutex<S>,
    cache: ResolveCache,
}

impl<S: EntityStore> Registry<S> {
    pub fn new(store: S) -> Self {
        Self::with_cache(store, ResolveCache::default())
    }

    pub fn with_cache(store: S, cache: ResolveCache) -> Self {
        Self {
            store: Mutex::new(store),
            cache,
        }
    }

    pub fn cache(&self) -> &ResolveCache {
        &self.cache
    }

    /// Run `f` against the store under the registry lock.
    pub fn with_store<R>(&self, f: impl FnOnce(&S) -> R) -> Result<R, CoreError> {
        let store = self.lock()?;
        Ok(f(&store))
    }

    pub fn into_store(self) -> Result<S, CoreError> {
        self.store
            .into_inner()
            .map_err(|_| CoreError::Storage(StoreError::Poisoned))
    }

    fn lock(&self) -> Result<MutexGuard<'_, S>, CoreError> {
        self.store
            .lock()
            .map_err(|_| CoreError::Storage(StoreError::Poisoned))
    }

    // ---------------------------------------------------------------------
    // Tenant writes
    // ---------------------------------------------------------------------

    /// Create a tenant entity. A fresh id is assigned.
    pub fn create(&self, owner: &str, request: WriteRequest) -> Result<ConfigEntity, CoreError> {
        let mut store = self.lock()?;
        let id = Uuid::new_v4().to_string();
        self.commit(&mut *store, IntegrityGuard::tenant(), Some(owner), id, None, request)
    }

    /// Replace a tenant entity. Entities owned by other tenants are
    /// reported as not found.
    pub fn update(&self, owner: &str, id: &str, request: WriteRequest) -> Result<ConfigEntity, CoreError> {
        let mut store = self.lock()?;
        let existing = store
            .get(id)?
            .filter(|e| e.visible_to(owner))
            .ok_or_else(|| CoreError::not_found("entity", id))?;
        self.commit(
            &mut *store,
            IntegrityGuard::tenant(),
            Some(owner),
            id.to_string(),
            Some(existing),
            request,
        )
    }

    /// Delete a tenant entity.
    pub fn delete(&self, owner: &str, id: &str) -> Result<ConfigEntity, CoreError> {
        let mut store = self.lock()?;
        let existing = store
            .get(id)?
            .filter(|e| e.visible_to(owner))
            .ok_or_else(|| CoreError::not_found("entity", id))?;
        self.remove(&mut *store, IntegrityGuard::tenant(), existing)
    }

    /// Point a tenant at a theme and/or template.
    pub fn select(&self, mut selection: TenantSelection) -> Result<TenantSelection, CoreError> {
        let mut store = self.lock()?;

        let theme = match selection.theme.as_deref() {
            Some(id) => Some(store.get(id)?.ok_or_else(|| CoreError::not_found("theme", id))?),
            None => None,
        };
        let template = match selection.template.as_deref() {
            Some(id) => Some(store.get(id)?.ok_or_else(|| CoreError::not_found("template", id))?),
            None => None,
        };

        let modes = match &theme {
            Some(theme) => available_modes(&self.resolve_locked(&*store, theme)?.document),
            None => Vec::new(),
        };

        let errors = validate_selection(&selection, theme.as_ref(), template.as_ref(), &modes);
        if !errors.is_empty() {
            warn!(owner = %selection.owner, violations = errors.len(), "selection rejected");
            return Err(CoreError::rejected(errors));
        }

        selection.updated_at = Utc::now();
        store.put_selection(selection.clone())?;
        info!(
            owner = %selection.owner,
            theme = ?selection.theme,
            template = ?selection.template,
            "updated active selection"
        );
        Ok(selection)
    }

    // ---------------------------------------------------------------------
    // Privileged preset writes
    // ---------------------------------------------------------------------

    /// Create or replace a preset under a caller-chosen id. Bypasses the
    /// tenant-only rules; preset shape is still enforced.
    pub fn seed_preset(&self, id: &str, mut request: WriteRequest) -> Result<ConfigEntity, CoreError> {
        request.is_preset = true;
        let mut store = self.lock()?;
        let existing = store.get(id)?;
        self.commit(
            &mut *store,
            IntegrityGuard::seeding(),
            None,
            id.to_string(),
            existing,
            request,
        )
    }

    /// Delete a preset that nothing depends on.
    pub fn delete_preset(&self, id: &str) -> Result<ConfigEntity, CoreError> {
        let mut store = self.lock()?;
        let existing = store
            .get(id)?
            .filter(|e| e.is_preset)
            .ok_or_else(|| CoreError::not_found("preset", id))?;
        self.remove(&mut *store, IntegrityGuard::seeding(), existing)
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub fn get(&self, id: &str) -> Result<Option<ConfigEntity>, CoreError> {
        Ok(self.lock()?.get(id)?)
    }

    /// Resolve any entity by id.
    pub fn resolved(&self, id: &str) -> Result<ResolvedConfig, CoreError> {
        let store = self.lock()?;
        let entity = store
            .get(id)?
            .ok_or_else(|| CoreError::not_found("entity", id))?;
        self.resolve_locked(&*store, &entity)
    }

    /// Resolve an entity on behalf of a tenant.
    pub fn resolved_for(&self, owner: &str, id: &str) -> Result<ResolvedConfig, CoreError> {
        let store = self.lock()?;
        let entity = store
            .get(id)?
            .filter(|e| e.visible_to(owner))
            .ok_or_else(|| CoreError::not_found("entity", id))?;
        self.resolve_locked(&*store, &entity)
    }

    pub fn selection(&self, owner: &str) -> Result<Option<TenantSelection>, CoreError> {
        Ok(self.lock()?.selection(owner)?)
    }

    /// Describe the tenant's active theme, if one is selected.
    pub fn selection_summary(&self, owner: &str) -> Result<Option<SelectionSummary>, CoreError> {
        let store = self.lock()?;
        let Some(selection) = store.selection(owner)? else {
            return Ok(None);
        };
        let Some(theme_id) = selection.theme.as_deref() else {
            return Ok(None);
        };

        let theme = store
            .get(theme_id)?
            .ok_or_else(|| CoreError::not_found("theme", theme_id))?;
        let resolved = self.resolve_locked(&*store, &theme)?;
        Ok(Some(SelectionSummary::new(&selection, &theme, &resolved)))
    }

    /// Presets, optionally of one kind, sorted by name.
    pub fn list_presets(&self, kind: Option<DomainKind>) -> Result<Vec<ConfigEntity>, CoreError> {
        let mut presets: Vec<ConfigEntity> = self
            .lock()?
            .list()?
            .into_iter()
            .filter(|e| e.is_preset && kind.map_or(true, |k| e.kind == k))
            .collect();
        presets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(presets)
    }

    /// Everything a tenant can see: presets first, then its own entities,
    /// each group sorted by name.
    pub fn list_visible(&self, owner: &str, kind: Option<DomainKind>) -> Result<Vec<ConfigEntity>, CoreError> {
        let mut visible: Vec<ConfigEntity> = self
            .lock()?
            .list()?
            .into_iter()
            .filter(|e| e.visible_to(owner) && kind.map_or(true, |k| e.kind == k))
            .collect();
        visible.sort_by(|a, b| b.is_preset.cmp(&a.is_preset).then_with(|| a.name.cmp(&b.name)));
        Ok(visible)
    }

    // ---------------------------------------------------------------------
    // Internals (called with the store lock held)
    // ---------------------------------------------------------------------

    fn commit(
        &self,
        store: &mut S,
        guard: IntegrityGuard,
        owner: Option<&str>,
        id: String,
        existing: Option<ConfigEntity>,
        mut request: WriteRequest,
    ) -> Result<ConfigEntity, CoreError> {
        populate_identity(&mut request);

        let mut entity = ConfigEntity::from_request(id, owner.map(str::to_string), request);
        if let Some(existing) = &existing {
            entity.created_at = existing.created_at;
        }

        let base = match entity.base_preset.as_deref() {
            Some(base_id) => {
                let base = store.get(base_id)?.filter(|b| match owner {
                    Some(owner) => b.visible_to(owner),
                    None => true,
                });
                Some(base.ok_or_else(|| CoreError::not_found("base preset", base_id))?)
            }
            None => None,
        };

        let name_holder = store.find_by_name(entity.kind, entity.owner.as_deref(), &entity.name)?;

        let ctx = SaveContext {
            existing: existing.as_ref(),
            base: base.as_ref(),
            name_holder: name_holder.as_ref(),
        };
        let errors = guard.before_save(&entity, &ctx);
        if !errors.is_empty() {
            warn!(
                entity = %entity.id,
                name = %entity.name,
                violations = errors.len(),
                "write rejected"
            );
            return Err(CoreError::rejected(errors));
        }

        store.put(entity.clone())?;
        self.cache.invalidate(&entity.id);
        info!(
            entity = %entity.id,
            kind = %entity.kind,
            name = %entity.name,
            version = %entity.version,
            created = existing.is_none(),
            "saved entity"
        );

        if existing.is_some() && entity.kind == DomainKind::Theme {
            self.drop_stale_modes(store, &entity.id)?;
        }
        Ok(entity)
    }

    /// After a theme changes, remove selected modes it no longer offers from
    /// selections on it or on a theme derived from it.
    fn drop_stale_modes(&self, store: &mut S, theme_id: &str) -> Result<(), CoreError> {
        for mut selection in store.selections()? {
            if selection.theme_modes.is_empty() {
                continue;
            }
            let Some(theme_ref) = selection.theme.clone() else {
                continue;
            };
            let Some(theme) = store.get(&theme_ref)? else {
                continue;
            };
            if theme.id != theme_id && theme.base_preset.as_deref() != Some(theme_id) {
                continue;
            }

            let available = available_modes(&self.resolve_locked(&*store, &theme)?.document);
            let (kept, dropped): (Vec<String>, Vec<String>) = selection
                .theme_modes
                .drain(..)
                .partition(|mode| available.contains(mode));
            selection.theme_modes = kept;
            if dropped.is_empty() {
                continue;
            }

            warn!(
                owner = %selection.owner,
                theme = %theme.id,
                dropped = ?dropped,
                "dropped theme modes no longer offered"
            );
            selection.updated_at = Utc::now();
            store.put_selection(selection)?;
        }
        Ok(())
    }

    fn remove(&self, store: &mut S, guard: IntegrityGuard, existing: ConfigEntity) -> Result<ConfigEntity, CoreError> {
        let usage = store.usage(&existing.id)?;
        let errors = guard.before_delete(&existing, usage);
        if !errors.is_empty() {
            warn!(
                entity = %existing.id,
                derived = usage.derived,
                active_selections = usage.active_selections,
                "delete rejected"
            );
            return Err(CoreError::rejected(errors));
        }

        store.remove(&existing.id)?;
        self.cache.invalidate(&existing.id);
        info!(entity = %existing.id, name = %existing.name, "deleted entity");
        Ok(existing)
    }

    fn resolve_locked(&self, store: &S, entity: &ConfigEntity) -> Result<ResolvedConfig, CoreError> {
        let base = match entity.base_preset.as_deref() {
            Some(base_id) => Some(store.get(base_id)?.ok_or_else(|| CoreError::IntegrityCorruption {
                entity: entity.id.clone(),
                base: base_id.to_string(),
            })?),
            None => None,
        };

        let key = CacheKey::new(entity, base.as_ref());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let resolved = resolve(entity, base.as_ref())?;
        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReasonCode;
    use crate::fixtures::{template_document, theme_document};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn seeded() -> (Registry<MemoryStore>, ConfigEntity) {
        let registry = Registry::new(MemoryStore::new());
        let preset = registry
            .seed_preset(
                "preset-default",
                WriteRequest::standalone(DomainKind::Theme, theme_document("Default", "1.0.0")),
            )
            .unwrap();
        (registry, preset)
    }

    #[test]
    fn test_create_derived_and_resolve() {
        let (registry, preset) = seeded();
        let request = WriteRequest::derived(
            DomainKind::Theme,
            "Acme",
            "1.0.0",
            &preset.id,
            json!({"tokens": {"colors": {"primary": "#f00"}}}),
        );

        let entity = registry.create("acme", request).unwrap();
        assert_eq!(entity.owner.as_deref(), Some("acme"));
        assert!(!entity.is_preset);

        let resolved = registry.resolved_for("acme", &entity.id).unwrap();
        assert_eq!(resolved.document["tokens"]["colors"]["primary"], "#f00");
        assert_eq!(resolved.inheritance.as_ref().unwrap().override_leaf_count, 1);

        // Other tenants cannot see it
        let err = registry.resolved_for("globex", &entity.id).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn test_missing_base_is_not_found() {
        let (registry, _) = seeded();
        let request = WriteRequest::derived(DomainKind::Theme, "Acme", "1.0.0", "nope", json!({}));
        let err = registry.create("acme", request).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { what: "base preset", .. }));
    }

    #[test]
    fn test_standalone_identity_populated_from_meta() {
        let (registry, _) = seeded();
        let request = WriteRequest::standalone(DomainKind::Theme, theme_document("Acme", "1.2.0"));
        let entity = registry.create("acme", request).unwrap();
        assert_eq!(entity.name, "Acme");
        assert_eq!(entity.version, "1.2.0");
    }

    #[test]
    fn test_tenant_cannot_update_preset() {
        let (registry, preset) = seeded();
        let mut request = WriteRequest::standalone(DomainKind::Theme, theme_document("Default", "1.0.0"));
        request.is_preset = true;

        let err = registry.update("acme", &preset.id, request).unwrap_err();
        assert!(err.has_code(ReasonCode::PresetReadOnly));
    }

    #[test]
    fn test_update_cross_tenant_is_not_found() {
        let (registry, _) = seeded();
        let entity = registry
            .create(
                "acme",
                WriteRequest::standalone(DomainKind::Theme, theme_document("Acme", "1.0.0")),
            )
            .unwrap();

        let err = registry
            .update(
                "globex",
                &entity.id,
                WriteRequest::standalone(DomainKind::Theme, theme_document("Acme", "1.0.1")),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn test_update_invalidates_cache() {
        let (registry, preset) = seeded();
        let entity = registry
            .create(
                "acme",
                WriteRequest::derived(
                    DomainKind::Theme,
                    "Acme",
                    "1.0.0",
                    &preset.id,
                    json!({"tokens": {"colors": {"primary": "#f00"}}}),
                ),
            )
            .unwrap();
        registry.resolved(&entity.id).unwrap();

        // Same version, different content
        registry
            .update(
                "acme",
                &entity.id,
                WriteRequest::derived(
                    DomainKind::Theme,
                    "Acme",
                    "1.0.0",
                    &preset.id,
                    json!({"tokens": {"colors": {"primary": "#00f"}}}),
                ),
            )
            .unwrap();
        let resolved = registry.resolved(&entity.id).unwrap();
        assert_eq!(resolved.document["tokens"]["colors"]["primary"], "#00f");
    }

    #[test]
    fn test_delete_selected_preset_rejected() {
        let (registry, preset) = seeded();
        registry
            .select(TenantSelection::new("acme").with_theme(&preset.id))
            .unwrap();

        let err = registry.delete_preset(&preset.id).unwrap_err();
        assert!(err.has_code(ReasonCode::PresetInUse));
        assert!(registry.get(&preset.id).unwrap().is_some());
    }

    #[test]
    fn test_name_conflict_per_owner() {
        let (registry, _) = seeded();
        let doc = theme_document("Acme", "1.0.0");
        registry
            .create("acme", WriteRequest::standalone(DomainKind::Theme, doc.clone()))
            .unwrap();

        let err = registry
            .create("acme", WriteRequest::standalone(DomainKind::Theme, doc.clone()))
            .unwrap_err();
        assert!(err.has_code(ReasonCode::NameConflict));

        // Another tenant has its own namespace
        registry
            .create("globex", WriteRequest::standalone(DomainKind::Theme, doc))
            .unwrap();
    }

    #[test]
    fn test_select_and_summary() {
        let (registry, preset) = seeded();
        let template = registry
            .seed_preset(
                "preset-landing",
                WriteRequest::standalone(DomainKind::Template, template_document("Landing", "2.0.0")),
            )
            .unwrap();

        let err = registry
            .select(
                TenantSelection::new("acme")
                    .with_theme(&preset.id)
                    .with_modes(["sepia"]),
            )
            .unwrap_err();
        assert!(err.has_code(ReasonCode::UnknownMode));

        registry
            .select(
                TenantSelection::new("acme")
                    .with_theme(&preset.id)
                    .with_template(&template.id)
                    .with_modes(["dark"]),
            )
            .unwrap();

        let summary = registry.selection_summary("acme").unwrap().unwrap();
        assert_eq!(summary.name, "Default");
        assert_eq!(summary.selected_modes, vec!["dark".to_string()]);
        assert!(registry.selection_summary("globex").unwrap().is_none());
    }

    #[test]
    fn test_listing_order() {
        let (registry, _) = seeded();
        registry
            .seed_preset(
                "preset-aurora",
                WriteRequest::standalone(DomainKind::Theme, theme_document("Aurora", "1.0.0")),
            )
            .unwrap();
        registry
            .create(
                "acme",
                WriteRequest::standalone(DomainKind::Theme, theme_document("Acme", "1.0.0")),
            )
            .unwrap();
        registry
            .create(
                "globex",
                WriteRequest::standalone(DomainKind::Theme, theme_document("Globex", "1.0.0")),
            )
            .unwrap();

        let names: Vec<String> = registry
            .list_visible("acme", Some(DomainKind::Theme))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Aurora", "Default", "Acme"]);

        let presets = registry.list_presets(Some(DomainKind::Template)).unwrap();
        assert!(presets.is_empty());
    }
}
