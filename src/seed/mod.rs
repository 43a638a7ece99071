//! Preset seeding
//!
//! The built-in preset set ships embedded in the binary. An optional
//! directory of `*.json` documents can add presets or replace built-in ones
//! by name. Seeding goes through the registry's privileged write path, so
//! presets get the same shape checks as everything else.
//!
//! Seeding is idempotent: preset ids are UUID v5 over kind and name, an
//! unchanged version is skipped, and a changed version (or `reset`)
//! replaces the stored document.

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::entity::meta_str;
use crate::error::CoreError;
use crate::registry::Registry;
use crate::store::EntityStore;
use preset_protocol::{DomainKind, WriteRequest};

/// Version of the built-in preset dataset
pub const DATASET_VERSION: u32 = 1;

/// Namespace for preset ids
const PRESET_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_9b3d_4c57_8e21_d0a9_53b7_c41f);

const BUILTIN: &[(DomainKind, &str, &str)] = &[
    (
        DomainKind::Theme,
        "themes/default.json",
        include_str!("../../presets/themes/default.json"),
    ),
    (
        DomainKind::Theme,
        "themes/dark.json",
        include_str!("../../presets/themes/dark.json"),
    ),
    (
        DomainKind::Theme,
        "themes/brand-light.json",
        include_str!("../../presets/themes/brand-light.json"),
    ),
    (
        DomainKind::Theme,
        "themes/brand-dark.json",
        include_str!("../../presets/themes/brand-dark.json"),
    ),
    (
        DomainKind::Template,
        "templates/modern-landing.json",
        include_str!("../../presets/templates/modern-landing.json"),
    ),
    (
        DomainKind::Template,
        "templates/professional-marketing.json",
        include_str!("../../presets/templates/professional-marketing.json"),
    ),
];

/// Seeding errors
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to walk preset directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid JSON in {source_name}: {error}")]
    Parse {
        source_name: String,
        error: serde_json::Error,
    },

    #[error("cannot tell whether {0} is a theme or a template")]
    UnknownKind(PathBuf),

    #[error("{0} has no meta.name")]
    MissingName(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// One preset document waiting to be seeded.
#[derive(Debug, Clone)]
pub struct SeedPreset {
    pub kind: DomainKind,
    pub document: Value,
    /// Where the document came from, for reporting
    pub source: String,
}

impl SeedPreset {
    pub fn name(&self) -> Option<&str> {
        meta_str(&self.document, "name")
    }

    pub fn version(&self) -> &str {
        meta_str(&self.document, "version").unwrap_or_default()
    }
}

/// Deterministic id for a preset.
pub fn preset_id(kind: DomainKind, name: &str) -> String {
    Uuid::new_v5(&PRESET_NAMESPACE, format!("{}:{}", kind, name).as_bytes()).to_string()
}

/// The embedded preset set.
pub fn builtin() -> Result<Vec<SeedPreset>, SeedError> {
    BUILTIN
        .iter()
        .map(|(kind, source, raw)| {
            let document = serde_json::from_str(raw).map_err(|error| SeedError::Parse {
                source_name: format!("builtin:{}", source),
                error,
            })?;
            Ok(SeedPreset {
                kind: *kind,
                document,
                source: format!("builtin:{}", source),
            })
        })
        .collect()
}

/// Load every `*.json` preset under `dir`, in file name order.
pub fn load_dir(dir: &Path) -> Result<Vec<SeedPreset>, SeedError> {
    let mut presets = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }

        let raw = fs::read_to_string(path)?;
        let document: Value = serde_json::from_str(&raw).map_err(|error| SeedError::Parse {
            source_name: path.display().to_string(),
            error,
        })?;
        let kind = infer_kind(path, &document).ok_or_else(|| SeedError::UnknownKind(path.to_path_buf()))?;

        presets.push(SeedPreset {
            kind,
            document,
            source: path.display().to_string(),
        });
    }

    Ok(presets)
}

/// Decide a document's kind from its sections, falling back to a
/// `themes/` or `templates/` parent directory.
pub fn infer_kind(path: &Path, document: &Value) -> Option<DomainKind> {
    if document.get("pages").is_some() {
        return Some(DomainKind::Template);
    }
    if document.get("tokens").is_some() {
        return Some(DomainKind::Theme);
    }

    let parent = path.parent()?.file_name()?.to_str()?;
    match parent {
        "themes" => Some(DomainKind::Theme),
        "templates" => Some(DomainKind::Template),
        _ => None,
    }
}

/// Overlay `extra` onto `base`; an extra preset replaces a base preset of
/// the same kind and name.
pub fn combine(base: Vec<SeedPreset>, extra: Vec<SeedPreset>) -> Vec<SeedPreset> {
    let mut combined = base;
    for preset in extra {
        let existing = combined
            .iter()
            .position(|p| p.kind == preset.kind && p.name() == preset.name());
        match existing {
            Some(index) => combined[index] = preset,
            None => combined.push(preset),
        }
    }
    combined
}

/// What seeding did with one preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedAction {
    Created,
    Updated,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedOutcome {
    pub id: String,
    pub kind: DomainKind,
    pub name: String,
    pub version: String,
    pub action: SeedAction,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    pub dataset_version: u32,
    pub outcomes: Vec<SeedOutcome>,
}

impl SeedReport {
    pub fn count(&self, action: SeedAction) -> usize {
        self.outcomes.iter().filter(|o| o.action == action).count()
    }
}

/// Apply presets through the privileged write path.
pub fn apply<S: EntityStore>(
    registry: &Registry<S>,
    presets: Vec<SeedPreset>,
    reset: bool,
) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport {
        dataset_version: DATASET_VERSION,
        outcomes: Vec::with_capacity(presets.len()),
    };

    for preset in presets {
        let name = preset
            .name()
            .ok_or_else(|| SeedError::MissingName(preset.source.clone()))?
            .to_string();
        let version = preset.version().to_string();
        let id = preset_id(preset.kind, &name);

        let action = match registry.get(&id)? {
            None => SeedAction::Created,
            Some(existing) if reset || existing.version != version => SeedAction::Updated,
            Some(_) => SeedAction::Skipped,
        };

        if action != SeedAction::Skipped {
            registry.seed_preset(&id, WriteRequest::standalone(preset.kind, preset.document))?;
        }

        info!(
            preset = %name,
            kind = %preset.kind,
            version = %version,
            action = ?action,
            "seeded preset"
        );
        report.outcomes.push(SeedOutcome {
            id,
            kind: preset.kind,
            name,
            version,
            action,
        });
    }

    Ok(report)
}
