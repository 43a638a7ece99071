//! Preset Overlay CLI
//!
//! Entry point for the `preset-overlay` command-line tool. Every command
//! prints JSON to stdout and exits 1 on rejection or failure.

use clap::{Parser, Subcommand};
use preset_overlay::registry::Registry;
use preset_overlay::seed::{self, SeedError};
use preset_overlay::settings::{host_config_path, ConfigError, PROJECT_CONFIG_FILE};
use preset_overlay::{
    diff, merge, schema, CoreError, DomainKind, EffectiveSettings, MemoryStore, ResolveCache,
    Settings, StoreError, TenantSelection, WriteRequest,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "preset-overlay")]
#[command(about = "Immutable presets with tenant overrides", version)]
struct Cli {
    /// Project config file (default: preset-overlay.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Store snapshot path (overrides store.path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (overrides log.level)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a standalone document
    Validate {
        /// Document file (JSON)
        file: PathBuf,

        /// Document kind (theme, template)
        #[arg(long, short = 'k')]
        kind: DomainKind,

        /// Output violations as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Merge an override fragment over a base document
    Merge { base: PathBuf, overlay: PathBuf },

    /// Compute the minimal fragment turning base into modified
    Diff { base: PathBuf, modified: PathBuf },

    /// Seed the built-in presets
    Seed {
        /// Extra preset directory (overrides seed.dir)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Rewrite every preset even when its version is unchanged
        #[arg(long)]
        reset: bool,
    },

    /// Print the resolved document for an entity
    Resolve {
        id: String,

        /// Resolve on behalf of this tenant
        #[arg(long)]
        owner: Option<String>,
    },

    /// Create or update a tenant entity from a write request
    Write {
        /// Write request file (JSON)
        request: PathBuf,

        #[arg(long)]
        owner: String,

        /// Update this entity instead of creating one
        #[arg(long)]
        entity: Option<String>,
    },

    /// Delete an entity; without --owner, delete a preset
    Delete {
        id: String,

        #[arg(long)]
        owner: Option<String>,
    },

    /// Set a tenant's active theme and template
    Select {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        theme: Option<String>,

        #[arg(long)]
        template: Option<String>,

        /// Theme mode to enable (repeatable)
        #[arg(long = "mode")]
        modes: Vec<String>,
    },

    /// List presets, or everything visible to a tenant
    List {
        #[arg(long)]
        owner: Option<String>,

        #[arg(long, short = 'k')]
        kind: Option<DomainKind>,
    },

    /// Show the effective settings and their sources
    Settings,
}

/// CLI failures
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{path}: {message}")]
    Input { path: PathBuf, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document is invalid")]
    Invalid,
}

fn main() {
    let cli = Cli::parse();

    let effective = match load_settings(&cli) {
        Ok(effective) => effective,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            process::exit(1);
        }
    };
    let settings = effective.settings();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("preset_overlay={}", settings.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!(sources = effective.sources.len(), "settings loaded");

    let result = match cli.command {
        Commands::Validate { file, kind, json } => run_validate(&file, kind, json),
        Commands::Merge { base, overlay } => run_pure(&base, &overlay, merge),
        Commands::Diff { base, modified } => run_pure(&base, &modified, diff),
        Commands::Seed { dir, reset } => run_seed(&settings, dir, reset),
        Commands::Resolve { id, owner } => run_resolve(&settings, &id, owner.as_deref()),
        Commands::Write {
            request,
            owner,
            entity,
        } => run_write(&settings, &request, &owner, entity.as_deref()),
        Commands::Delete { id, owner } => run_delete(&settings, &id, owner.as_deref()),
        Commands::Select {
            owner,
            theme,
            template,
            modes,
        } => run_select(&settings, owner, theme, template, modes),
        Commands::List { owner, kind } => run_list(&settings, owner.as_deref(), kind),
        Commands::Settings => print_json(&effective),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(CliError::Invalid) => process::exit(1),
        Err(CliError::Core(e)) => {
            // Rejections are part of the JSON contract
            let _ = print_json(&e.to_payload());
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn load_settings(cli: &Cli) -> Result<EffectiveSettings, ConfigError> {
    let host = host_config_path();
    let project = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));

    let mut overrides = serde_json::Map::new();
    if let Some(store) = &cli.store {
        overrides.insert("store".to_string(), json!({"path": store.to_string_lossy()}));
    }
    if let Some(level) = &cli.log_level {
        overrides.insert("log".to_string(), json!({"level": level}));
    }
    let cli_layer = (!overrides.is_empty()).then(|| Value::Object(overrides));

    EffectiveSettings::build(host.as_deref(), Some(project.as_path()), cli_layer)
}

fn open_registry(settings: &Settings) -> Result<Registry<MemoryStore>, CliError> {
    let store = MemoryStore::load(&settings.store_path)?;
    let cache = if settings.cache_enabled {
        ResolveCache::new(settings.cache_capacity)
    } else {
        ResolveCache::disabled()
    };
    Ok(Registry::with_cache(store, cache))
}

fn save_registry(settings: &Settings, registry: Registry<MemoryStore>) -> Result<(), CliError> {
    registry.into_store()?.save(&settings.store_path)?;
    Ok(())
}

fn read_json(path: &Path) -> Result<Value, CliError> {
    let contents = fs::read_to_string(path).map_err(|e| CliError::Input {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| CliError::Input {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_validate(file: &Path, kind: DomainKind, json_output: bool) -> Result<(), CliError> {
    let document = read_json(file)?;
    let violations = schema::validate(&document, kind);

    if json_output {
        print_json(&json!({
            "kind": kind,
            "valid": violations.is_empty(),
            "violations": violations,
        }))?;
    } else {
        println!("{}", schema::summary(&document, kind));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(CliError::Invalid)
    }
}

fn run_pure(a: &Path, b: &Path, op: impl Fn(&Value, &Value) -> Value) -> Result<(), CliError> {
    let left = read_json(a)?;
    let right = read_json(b)?;
    print_json(&op(&left, &right))
}

fn run_seed(settings: &Settings, dir: Option<PathBuf>, reset: bool) -> Result<(), CliError> {
    let registry = open_registry(settings)?;

    let mut presets = seed::builtin()?;
    if let Some(dir) = dir.or_else(|| settings.seed_dir.clone()) {
        presets = seed::combine(presets, seed::load_dir(&dir)?);
    }

    let report = seed::apply(&registry, presets, reset)?;
    save_registry(settings, registry)?;
    print_json(&report)
}

fn run_resolve(settings: &Settings, id: &str, owner: Option<&str>) -> Result<(), CliError> {
    let registry = open_registry(settings)?;
    let resolved = match owner {
        Some(owner) => registry.resolved_for(owner, id)?,
        None => registry.resolved(id)?,
    };
    print_json(&resolved.to_response())
}

fn run_write(settings: &Settings, request: &Path, owner: &str, entity: Option<&str>) -> Result<(), CliError> {
    let request: WriteRequest = serde_json::from_value(read_json(request)?)?;
    let registry = open_registry(settings)?;

    let saved = match entity {
        Some(id) => registry.update(owner, id, request)?,
        None => registry.create(owner, request)?,
    };
    save_registry(settings, registry)?;
    print_json(&saved)
}

fn run_delete(settings: &Settings, id: &str, owner: Option<&str>) -> Result<(), CliError> {
    let registry = open_registry(settings)?;
    let deleted = match owner {
        Some(owner) => registry.delete(owner, id)?,
        None => registry.delete_preset(id)?,
    };
    save_registry(settings, registry)?;
    print_json(&json!({"deleted": deleted.id, "name": deleted.name}))
}

fn run_select(
    settings: &Settings,
    owner: String,
    theme: Option<String>,
    template: Option<String>,
    modes: Vec<String>,
) -> Result<(), CliError> {
    let registry = open_registry(settings)?;

    let mut selection = TenantSelection::new(owner).with_modes(modes);
    selection.theme = theme;
    selection.template = template;

    let saved = registry.select(selection)?;
    let summary = registry.selection_summary(&saved.owner)?;
    save_registry(settings, registry)?;
    print_json(&json!({"selection": saved, "theme": summary}))
}

fn run_list(settings: &Settings, owner: Option<&str>, kind: Option<DomainKind>) -> Result<(), CliError> {
    let registry = open_registry(settings)?;
    let entities = match owner {
        Some(owner) => registry.list_visible(owner, kind)?,
        None => registry.list_presets(kind)?,
    };

    let rows: Vec<Value> = entities
        .iter()
        .map(|e| {
            json!({
                "id": e.id,
                "kind": e.kind,
                "name": e.name,
                "version": e.version,
                "isPreset": e.is_preset,
                "basePreset": e.base_preset,
            })
        })
        .collect();
    print_json(&rows)
}
