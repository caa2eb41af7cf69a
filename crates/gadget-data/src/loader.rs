//! Resolution pipeline: reads scenario files, resolves name references,
//! and builds a ready-to-run simulation.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus [`build_simulation`] which turns a raw
//! [`ScenarioData`] into a wired [`Simulation`].

use crate::schema::ScenarioData;
use gadget_core::entity::Placement;
use gadget_core::registry::{Recipe, RegistryBuilder, RegistryError};
use gadget_core::simulation::{SetupError, Simulation, SimulationBuilder};
use gadget_core::worker::Worker;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while reading a scenario file.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// No scenario file with a supported extension was found.
    #[error("no scenario file '{base}' found in {dir}")]
    Missing { base: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while resolving a scenario into a simulation.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("duplicate icon name '{0}'")]
    DuplicateIcon(String),

    #[error("duplicate recipe name '{0}'")]
    DuplicateRecipe(String),

    #[error("unresolved icon reference '{name}' in {context}")]
    UnresolvedIcon { name: String, context: String },

    #[error("worker references unknown recipe '{0}'")]
    UnresolvedRecipe(String),

    #[error("worker group {group} out of range for a belt of length {length}")]
    GroupOutOfRange { group: usize, length: usize },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Setup(#[from] SetupError),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported scenario file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a scenario file with the given base name (without
/// extension).
///
/// Looks for `{base}.ron`, `{base}.toml`, and `{base}.json`. Returns
/// `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if multiple
/// formats exist for the same base name.
pub fn find_scenario_file(dir: &Path, base: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let extensions = ["ron", "toml", "json"];
    let mut found: Option<PathBuf> = None;

    for ext in &extensions {
        let candidate = dir.join(format!("{base}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_scenario_file`], but returns an error if no file is found.
pub fn require_scenario_file(dir: &Path, base: &str) -> Result<PathBuf, DataLoadError> {
    find_scenario_file(dir, base)?.ok_or_else(|| DataLoadError::Missing {
        base: base.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format (detected from
/// the extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    let parse_err = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string())),
    }
}

/// Load a scenario definition from a single file.
pub fn load_scenario(path: &Path) -> Result<ScenarioData, DataLoadError> {
    deserialize_file(path)
}

// ===========================================================================
// Resolution
// ===========================================================================

/// Resolve a raw scenario into a wired, ready-to-run simulation.
///
/// Registers icons and recipes (rejecting duplicates and dangling name
/// references), builds the registry, creates the workers, and assembles
/// the belt groups from each worker's `group` index in file order.
pub fn build_simulation(data: &ScenarioData, seed: u64) -> Result<Simulation, ScenarioError> {
    let mut registry_builder = RegistryBuilder::new();

    let mut seen_icons = HashSet::new();
    for icon in &data.icons {
        if !seen_icons.insert(icon.name.as_str()) {
            return Err(ScenarioError::DuplicateIcon(icon.name.clone()));
        }
        registry_builder.register_icon(&icon.name, &icon.glyph);
    }

    let resolve_icon = |builder: &RegistryBuilder, name: &str, context: &str| {
        builder
            .icon_id(name)
            .ok_or_else(|| ScenarioError::UnresolvedIcon {
                name: name.to_string(),
                context: context.to_string(),
            })
    };

    let mut seen_recipes = HashSet::new();
    for recipe in &data.recipes {
        if !seen_recipes.insert(recipe.name.as_str()) {
            return Err(ScenarioError::DuplicateRecipe(recipe.name.clone()));
        }
        let context = format!("recipe '{}'", recipe.name);
        let components = recipe
            .components
            .iter()
            .map(|name| resolve_icon(&registry_builder, name, &context))
            .collect::<Result<Vec<_>, _>>()?;
        let output = resolve_icon(&registry_builder, &recipe.output, &context)?;
        registry_builder.register_recipe(
            &recipe.name,
            Recipe {
                components,
                duration: recipe.duration,
                output,
            },
        );
    }

    for entry in &data.spawn_table {
        let icon = entry
            .icon
            .as_deref()
            .map(|name| resolve_icon(&registry_builder, name, "spawn table"))
            .transpose()?;
        registry_builder.push_spawn(icon, entry.weight);
    }

    let registry = registry_builder.build()?;

    // Resolve worker recipes before the registry moves into the builder.
    let mut resolved = Vec::with_capacity(data.workers.len());
    for worker in &data.workers {
        if worker.group >= data.conveyor.length {
            return Err(ScenarioError::GroupOutOfRange {
                group: worker.group,
                length: data.conveyor.length,
            });
        }
        let recipe = registry
            .recipe_id(&worker.recipe)
            .and_then(|id| registry.get_recipe(id))
            .ok_or_else(|| ScenarioError::UnresolvedRecipe(worker.recipe.clone()))?
            .recipe
            .clone();
        resolved.push((worker, recipe));
    }

    let mut builder = SimulationBuilder::new(registry);
    builder.seed(seed);
    builder.placement(Placement::new(data.conveyor.x, data.conveyor.y));

    let mut groups = vec![Vec::new(); data.conveyor.length];
    for (worker, recipe) in resolved {
        let id = builder.add_worker(Worker::new(
            worker.glyph.as_str(),
            recipe,
            Placement::new(worker.x, worker.y),
        ));
        groups[worker.group].push(id);
    }
    builder.belt(data.conveyor.length, groups);

    Ok(builder.build()?)
}

// ===========================================================================
// Tests
// ===========================================================================
