//! Serde data file structs for scenario definitions.
//!
//! These structs define the on-disk format for icons, recipes, the spawn
//! table, and the line layout. They are deserialized from RON, JSON, or
//! TOML files and then resolved into engine types by the loader.

use serde::Deserialize;

/// A complete scenario definition: everything needed to build a simulation.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioData {
    pub icons: Vec<IconData>,
    pub recipes: Vec<RecipeData>,
    #[serde(default)]
    pub spawn_table: Vec<SpawnData>,
    pub conveyor: ConveyorData,
    #[serde(default)]
    pub workers: Vec<WorkerData>,
}

/// An icon definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct IconData {
    pub name: String,
    pub glyph: String,
}

/// A recipe definition. Components and output reference icons by name.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    pub components: Vec<String>,
    pub duration: u64,
    pub output: String,
}

/// A weighted spawn-table entry. A missing/`None` icon is the
/// "spawn nothing" option.
#[derive(Debug, Clone, Deserialize)]
pub struct SpawnData {
    #[serde(default)]
    pub icon: Option<String>,
    pub weight: u32,
}

/// The belt layout.
#[derive(Debug, Clone, Deserialize)]
pub struct ConveyorData {
    pub length: usize,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

/// A worker definition. `group` is the belt cell position the worker is
/// paired with; workers sharing a group are matched in file order.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerData {
    pub glyph: String,
    pub recipe: String,
    pub group: usize,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}
