//! Immutable definitions: icons, recipes, and the belt spawn table.
//!
//! Built once at startup through [`RegistryBuilder`] and frozen. The
//! registry validates cross-references (recipes and spawn entries may only
//! name registered icons) before freezing.

use crate::id::{IconId, RecipeId, Ticks};
use std::collections::HashMap;

/// An icon definition: a stable name plus the display glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconDef {
    pub name: String,
    /// Display string, e.g. an emoji.
    pub glyph: String,
}

/// What a worker needs and produces. The runtime value cloned into workers.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Recipe {
    /// Required component icons. Duplicates mean the recipe needs that
    /// icon more than once.
    pub components: Vec<IconId>,
    /// Ticks of work after the last component arrives.
    pub duration: Ticks,
    /// Icon of the finished product.
    pub output: IconId,
}

/// A named recipe in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDef {
    pub name: String,
    pub recipe: Recipe,
}

/// One weighted entry in the belt spawn table. `icon: None` is the
/// "spawn nothing" option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SpawnEntry {
    pub icon: Option<IconId>,
    pub weight: u32,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing an immutable [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    icons: Vec<IconDef>,
    icon_name_to_id: HashMap<String, IconId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    spawn_table: Vec<SpawnEntry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an icon. Returns its ID.
    pub fn register_icon(&mut self, name: &str, glyph: &str) -> IconId {
        let id = IconId(self.icons.len() as u32);
        self.icons.push(IconDef {
            name: name.to_string(),
            glyph: glyph.to_string(),
        });
        self.icon_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Register a recipe. Returns its ID.
    pub fn register_recipe(&mut self, name: &str, recipe: Recipe) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipes.push(RecipeDef {
            name: name.to_string(),
            recipe,
        });
        self.recipe_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Append a weighted entry to the spawn table.
    pub fn push_spawn(&mut self, icon: Option<IconId>, weight: u32) {
        self.spawn_table.push(SpawnEntry { icon, weight });
    }

    /// Lookup an icon ID by name.
    pub fn icon_id(&self, name: &str) -> Option<IconId> {
        self.icon_name_to_id.get(name).copied()
    }

    /// Lookup a recipe ID by name.
    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    /// Validate cross-references and freeze the registry.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let icon_count = self.icons.len();
        let valid = |id: IconId| (id.0 as usize) < icon_count;

        for def in &self.recipes {
            if def.recipe.components.is_empty() {
                return Err(RegistryError::EmptyRecipe(def.name.clone()));
            }
            if def.recipe.duration == 0 {
                return Err(RegistryError::ZeroDuration(def.name.clone()));
            }
            for &icon in def
                .recipe
                .components
                .iter()
                .chain(std::iter::once(&def.recipe.output))
            {
                if !valid(icon) {
                    return Err(RegistryError::InvalidIconRef(icon));
                }
            }
        }

        for entry in &self.spawn_table {
            if let Some(icon) = entry.icon
                && !valid(icon)
            {
                return Err(RegistryError::InvalidIconRef(icon));
            }
        }

        Ok(Registry {
            icons: self.icons,
            icon_name_to_id: self.icon_name_to_id,
            recipes: self.recipes,
            recipe_name_to_id: self.recipe_name_to_id,
            spawn_table: self.spawn_table,
        })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable registry. Frozen after `build()`.
#[derive(Debug)]
pub struct Registry {
    icons: Vec<IconDef>,
    icon_name_to_id: HashMap<String, IconId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    spawn_table: Vec<SpawnEntry>,
}

impl Registry {
    pub fn get_icon(&self, id: IconId) -> Option<&IconDef> {
        self.icons.get(id.0 as usize)
    }

    pub fn get_recipe(&self, id: RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id.0 as usize)
    }

    pub fn icon_id(&self, name: &str) -> Option<IconId> {
        self.icon_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    /// Display glyph for an icon, or `"?"` for an unknown ID.
    pub fn glyph(&self, id: IconId) -> &str {
        self.get_icon(id).map(|def| def.glyph.as_str()).unwrap_or("?")
    }

    /// The weighted spawn table, in registration order.
    pub fn spawn_table(&self) -> &[SpawnEntry] {
        &self.spawn_table
    }

    pub fn icon_count(&self) -> usize {
        self.icons.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid icon reference: {0:?}")]
    InvalidIconRef(IconId),
    #[error("recipe '{0}' has no components")]
    EmptyRecipe(String),
    #[error("recipe '{0}' has zero duration")]
    ZeroDuration(String),
}

// ===========================================================================
// Tests
// ===========================================================================
