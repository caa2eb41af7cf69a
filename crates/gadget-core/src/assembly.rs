//! Assemblies and the parts bin.
//!
//! An [`Assembly`] is a component or finished product identified by an icon.
//! Assemblies are owned values: a given assembly lives in exactly one place
//! at a time -- a belt cell, a worker's inventory, a worker's completed
//! queue, nested inside a finished product, or the [`PartsBin`]. Ownership
//! transfers are moves, never shared references.

use crate::id::IconId;
use std::collections::BTreeMap;

/// A single component or finished product on the line.
///
/// A raw component has no parts. A finished product carries the component
/// assemblies that were consumed to build it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Assembly {
    /// The icon identifying this assembly's kind.
    pub icon: IconId,
    /// Component assemblies absorbed into this one when it was produced.
    #[serde(default)]
    parts: Vec<Assembly>,
}

impl Assembly {
    /// Create a raw component assembly.
    pub fn new(icon: IconId) -> Self {
        Self {
            icon,
            parts: Vec::new(),
        }
    }

    /// Create a finished product that absorbs the given component assemblies.
    pub fn from_parts(icon: IconId, parts: Vec<Assembly>) -> Self {
        Self { icon, parts }
    }

    /// The component assemblies this product was built from.
    pub fn parts(&self) -> &[Assembly] {
        &self.parts
    }
}

/// Terminal collection of assemblies removed from the end of the belt.
///
/// Keeps a per-icon tally alongside the items themselves. Iteration order of
/// the tally is deterministic (sorted by icon).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PartsBin {
    items: Vec<Assembly>,
    tally: BTreeMap<IconId, u32>,
}

impl PartsBin {
    /// Create an empty bin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposit an assembly into the bin, updating the tally.
    pub fn deposit(&mut self, assembly: Assembly) {
        *self.tally.entry(assembly.icon).or_insert(0) += 1;
        self.items.push(assembly);
    }

    /// Number of assemblies in the bin.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the bin is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count of a specific icon in the bin.
    pub fn count(&self, icon: IconId) -> u32 {
        self.tally.get(&icon).copied().unwrap_or(0)
    }

    /// Per-icon counts, sorted by icon.
    pub fn tally(&self) -> &BTreeMap<IconId, u32> {
        &self.tally
    }

    /// The deposited assemblies, oldest first.
    pub fn items(&self) -> &[Assembly] {
        &self.items
    }
}
