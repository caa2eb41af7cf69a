//! The worker assembly state machine.
//!
//! A worker cycles through `ready -> making -> complete -> ready`:
//!
//! - **ready**: the wishlist holds every icon the recipe still needs.
//!   Offered assemblies whose icon is on the wishlist are accepted into the
//!   inventory; the moment the wishlist empties, the worker starts making.
//! - **making**: each `step` increments the work counter. When it reaches
//!   the recipe duration the worker builds the output assembly, absorbs the
//!   inventory into it, and pushes it onto the completed queue.
//! - **complete**: holds a finished product until the conveyor collects it
//!   via [`Worker::grab_product`], which resets the wishlist and returns
//!   the worker to ready.
//!
//! Unwanted offers and empty grabs are ordinary outcomes, not errors: the
//! offer hands the assembly back, the grab returns `None`.

use crate::assembly::Assembly;
use crate::entity::{EntityCore, Placement};
use crate::id::{IconId, Ticks};
use crate::registry::Recipe;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Where the worker is in its assembly cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WorkerStatus {
    /// Accepting pull offers; wishlist is non-empty.
    #[default]
    Ready,
    /// All components collected; counting down the recipe duration.
    Making,
    /// Holding a finished product, waiting for pickup.
    Complete,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of offering an assembly to a worker.
///
/// A declined offer returns the assembly to the caller -- the component
/// never changes owner unless it was accepted.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a declined offer hands the assembly back to the caller"]
pub enum PullOutcome {
    /// The worker took the assembly into its inventory.
    Accepted,
    /// The icon was not on the wishlist (or the wishlist was empty).
    Declined(Assembly),
}

/// What happened during one `step` of the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStepResult {
    /// Icon of a product finished this tick, if any.
    pub finished: Option<IconId>,
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// A stateful entity that collects assemblies matching its recipe and
/// produces a finished assembly after a fixed number of ticks.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Worker {
    pub core: EntityCore,
    /// Display glyph for this worker (decorative only).
    pub glyph: String,
    recipe: Recipe,
    status: WorkerStatus,
    /// Icons the recipe still needs. Always disjoint-exhaustive with the
    /// inventory against the recipe's component multiset.
    wishlist: Vec<IconId>,
    /// Components collected so far, in acceptance order.
    inventory: Vec<Assembly>,
    /// Finished products awaiting pickup, oldest first. Holds at most one
    /// under the driven flow.
    completed: Vec<Assembly>,
    /// Elapsed ticks while making.
    work_count: Ticks,
}

impl Worker {
    /// Create a ready worker with a full wishlist.
    pub fn new(glyph: impl Into<String>, recipe: Recipe, placement: Placement) -> Self {
        let wishlist = recipe.components.clone();
        Self {
            core: EntityCore::new(placement),
            glyph: glyph.into(),
            recipe,
            status: WorkerStatus::Ready,
            wishlist,
            inventory: Vec::new(),
            completed: Vec::new(),
            work_count: 0,
        }
    }

    pub fn status(&self) -> WorkerStatus {
        self.status
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    /// Icons still needed before making can start.
    pub fn wishlist(&self) -> &[IconId] {
        &self.wishlist
    }

    /// Components collected so far.
    pub fn inventory(&self) -> &[Assembly] {
        &self.inventory
    }

    /// Elapsed ticks in the current making cycle.
    pub fn work_count(&self) -> Ticks {
        self.work_count
    }

    /// Finished products awaiting pickup.
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Whether the given icon is currently on the wishlist.
    pub fn wants(&self, icon: IconId) -> bool {
        self.wishlist.contains(&icon)
    }

    /// Offer an assembly to this worker.
    ///
    /// Accepted only if the wishlist contains the assembly's icon; one
    /// wishlist entry is consumed per acceptance (a recipe needing the same
    /// icon twice accepts it twice). Accepting the final wanted component
    /// starts the making cycle.
    pub fn offer(&mut self, assembly: Assembly) -> PullOutcome {
        if self.wishlist.is_empty() {
            return PullOutcome::Declined(assembly);
        }
        let Some(index) = self.wishlist.iter().position(|&icon| icon == assembly.icon) else {
            return PullOutcome::Declined(assembly);
        };

        self.wishlist.remove(index);
        self.inventory.push(assembly);

        if self.wishlist.is_empty() {
            self.status = WorkerStatus::Making;
            self.work_count = 0;
        }
        PullOutcome::Accepted
    }

    /// Advance the worker by one simulation tick.
    ///
    /// Only the making state reacts: the work counter increments, and on
    /// reaching the recipe duration the product is finished.
    pub fn step(&mut self) -> WorkerStepResult {
        let mut result = WorkerStepResult::default();
        if self.status == WorkerStatus::Making {
            self.work_count += 1;
            if self.work_count == self.recipe.duration {
                self.finish_product();
                result.finished = Some(self.recipe.output);
            }
        }
        result
    }

    /// Build the output assembly, absorbing the collected components.
    fn finish_product(&mut self) {
        let parts = std::mem::take(&mut self.inventory);
        let product = Assembly::from_parts(self.recipe.output, parts);
        self.completed.push(product);
        self.status = WorkerStatus::Complete;
    }

    /// Take the most recent finished product, resetting the worker to ready
    /// with a full wishlist. Returns `None` (and changes nothing) when no
    /// product is completed.
    pub fn grab_product(&mut self) -> Option<Assembly> {
        let product = self.completed.pop()?;
        self.status = WorkerStatus::Ready;
        self.wishlist = self.recipe.components.clone();
        self.work_count = 0;
        Some(product)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
