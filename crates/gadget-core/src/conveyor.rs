//! The rotating belt, its worker groups, and the parts bin.
//!
//! The belt is a fixed-size ordered run of cells, each holding at most one
//! assembly. One rotation moves the last cell's contents into the parts bin
//! and wraps the emptied cell around to the front, where a weighted-random
//! spawn may place a fresh component.
//!
//! Each cell position is paired with a static group of workers, fixed at
//! construction. Matching cells against their groups is coordinated by
//! [`crate::simulation::Simulation`], which owns the workers; this module
//! owns the belt state itself.

use crate::assembly::{Assembly, PartsBin};
use crate::entity::{EntityCore, Placement};
use crate::id::{IconId, WorkerId};
use crate::registry::SpawnEntry;
use crate::rng::SimRng;
use std::collections::VecDeque;

/// What one belt rotation did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationOutcome {
    /// Icon deposited into the parts bin off the end of the belt, if any.
    pub binned: Option<IconId>,
    /// Icon spawned into the fresh front cell, if any.
    pub spawned: Option<IconId>,
}

/// The conveyor belt: rotating cells, static worker groups, and the bin.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Conveyor {
    pub core: EntityCore,
    /// Belt cells, front first. At most one assembly per cell.
    cells: VecDeque<Option<Assembly>>,
    /// Workers allowed to pull from / deposit to each cell position.
    /// Index-aligned with `cells`; fixed at construction.
    groups: Vec<Vec<WorkerId>>,
    bin: PartsBin,
    /// Rotation counter, wrapping at the belt length.
    rotation_index: usize,
}

impl Conveyor {
    /// Upper bound for the configurable belt length.
    pub const MAX_LENGTH: usize = 10;

    /// Create a belt of `length` empty cells with one worker group per cell.
    ///
    /// `groups[i]` lists the workers paired with cell position `i`, in the
    /// order they are considered during matching. Empty groups are allowed
    /// (that cell is simply never matched).
    pub fn new(
        length: usize,
        groups: Vec<Vec<WorkerId>>,
        placement: Placement,
    ) -> Result<Self, ConveyorError> {
        if length == 0 || length > Self::MAX_LENGTH {
            return Err(ConveyorError::LengthOutOfRange {
                length,
                max: Self::MAX_LENGTH,
            });
        }
        if groups.len() != length {
            return Err(ConveyorError::GroupCountMismatch {
                groups: groups.len(),
                length,
            });
        }
        Ok(Self {
            core: EntityCore::new(placement),
            cells: (0..length).map(|_| None).collect(),
            groups,
            bin: PartsBin::new(),
            rotation_index: 0,
        })
    }

    /// Number of cells on the belt. Constant for the conveyor's lifetime.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Belt cells can never be zero-length; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Icon of the assembly at cell `index`, if occupied.
    pub fn cell_icon(&self, index: usize) -> Option<IconId> {
        self.cells.get(index).and_then(|c| c.as_ref()).map(|a| a.icon)
    }

    /// Take the assembly out of cell `index`, leaving it empty.
    pub fn take_cell(&mut self, index: usize) -> Option<Assembly> {
        self.cells.get_mut(index).and_then(Option::take)
    }

    /// Place an assembly into cell `index`. Returns the assembly back if the
    /// cell is occupied or the index is out of range (at most one assembly
    /// per cell).
    #[must_use = "a rejected assembly is handed back to the caller"]
    pub fn place(&mut self, index: usize, assembly: Assembly) -> Option<Assembly> {
        match self.cells.get_mut(index) {
            Some(cell @ None) => {
                *cell = Some(assembly);
                None
            }
            _ => Some(assembly),
        }
    }

    /// The worker group paired with cell position `index`.
    pub fn group(&self, index: usize) -> &[WorkerId] {
        self.groups.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The parts bin at the end of the belt.
    pub fn bin(&self) -> &PartsBin {
        &self.bin
    }

    /// Rotation counter, wrapping at the belt length.
    pub fn rotation_index(&self) -> usize {
        self.rotation_index
    }

    /// Phase 1 of a tick: deposit the last cell into the bin, wrap the
    /// emptied cell to the front, and roll the spawn table for a fresh
    /// component.
    ///
    /// The spawn choice is weight-proportional over `spawn_table`; entries
    /// with `icon: None` leave the cell empty. An empty (or all-zero-weight)
    /// table never spawns.
    pub fn rotate_and_spawn(
        &mut self,
        rng: &mut SimRng,
        spawn_table: &[SpawnEntry],
    ) -> RotationOutcome {
        let mut outcome = RotationOutcome::default();

        let last = self.cells.pop_back().unwrap_or(None);
        if let Some(assembly) = last {
            outcome.binned = Some(assembly.icon);
            self.bin.deposit(assembly);
        }

        let weights: Vec<u32> = spawn_table.iter().map(|e| e.weight).collect();
        outcome.spawned = rng
            .pick_weighted(&weights)
            .and_then(|index| spawn_table[index].icon);
        self.cells.push_front(outcome.spawned.map(Assembly::new));

        self.rotation_index = (self.rotation_index + 1) % self.cells.len();
        outcome
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConveyorError {
    #[error("belt length {length} out of range (1..={max})")]
    LengthOutOfRange { length: usize, max: usize },
    #[error("{groups} worker groups supplied for a belt of length {length}")]
    GroupCountMismatch { groups: usize, length: usize },
}

// ===========================================================================
// Tests
// ===========================================================================
