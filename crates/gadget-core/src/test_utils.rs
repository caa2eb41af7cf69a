//! Shared helpers for tests and examples.
//!
//! Builds the stock Gadget Grind scenario: rosette and burger components,
//! a fax-machine recipe, and the three-entry spawn table (rosette, burger,
//! or nothing -- equal weights).

use crate::entity::Placement;
use crate::id::{IconId, WorkerId};
use crate::registry::{Recipe, Registry, RegistryBuilder};
use crate::simulation::{Simulation, SimulationBuilder};
use crate::worker::Worker;

/// Icon ID of the rosette component in [`demo_registry`].
pub fn rosette() -> IconId {
    IconId(0)
}

/// Icon ID of the burger component in [`demo_registry`].
pub fn burger() -> IconId {
    IconId(1)
}

/// Icon ID of the fax-machine product in [`demo_registry`].
pub fn fax() -> IconId {
    IconId(2)
}

/// The stock registry: rosette/burger/fax icons, the fax-machine recipe
/// (both components, duration 4), and the equal-weight spawn table.
pub fn demo_registry() -> Registry {
    let mut b = RegistryBuilder::new();
    let rosette = b.register_icon("rosette", "\u{1F3F5}");
    let burger = b.register_icon("burger", "\u{1F354}");
    let fax = b.register_icon("fax", "\u{1F4E0}");
    b.register_recipe(
        "fax_machine",
        Recipe {
            components: vec![rosette, burger],
            duration: 4,
            output: fax,
        },
    );
    b.push_spawn(Some(rosette), 1);
    b.push_spawn(Some(burger), 1);
    b.push_spawn(None, 1);
    b.build().expect("demo registry is valid")
}

/// The stock fax-machine recipe.
pub fn fax_recipe() -> Recipe {
    Recipe {
        components: vec![rosette(), burger()],
        duration: 4,
        output: fax(),
    }
}

/// A ready worker on the stock recipe.
pub fn demo_worker(glyph: &str) -> Worker {
    Worker::new(glyph, fax_recipe(), Placement::default())
}

/// A simulation with a belt of `length` cells and one stock worker per
/// cell group. Returns the worker IDs in group order.
pub fn demo_simulation(length: usize, seed: u64) -> (Simulation, Vec<WorkerId>) {
    let mut builder = SimulationBuilder::new(demo_registry());
    let mut ids = Vec::with_capacity(length);
    let mut groups = Vec::with_capacity(length);
    for index in 0..length {
        let id = builder.add_worker(demo_worker(&format!("w{index}")));
        ids.push(id);
        groups.push(vec![id]);
    }
    builder.belt(length, groups);
    builder.seed(seed);
    let simulation = builder.build().expect("demo layout is valid");
    (simulation, ids)
}
