//! Headless runner: loads the default scenario, drives it, prints worker
//! snapshots and the parts-bin tally, and verifies determinism.
//!
//! Run with: `cargo run --package gadget-demo [-- <steps> [<seed>]]`

use std::path::Path;

use gadget_core::driver::Driver;
use gadget_core::simulation::Simulation;
use gadget_data::{build_simulation, load_scenario};

const DEFAULT_STEPS: u32 = 100;
const DEFAULT_SEED: u64 = 42;

fn run(simulation: &mut Simulation, steps: u32) {
    let driver = Driver::new();
    let _ = driver.run_batch(simulation, steps);
}

fn print_state(simulation: &Simulation) {
    let belt = simulation.snapshot_belt();
    let cells: Vec<String> = belt
        .cells
        .iter()
        .map(|cell| match cell {
            Some(icon) => simulation.registry().glyph(*icon).to_string(),
            None => "·".to_string(),
        })
        .collect();
    println!("    belt: [{}]  bin: {} items", cells.join(" "), belt.bin_total);

    for snap in simulation.snapshot_workers() {
        let wishlist: Vec<&str> = snap
            .wishlist
            .iter()
            .map(|&icon| simulation.registry().glyph(icon))
            .collect();
        println!(
            "      [{}] {:?}, wants [{}], holding {}, completed {}",
            snap.glyph,
            snap.status,
            wishlist.join(" "),
            snap.inventory.len(),
            snap.completed,
        );
    }

    let tally: Vec<String> = simulation
        .bin_tally()
        .iter()
        .map(|(&icon, count)| format!("{}: {count}", simulation.registry().glyph(icon)))
        .collect();
    println!("    tally: {{{}}}", tally.join(", "));
}

fn main() {
    let mut args = std::env::args().skip(1);
    let steps: u32 = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or(DEFAULT_STEPS);
    let seed: u64 = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or(DEFAULT_SEED);

    let scenario_path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data/default.ron"));
    let data = load_scenario(scenario_path).unwrap_or_else(|e| {
        eprintln!("failed to load scenario: {e}");
        std::process::exit(1);
    });

    println!("=== Gadget Grind ===");
    println!(
        "belt length {}, {} workers, {} steps, seed {seed}\n",
        data.conveyor.length,
        data.workers.len(),
        steps
    );

    // Run 1
    let mut sim1 = build_simulation(&data, seed).unwrap_or_else(|e| {
        eprintln!("failed to build simulation: {e}");
        std::process::exit(1);
    });
    run(&mut sim1, steps);

    println!("--- after {steps} steps ---");
    print_state(&sim1);

    // Run 2 -- determinism check
    let mut sim2 = build_simulation(&data, seed).unwrap_or_else(|e| {
        eprintln!("failed to build simulation (run 2): {e}");
        std::process::exit(1);
    });
    run(&mut sim2, steps);

    if sim1.bin_tally() == sim2.bin_tally() && sim1.snapshot_belt() == sim2.snapshot_belt() {
        println!("\nDeterminism: PASS (runs match)");
    } else {
        println!("\nDeterminism: FAIL! runs diverged");
        std::process::exit(1);
    }
}
