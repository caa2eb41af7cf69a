//! Gadget Core -- the simulation engine for the Gadget Grind conveyor line.
//!
//! This crate provides the message bus, worker state machines, rotating
//! conveyor belt, parts bin, observation events, and deterministic RNG that
//! the Gadget Grind front-ends depend on.
//!
//! # Two-Phase Tick
//!
//! Each call to [`simulation::Simulation::step`] advances the line by one
//! tick through the following phases:
//!
//! 1. **Broadcast** -- the `step` message is delivered to every subscriber in
//!    subscription order: the conveyor rotates its belt (depositing the last
//!    cell into the parts bin) and spawns a weighted-random component into
//!    the fresh front cell; each worker advances its assembly state machine.
//! 2. **Match** -- cell by cell, occupied cells offer their component to the
//!    first ready worker in the cell's group whose wishlist wants it, and
//!    empty cells collect a finished product from the first complete worker.
//! 3. **Observe** -- buffered observation events (spawns, hand-offs,
//!    completions, tally updates) are delivered to passive listeners.
//!
//! # Key Types
//!
//! - [`simulation::Simulation`] -- owns the entities and runs the tick.
//! - [`messenger::Messenger`] -- ordered pub/sub registry for the `step` and
//!   `pull-request` protocol.
//! - [`worker::Worker`] -- ready/making/complete assembly state machine.
//! - [`conveyor::Conveyor`] -- rotating belt, worker groups, parts bin.
//! - [`registry::Registry`] -- immutable icon, recipe, and spawn-table
//!   definitions (frozen at startup).
//! - [`driver::Driver`] -- external single-step / batch-step trigger.
//! - [`rng::SimRng`] -- deterministic SplitMix64 PRNG for spawn choices.

pub mod assembly;
pub mod conveyor;
pub mod driver;
pub mod entity;
pub mod event;
pub mod id;
pub mod messenger;
pub mod registry;
pub mod rng;
pub mod simulation;
pub mod snapshot;
pub mod worker;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
