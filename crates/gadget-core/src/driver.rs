//! External trigger that advances the simulation.
//!
//! The driver issues `step` broadcasts: one at a time, or a bounded batch
//! with optional fixed pacing between steps. Pacing is purely
//! presentational (it lets a human watch the belt move); `None` runs the
//! batch back-to-back. A batch cannot be interrupted mid-sequence.

use crate::simulation::{Simulation, StepReport};
use std::time::Duration;

/// Issues `step` broadcasts on demand.
#[derive(Debug, Clone, Copy, Default)]
pub struct Driver {
    pace: Option<Duration>,
}

impl Driver {
    /// A driver that runs batches back-to-back.
    pub fn new() -> Self {
        Self::default()
    }

    /// A driver that sleeps `pace` between batched steps.
    pub fn with_pace(pace: Duration) -> Self {
        Self { pace: Some(pace) }
    }

    /// Broadcast a single `step`.
    pub fn step_once(&self, simulation: &mut Simulation) -> StepReport {
        simulation.step()
    }

    /// Broadcast `steps` consecutive `step` messages, pacing between them
    /// when configured. Returns one report per step, in order.
    pub fn run_batch(&self, simulation: &mut Simulation, steps: u32) -> Vec<StepReport> {
        let mut reports = Vec::with_capacity(steps as usize);
        for index in 0..steps {
            reports.push(simulation.step());
            if let Some(pace) = self.pace
                && index + 1 < steps
            {
                std::thread::sleep(pace);
            }
        }
        reports
    }
}
