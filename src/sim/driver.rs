//! Synchronous driver: one tick against the live store, then termination.
//!
//! Each step reads the *current* nodes and edges, so edits made between
//! steps are picked up by the next tick.

use serde::{Deserialize, Serialize};

use crate::store::RelationStore;
use crate::{Error, Result};
use super::{sim_tick, TickResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Average tension fell below epsilon.
    Converged,
    /// Tick counter reached `max_ticks`.
    MaxTicks,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Nothing to do: the simulation is not running.
    Idle,
    /// The result belonged to a stopped or restarted run and was dropped.
    Stale,
    Advanced { tick: u32, avg_tension: f64 },
    Finished { tick: u32, avg_tension: f64, reason: StopReason },
}

impl StepOutcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, StepOutcome::Finished { .. })
    }
}

pub struct SimDriver;

impl SimDriver {
    /// Compute and apply exactly one tick if the simulation is running.
    pub fn step(store: &mut RelationStore) -> StepOutcome {
        if !store.sim().running {
            return StepOutcome::Idle;
        }
        let run = store.sim().run;
        let params = store.sim().params;
        let (nodes, edges) = store.sim_snapshot();
        let result = sim_tick(&nodes, &edges, &params);
        Self::conclude(store, run, &result)
    }

    /// Apply a tick computed for generation `run` and check termination.
    /// Shared by the synchronous driver and the background stepper.
    pub fn conclude(store: &mut RelationStore, run: u64, result: &TickResult) -> StepOutcome {
        if !store.apply_sim_tick(run, result) {
            return StepOutcome::Stale;
        }
        let sim = store.sim();
        let (tick, avg_tension) = (sim.tick, sim.avg_tension);
        let reason = if avg_tension < sim.params.epsilon {
            StopReason::Converged
        } else if tick >= sim.params.max_ticks {
            StopReason::MaxTicks
        } else {
            return StepOutcome::Advanced { tick, avg_tension };
        };

        store.stop_sim();
        if store.sim().params.snapback {
            store.snapback();
        }
        tracing::info!(tick, avg_tension, ?reason, "simulation finished");
        StepOutcome::Finished { tick, avg_tension, reason }
    }

    /// Step until the running simulation terminates.
    pub fn run_to_rest(store: &mut RelationStore) -> Result<StepOutcome> {
        if !store.sim().running {
            return Err(Error::Simulation("simulation is not running".into()));
        }
        loop {
            match Self::step(store) {
                StepOutcome::Advanced { .. } => continue,
                outcome => return Ok(outcome),
            }
        }
    }
}
