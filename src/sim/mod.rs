//! # Semantic Equilibrium Simulation
//!
//! Damped relaxation that moves node positions to expose disagreement
//! between asserted causal edge weights and embedding similarity.
//!
//! ## State machine
//!
//! ```text
//!   Idle ──start──▶ Running ──stop | tick ≥ max_ticks | avg < ε──▶ Idle
//!    ▲                                                              │
//!    └──────────────────────── snapback (Idle only) ◀───────────────┘
//! ```
//!
//! The state itself (`SimState`) lives on the `RelationStore`; this module
//! provides the pure tick, the oscillator signal, the synchronous driver and
//! (with the `runtime` feature) the interval-driven background stepper.

pub mod equilibrium;
pub mod oscillator;
pub mod driver;
#[cfg(feature = "runtime")]
pub mod stepper;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::{NodeId, Position};

pub use equilibrium::{sim_tick, tension, TickResult};
pub use oscillator::{node_instability, oscillator_map, pulse_hz, pulse_scale};
pub use driver::{SimDriver, StepOutcome, StopReason};
#[cfg(feature = "runtime")]
pub use stepper::{SimStepper, StepperError};

/// Floor for the scheduling interval.
pub const MIN_INTERVAL_MS: u64 = 8;

/// Half-extents of the layout rectangle; positions are clamped to ±x, ±y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self { x: 400.0, y: 300.0 }
    }
}

impl Bounds {
    /// Clamp `p` into the rectangle. Negative extents count by magnitude;
    /// non-finite extents fall back to the default rectangle.
    pub fn clamp(&self, p: Position) -> Position {
        let default = Bounds::default();
        let hx = half_extent(self.x, default.x);
        let hy = half_extent(self.y, default.y);
        Position::new(p.x.clamp(-hx, hx), p.y.clamp(-hy, hy))
    }
}

fn half_extent(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v.abs() } else { fallback }
}

/// Simulation tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Stop once the average tension drops below this.
    pub epsilon: f64,
    pub max_ticks: u32,
    /// Requested interval between ticks; never below `MIN_INTERVAL_MS`.
    pub speed_ms: u64,
    /// 0..=1 friction applied to every displacement.
    pub damping: f64,
    /// Displacement scale per tick.
    pub step: f64,
    pub bounds: Bounds,
    /// Restore pre-run positions when a run ends on its own.
    pub snapback: bool,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            epsilon: 0.002,
            max_ticks: 200,
            speed_ms: 16,
            damping: 0.9,
            step: 1.0,
            bounds: Bounds::default(),
            snapback: false,
        }
    }
}

impl SimParams {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.speed_ms.max(MIN_INTERVAL_MS))
    }
}

/// Render-only pulsation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillatorSettings {
    pub on: bool,
    pub sensitivity: f64,
}

impl Default for OscillatorSettings {
    fn default() -> Self {
        Self { on: false, sensitivity: 1.0 }
    }
}

/// Partial update for `SimParams` and the oscillator; `None` keeps a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParamsPatch {
    pub epsilon: Option<f64>,
    pub max_ticks: Option<u32>,
    pub speed_ms: Option<u64>,
    pub damping: Option<f64>,
    pub step: Option<f64>,
    pub bounds: Option<Bounds>,
    pub snapback: Option<bool>,
    pub oscillator_on: Option<bool>,
    pub sensitivity: Option<f64>,
}

impl SimParamsPatch {
    pub fn apply(&self, params: &mut SimParams, oscillator: &mut OscillatorSettings) {
        if let Some(v) = self.epsilon { params.epsilon = v; }
        if let Some(v) = self.max_ticks { params.max_ticks = v; }
        if let Some(v) = self.speed_ms { params.speed_ms = v; }
        if let Some(v) = self.damping { params.damping = v; }
        if let Some(v) = self.step { params.step = v; }
        if let Some(v) = self.bounds { params.bounds = v; }
        if let Some(v) = self.snapback { params.snapback = v; }
        if let Some(v) = self.oscillator_on { oscillator.on = v; }
        if let Some(v) = self.sensitivity { oscillator.sensitivity = v; }
    }
}

/// The single active simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimState {
    pub running: bool,
    pub tick: u32,
    pub avg_tension: f64,
    pub params: SimParams,
    pub oscillator: OscillatorSettings,
    /// Positions captured at the most recent start.
    pub pre_sim_positions: Option<BTreeMap<NodeId, Position>>,
    /// Run generation, bumped on every start. Tick results computed for an
    /// older generation are discarded.
    pub run: u64,
}

impl SimState {
    pub fn is_idle(&self) -> bool {
        !self.running
    }
}
