//! Background stepper: drives the simulation at a fixed interval.
//!
//! - `tokio::time::interval` at `max(8ms, speed_ms)`,
//! - each tick is computed on `spawn_blocking` from an owned snapshot (the
//!   worker boundary), then applied under the store's write lock,
//! - `stop` flips the store to Idle before signalling the task, so a tick
//!   still in flight is discarded when it returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::store::RelationStore;
use super::driver::{SimDriver, StepOutcome};
use super::{sim_tick, SimParamsPatch};

const SHUTDOWN_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, thiserror::Error)]
pub enum StepperError {
    #[error("Stepper already running - call stop() first")]
    AlreadyRunning,

    #[error("Stepper not running - call start() first")]
    NotRunning,

    #[error("Shutdown timeout after {0}ms - task may be stuck")]
    ShutdownTimeout(u64),

    #[error(transparent)]
    Engine(#[from] crate::Error),
}

/// Interval-driven simulation runner over a shared store.
pub struct SimStepper {
    store: Arc<RwLock<RelationStore>>,
    shutdown_notify: Arc<Notify>,
    task_handle: Option<JoinHandle<()>>,
    is_running: Arc<AtomicBool>,
}

impl SimStepper {
    pub fn new(store: Arc<RwLock<RelationStore>>) -> Self {
        Self {
            store,
            shutdown_notify: Arc::new(Notify::new()),
            task_handle: None,
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn store(&self) -> &Arc<RwLock<RelationStore>> {
        &self.store
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Start a run. Must be called from within a tokio runtime.
    pub fn start(&mut self, patch: Option<&SimParamsPatch>) -> Result<u64, StepperError> {
        if self.is_running() {
            return Err(StepperError::AlreadyRunning);
        }
        let (run, interval) = {
            let mut store = self.store.write();
            let run = store.start_sim(patch)?;
            (run, store.sim().params.interval())
        };

        self.is_running.store(true, Ordering::SeqCst);
        self.shutdown_notify = Arc::new(Notify::new());

        let store = Arc::clone(&self.store);
        let shutdown = Arc::clone(&self.shutdown_notify);
        let is_running = Arc::clone(&self.is_running);
        self.task_handle = Some(tokio::spawn(async move {
            stepper_loop(store, shutdown, Arc::clone(&is_running), run, interval).await;
            is_running.store(false, Ordering::SeqCst);
        }));

        tracing::info!(run, interval_ms = interval.as_millis() as u64, "sim stepper started");
        Ok(run)
    }

    /// Stop immediately. The store is Idle when this returns from its first
    /// poll; the task is then joined.
    pub async fn stop(&mut self) -> Result<(), StepperError> {
        if !self.is_running() {
            return Err(StepperError::NotRunning);
        }
        self.is_running.store(false, Ordering::SeqCst);
        self.store.write().stop_sim();
        self.shutdown_notify.notify_one();
        self.join_task().await
    }

    /// Wait for the current run to end on its own.
    pub async fn join(&mut self) -> Result<(), StepperError> {
        self.join_task().await
    }

    async fn join_task(&mut self) -> Result<(), StepperError> {
        let Some(handle) = self.task_handle.take() else {
            return Ok(());
        };
        match tokio::time::timeout(Duration::from_millis(SHUTDOWN_TIMEOUT_MS), handle).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                self.is_running.store(false, Ordering::SeqCst);
                tracing::error!(error = ?e, "sim stepper task panicked");
                Ok(())
            }
            Err(_) => {
                tracing::error!(timeout_ms = SHUTDOWN_TIMEOUT_MS, "sim stepper shutdown timeout");
                Err(StepperError::ShutdownTimeout(SHUTDOWN_TIMEOUT_MS))
            }
        }
    }
}

async fn stepper_loop(
    store: Arc<RwLock<RelationStore>>,
    shutdown_notify: Arc<Notify>,
    is_running: Arc<AtomicBool>,
    run: u64,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = shutdown_notify.notified() => {
                tracing::info!(run, "sim stepper received shutdown signal");
                break;
            }

            _ = interval.tick() => {
                if !is_running.load(Ordering::SeqCst) {
                    break;
                }
                let snapshot = {
                    let guard = store.read();
                    let sim = guard.sim();
                    if sim.running && sim.run == run {
                        let (nodes, edges) = guard.sim_snapshot();
                        Some((nodes, edges, sim.params))
                    } else {
                        None
                    }
                };
                let Some((nodes, edges, params)) = snapshot else {
                    break;
                };

                let result = match tokio::task::spawn_blocking(move || sim_tick(&nodes, &edges, &params)).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!(error = ?e, "sim tick task failed");
                        break;
                    }
                };

                let outcome = SimDriver::conclude(&mut store.write(), run, &result);
                match outcome {
                    StepOutcome::Advanced { .. } => {}
                    StepOutcome::Stale => {
                        tracing::trace!(run, "in-flight tick discarded after stop");
                        break;
                    }
                    StepOutcome::Idle | StepOutcome::Finished { .. } => break,
                }
            }
        }
    }

    tracing::info!(run, "sim stepper loop stopped");
}
