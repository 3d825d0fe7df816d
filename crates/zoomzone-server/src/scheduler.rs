//! Periodic reminder sweeps.
//!
//! The scheduler owns the only place sweeps run, so they never overlap:
//! timed sweeps and "sweep now" requests from clients go through the same
//! loop. It supports:
//! - a fixed interval with jitter
//! - exponential backoff while sweeps fail
//! - pause and resume of the timed sweeps

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{debug, info, warn};
use zoomzone_core::SweepReport;
use zoomzone_protocol::SweepSummary;

use crate::error::BookingError;

/// Result of one sweep as handed to the scheduler.
pub type SweepResult = Result<SweepReport, BookingError>;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Base interval between timed sweeps.
    pub sweep_interval: Duration,
    /// Maximum jitter to add to the interval (as fraction 0.0-1.0).
    pub jitter_fraction: f64,
    /// Backoff after the first failed sweep.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// Whether to sweep as soon as the scheduler starts.
    pub sweep_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(300),
            jitter_fraction: 0.1,
            initial_backoff: Duration::from_secs(10),
            max_backoff: Duration::from_secs(300),
            backoff_multiplier: 2.0,
            sweep_on_start: true,
        }
    }
}

impl SchedulerConfig {
    pub fn new(sweep_interval: Duration) -> Self {
        Self {
            sweep_interval,
            ..Default::default()
        }
    }

    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration, multiplier: f64) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_sweep_on_start(mut self, sweep_on_start: bool) -> Self {
        self.sweep_on_start = sweep_on_start;
        self
    }

    /// The interval with up to `jitter_fraction` added or removed.
    pub fn next_sweep_delay(&self) -> Duration {
        let base = self.sweep_interval.as_secs_f64();
        let jitter = rand_jitter(base * self.jitter_fraction);
        Duration::from_secs_f64((base + jitter).max(0.0))
    }

    pub fn backoff_delay(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(consecutive_failures - 1).unwrap_or(i32::MAX);
        let delay = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(delay.min(self.max_backoff.as_secs_f64()))
    }
}

/// Pseudo-random value in `[-range, range]` from the clock's nanoseconds.
fn rand_jitter(range: f64) -> f64 {
    use std::time::SystemTime;

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    let fraction = f64::from(nanos) / 1_000_000_000.0;
    (fraction * 2.0 - 1.0) * range
}

#[derive(Debug)]
pub enum SchedulerCommand {
    /// Sweep right away and send the outcome back.
    SweepNow { reply: oneshot::Sender<SweepResult> },
    Pause,
    Resume,
    Stop,
}

#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    pub paused: bool,
    pub consecutive_failures: u32,
    pub sweeps_run: u64,
    pub last_attempt: Option<DateTime<Utc>>,
    /// Outcome of the most recent sweep.
    pub last_sweep: Option<SweepSummary>,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &SweepResult, at: DateTime<Utc>) {
        self.sweeps_run += 1;
        self.last_attempt = Some(at);
        match result {
            Ok(report) => {
                self.consecutive_failures = 0;
                self.last_sweep = Some(SweepSummary::from_report(report));
            }
            Err(e) => {
                self.consecutive_failures += 1;
                self.last_sweep = Some(SweepSummary::aborted(at, e.to_string()));
            }
        }
    }
}

pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

pub fn new_scheduler_state() -> SharedSchedulerState {
    Arc::new(RwLock::new(SchedulerState::new()))
}

/// The scheduler has stopped and takes no more commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("sweep scheduler is not running")]
pub struct SchedulerStopped;

pub struct Scheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: new_scheduler_state(),
            command_tx,
            command_rx,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs sweeps until stopped or every handle is dropped.
    ///
    /// `sweep` is given the current time and runs one sweep.
    pub async fn run<F, Fut>(self, sweep: F)
    where
        F: Fn(DateTime<Utc>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SweepResult> + Send,
    {
        let Self {
            config,
            state,
            command_tx,
            mut command_rx,
        } = self;
        // Handles keep the channel open; ours must not.
        drop(command_tx);

        info!(
            interval_secs = config.sweep_interval.as_secs(),
            "sweep scheduler started"
        );

        if config.sweep_on_start {
            run_sweep(&state, &sweep).await;
        }

        loop {
            let delay = next_delay(&config, &state).await;
            debug!(delay_secs = delay.as_secs(), "next sweep scheduled");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    if state.read().await.paused {
                        debug!("sweeps paused, skipping");
                        continue;
                    }
                    run_sweep(&state, &sweep).await;
                }
                command = command_rx.recv() => match command {
                    Some(SchedulerCommand::SweepNow { reply }) => {
                        debug!("sweep requested");
                        let result = run_sweep(&state, &sweep).await;
                        let _ = reply.send(result);
                    }
                    Some(SchedulerCommand::Pause) => {
                        info!("sweeps paused");
                        state.write().await.paused = true;
                    }
                    Some(SchedulerCommand::Resume) => {
                        info!("sweeps resumed");
                        state.write().await.paused = false;
                    }
                    Some(SchedulerCommand::Stop) | None => {
                        info!("sweep scheduler stopping");
                        break;
                    }
                },
            }
        }
    }
}

async fn next_delay(config: &SchedulerConfig, state: &SharedSchedulerState) -> Duration {
    let failures = state.read().await.consecutive_failures;
    if failures > 0 {
        let backoff = config.backoff_delay(failures);
        debug!(failures, backoff_secs = backoff.as_secs(), "backing off");
        return backoff;
    }
    config.next_sweep_delay()
}

async fn run_sweep<F, Fut>(state: &SharedSchedulerState, sweep: &F) -> SweepResult
where
    F: Fn(DateTime<Utc>) -> Fut,
    Fut: Future<Output = SweepResult>,
{
    let now = Utc::now();
    let result = sweep(now).await;
    if let Err(e) = &result {
        warn!(error = %e, "sweep failed");
    }
    state.write().await.record(&result, now);
    result
}

#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    /// Runs a sweep through the scheduler and waits for its report.
    pub async fn sweep_now(&self) -> Result<SweepResult, SchedulerStopped> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(SchedulerCommand::SweepNow { reply })
            .await
            .map_err(|_| SchedulerStopped)?;
        response.await.map_err(|_| SchedulerStopped)
    }

    pub async fn pause(&self) -> Result<(), SchedulerStopped> {
        self.send(SchedulerCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<(), SchedulerStopped> {
        self.send(SchedulerCommand::Resume).await
    }

    pub async fn stop(&self) -> Result<(), SchedulerStopped> {
        self.send(SchedulerCommand::Stop).await
    }

    async fn send(&self, command: SchedulerCommand) -> Result<(), SchedulerStopped> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SchedulerStopped)
    }

    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }

    pub async fn is_paused(&self) -> bool {
        self.state.read().await.paused
    }
}
