// Update scheduler - Drives the polling cadence
use crate::application::dashboard_service::{DashboardService, TickOutcome};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub const MIN_RATE_MS: u32 = 1;
pub const MAX_RATE_MS: u32 = 5000;

/// Rates below this are driven by the frame loop; a plain timer cannot
/// keep up with them reliably.
pub const FRAME_SYNC_BELOW_MS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    FixedInterval,
    FrameSynced,
}

impl Strategy {
    pub fn for_rate(rate_ms: u32) -> Self {
        if rate_ms < FRAME_SYNC_BELOW_MS {
            Strategy::FrameSynced
        } else {
            Strategy::FixedInterval
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SchedulerState {
    Stopped,
    RunningFixedInterval,
    RunningFrameSynced,
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Display refresh period for the frame loop
    pub frame_period: Duration,
    /// Keep ticking on the frame loop while no chart is active
    pub idle_frame_polling: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            frame_period: Duration::from_millis(16),
            idle_frame_polling: true,
        }
    }
}

pub struct UpdateScheduler {
    dashboard: Arc<DashboardService>,
    settings: SchedulerSettings,
    rate_ms: u32,
    strategy: Strategy,
    state: SchedulerState,
    loop_task: Option<JoinHandle<()>>,
}

impl UpdateScheduler {
    pub fn new(dashboard: Arc<DashboardService>, settings: SchedulerSettings, rate_ms: u32) -> Self {
        Self {
            dashboard,
            settings,
            rate_ms,
            strategy: Strategy::for_rate(rate_ms),
            state: SchedulerState::Stopped,
            loop_task: None,
        }
    }

    pub fn rate_ms(&self) -> u32 {
        self.rate_ms
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state != SchedulerState::Stopped
    }

    /// Spawn the loop for the current strategy. Does nothing when already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let generation = self.dashboard.advance_generation();
        let dashboard = self.dashboard.clone();
        let rate = Duration::from_millis(self.rate_ms as u64);

        let (task, state) = match self.strategy {
            Strategy::FixedInterval => (
                tokio::spawn(fixed_interval_loop(dashboard, rate)),
                SchedulerState::RunningFixedInterval,
            ),
            Strategy::FrameSynced => (
                tokio::spawn(frame_synced_loop(dashboard, rate, self.settings.clone())),
                SchedulerState::RunningFrameSynced,
            ),
        };
        self.loop_task = Some(task);
        self.state = state;

        tracing::info!(
            "Scheduler started: {:?} every {}ms (generation {})",
            self.strategy,
            self.rate_ms,
            generation
        );
    }

    /// Cancel the active loop. Fetches already in flight keep running but
    /// their results are discarded by the generation check.
    pub fn stop(&mut self) {
        if let Some(task) = self.loop_task.take() {
            task.abort();
        }
        let generation = self.dashboard.advance_generation();
        if self.is_running() {
            tracing::info!("Scheduler stopped (generation {})", generation);
        }
        self.state = SchedulerState::Stopped;
    }

    /// Apply an already validated rate. A running scheduler is torn down and
    /// restarted with the strategy the new rate calls for.
    pub fn set_rate(&mut self, rate_ms: u32) -> Strategy {
        let was_running = self.is_running();
        self.stop();

        self.rate_ms = rate_ms;
        self.strategy = Strategy::for_rate(rate_ms);
        tracing::debug!("Rate set to {}ms ({:?})", rate_ms, self.strategy);

        if was_running {
            self.start();
        }
        self.strategy
    }
}

impl Drop for UpdateScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.loop_task.take() {
            task.abort();
        }
    }
}

fn spawn_tick(dashboard: &Arc<DashboardService>) {
    let ticket = dashboard.issue_ticket();
    let dashboard = dashboard.clone();
    tokio::spawn(async move {
        match dashboard.run_tick(ticket).await {
            TickOutcome::Applied(report) => {
                tracing::trace!("Tick {} updated {:?}", ticket.sequence, report.updated)
            }
            TickOutcome::Failed(e) => tracing::trace!("Tick {} failed: {}", ticket.sequence, e),
            TickOutcome::Stale => {}
        }
    });
}

/// Ticks every `rate` whether or not the previous fetch has finished.
async fn fixed_interval_loop(dashboard: Arc<DashboardService>, rate: Duration) {
    let mut ticker = interval_at(Instant::now() + rate, rate);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        spawn_tick(&dashboard);
    }
}

/// Wakes every display frame and ticks once `rate` has elapsed since the
/// last tick.
async fn frame_synced_loop(dashboard: Arc<DashboardService>, rate: Duration, settings: SchedulerSettings) {
    let mut frames = interval_at(Instant::now() + settings.frame_period, settings.frame_period);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_tick = Instant::now();

    loop {
        let now = frames.tick().await;

        if !settings.idle_frame_polling && !dashboard.has_active_bindings() {
            continue;
        }
        if now.duration_since(last_tick) >= rate {
            last_tick = now;
            spawn_tick(&dashboard);
        }
    }
}
