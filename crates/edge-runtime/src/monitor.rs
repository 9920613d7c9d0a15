//! Health Monitor
//!
//! Routing state machine over {Stopped, Running}. While running it probes the
//! local server on a fixed schedule and reports liveness transitions:
//! - the first probe after `start` is always reported
//! - scheduled probes are edge-triggered (reported only when the value flips)
//! - manual probes are level-triggered (always reported)

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::logging::spawn_traced;
use crate::prober::LivenessProbe;

/// Callback invoked with the committed liveness value.
///
/// Awaited inline by the schedule, so it must not wait on slow I/O.
pub type TransitionHandler = Arc<dyn Fn(bool) -> BoxFuture<'static, ()> + Send + Sync>;

/// Monitor lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
}

// ----------------------------------------------------------------------------
// Health Monitor
// ----------------------------------------------------------------------------

pub struct HealthMonitor {
    probe: Arc<dyn LivenessProbe>,
    interval: Duration,
    inner: Mutex<MonitorInner>,
}

#[derive(Default)]
struct MonitorInner {
    running: Option<RunningLoop>,
    handler: Option<TransitionHandler>,
}

struct RunningLoop {
    stop: watch::Sender<bool>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl HealthMonitor {
    pub fn new(probe: Arc<dyn LivenessProbe>, interval: Duration) -> Self {
        Self {
            probe,
            interval,
            inner: Mutex::new(MonitorInner::default()),
        }
    }

    /// Start the probe schedule. No-op with a warning when already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, on_transition: TransitionHandler) {
        let mut inner = self.lock_inner();
        if inner.running.is_some() {
            warn!("health monitor already running");
            return;
        }

        info!(
            interval_ms = self.interval.as_millis() as u64,
            "starting health monitor"
        );

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = spawn_traced(run_schedule(
            Arc::clone(&self.probe),
            self.interval,
            Arc::clone(&on_transition),
            stop_rx,
        ));

        inner.handler = Some(on_transition);
        inner.running = Some(RunningLoop {
            stop: stop_tx,
            handle,
        });
    }

    /// Stop the schedule. A probe already in flight still completes.
    pub fn stop(&self) {
        if let Some(running) = self.lock_inner().running.take() {
            let _ = running.stop.send(true);
            info!("health monitor stopped");
        }
    }

    /// Probe out of band and always report the result
    pub async fn manual_probe(&self) -> bool {
        let is_alive = self.probe.probe().await;
        let handler = self.lock_inner().handler.clone();
        if let Some(handler) = handler {
            handler(is_alive).await;
        }
        is_alive
    }

    /// Force liveness to false without touching the schedule
    pub fn reset(&self) {
        self.probe.reset();
    }

    pub fn is_alive(&self) -> bool {
        self.probe.is_alive()
    }

    pub fn state(&self) -> MonitorState {
        if self.lock_inner().running.is_some() {
            MonitorState::Running
        } else {
            MonitorState::Stopped
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn lock_inner(&self) -> MutexGuard<'_, MonitorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

// ----------------------------------------------------------------------------
// Probe Schedule
// ----------------------------------------------------------------------------

async fn run_schedule(
    probe: Arc<dyn LivenessProbe>,
    period: Duration,
    on_transition: TransitionHandler,
    mut stop: watch::Receiver<bool>,
) {
    // The schedule is anchored at start, not at the end of the first probe
    let first_tick = Instant::now() + period;

    let is_alive = probe.probe().await;
    on_transition(is_alive).await;

    let mut ticker = interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }

            _ = ticker.tick() => {
                let previous = probe.is_alive();
                let current = probe.probe().await;
                if previous != current {
                    on_transition(current).await;
                }
            }
        }
    }

    debug!("probe schedule exited");
}
