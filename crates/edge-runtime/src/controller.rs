//! Edge Controller
//!
//! Public facade over the prober, health monitor, bridge resolver and route
//! reconciler. Lifecycle: Uninitialized -> Initialized -> Destroyed, and a
//! destroyed controller may be initialized again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use edge_core::{
    BridgeType, EdgeError, EdgeEvent, EdgeStatus, Result, RoutingConfig, RoutingOptions,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::bridge::{BridgeCallbacks, BridgeResolver, BridgeTimeouts, HostEnvironment};
use crate::logging::{with_logging, with_logging_async};
use crate::monitor::HealthMonitor;
use crate::prober::{HttpLivenessProber, LivenessProbe};
use crate::reconciler::RouteReconciler;

/// Buffered events per subscriber before lagging
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Controller lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Destroyed,
}

enum Lifecycle {
    Uninitialized,
    Initialized(Arc<EdgeSession>),
    Destroyed,
}

/// Everything created by one successful `init`
struct EdgeSession {
    monitor: HealthMonitor,
    reconciler: Arc<RouteReconciler>,
    logging_enabled: bool,
}

impl EdgeSession {
    fn status(&self) -> EdgeStatus {
        let is_alive = self.monitor.is_alive();
        let payload = self.reconciler.payload(is_alive);
        EdgeStatus {
            initialized: true,
            is_alive,
            bridge_type: self.bridge_type(),
            allow_list: payload.allow_list,
            deny_list: payload.deny_list,
            route_all_local: payload.route_all_local,
        }
    }

    fn bridge_type(&self) -> BridgeType {
        self.reconciler
            .transport()
            .map(|transport| transport.bridge_type())
            .unwrap_or(BridgeType::None)
    }

    /// Re-run the transition handler with the cached liveness value
    fn reconcile_cached(&self) {
        let is_alive = self.monitor.is_alive();
        with_logging(self.logging_enabled, || self.reconciler.apply(is_alive));
    }
}

// ----------------------------------------------------------------------------
// Edge Controller
// ----------------------------------------------------------------------------

pub struct EdgeController {
    resolver: BridgeResolver,
    events: broadcast::Sender<EdgeEvent>,
    lifecycle: Mutex<Lifecycle>,
}

impl EdgeController {
    pub fn new(host: HostEnvironment) -> Self {
        Self::with_bridge_timeouts(host, BridgeTimeouts::default())
    }

    pub fn with_bridge_timeouts(host: HostEnvironment, timeouts: BridgeTimeouts) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            resolver: BridgeResolver::with_timeouts(host, timeouts),
            events,
            lifecycle: Mutex::new(Lifecycle::Uninitialized),
        }
    }

    /// Controller with no host capabilities. Decisions are only broadcast locally.
    pub fn web_only() -> Self {
        Self::new(HostEnvironment::web_only())
    }

    /// Validate options, resolve the host bridge and start probing the
    /// local server over HTTP.
    ///
    /// Calling `init` on an initialized controller logs a warning and does
    /// nothing.
    pub async fn init(&self, options: RoutingOptions) -> Result<()> {
        if self.warn_if_initialized() {
            return Ok(());
        }

        let config = validate_quietly(options)?;
        let probe = HttpLivenessProber::from_config(&config)?;
        self.activate(config, Arc::new(probe))
    }

    /// Like `init`, with a caller-supplied liveness probe
    pub async fn init_with_probe(
        &self,
        options: RoutingOptions,
        probe: Arc<dyn LivenessProbe>,
    ) -> Result<()> {
        if self.warn_if_initialized() {
            return Ok(());
        }

        let config = validate_quietly(options)?;
        self.activate(config, probe)
    }

    /// Current snapshot. All-false and empty when not initialized.
    pub fn status(&self) -> EdgeStatus {
        match &*self.lock_lifecycle() {
            Lifecycle::Initialized(session) => session.status(),
            _ => EdgeStatus::uninitialized(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        match &*self.lock_lifecycle() {
            Lifecycle::Uninitialized => LifecycleState::Uninitialized,
            Lifecycle::Initialized(_) => LifecycleState::Initialized,
            Lifecycle::Destroyed => LifecycleState::Destroyed,
        }
    }

    /// Probe now and report the result, whether or not it changed
    pub async fn manual_check(&self) -> Result<bool> {
        let session = self.session()?;
        let is_alive =
            with_logging_async(session.logging_enabled, session.monitor.manual_probe()).await;
        Ok(is_alive)
    }

    /// Replace the allow list and re-emit the routing config
    pub fn update_allow_list(&self, domains: Vec<String>) -> Result<()> {
        let session = self.session()?;
        session.reconciler.set_allow_list(domains);
        session.reconcile_cached();
        Ok(())
    }

    /// Replace the deny list and re-emit the routing config
    pub fn update_deny_list(&self, domains: Vec<String>) -> Result<()> {
        let session = self.session()?;
        session.reconciler.set_deny_list(domains);
        session.reconcile_cached();
        Ok(())
    }

    /// Stop probing and release the transport and liveness state
    pub fn destroy(&self) {
        let mut lifecycle = self.lock_lifecycle();
        let session = match std::mem::replace(&mut *lifecycle, Lifecycle::Destroyed) {
            Lifecycle::Initialized(session) => session,
            previous => {
                *lifecycle = previous;
                debug!("destroy called on a controller that is not initialized");
                return;
            }
        };
        drop(lifecycle);

        with_logging(session.logging_enabled, || {
            session.monitor.stop();
            session.reconciler.retire();
            session.monitor.reset();
            info!("edge runtime destroyed");
        });
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EdgeEvent> {
        self.events.subscribe()
    }

    /// Registry through which the host delivers asynchronous bridge responses
    pub fn bridge_callbacks(&self) -> BridgeCallbacks {
        self.resolver.callbacks().clone()
    }

    pub fn bridge_type(&self) -> BridgeType {
        match &*self.lock_lifecycle() {
            Lifecycle::Initialized(session) => session.bridge_type(),
            _ => BridgeType::None,
        }
    }

    fn activate(&self, config: RoutingConfig, probe: Arc<dyn LivenessProbe>) -> Result<()> {
        let logging_enabled = config.logging_enabled;

        with_logging(logging_enabled, || -> Result<()> {
            let mut lifecycle = self.lock_lifecycle();
            if matches!(*lifecycle, Lifecycle::Initialized(_)) {
                warn!("edge runtime already initialized");
                return Ok(());
            }

            let transport = self.resolver.resolve();
            let bridge = transport
                .as_ref()
                .map(|t| t.bridge_type())
                .unwrap_or(BridgeType::None);

            let reconciler = Arc::new(RouteReconciler::new(
                &config,
                transport,
                self.events.clone(),
            ));
            reconciler.start_push_worker();
            let monitor = HealthMonitor::new(probe, config.probe_interval);
            monitor.start(reconciler.transition_handler());

            info!(
                probe_url = %config.probe_url,
                interval_ms = config.probe_interval.as_millis() as u64,
                timeout_ms = config.probe_timeout.as_millis() as u64,
                %bridge,
                "edge runtime initialized"
            );

            *lifecycle = Lifecycle::Initialized(Arc::new(EdgeSession {
                monitor,
                reconciler,
                logging_enabled,
            }));
            Ok(())
        })
    }

    fn warn_if_initialized(&self) -> bool {
        match &*self.lock_lifecycle() {
            Lifecycle::Initialized(session) => {
                with_logging(session.logging_enabled, || {
                    warn!("edge runtime already initialized")
                });
                true
            }
            _ => false,
        }
    }

    fn session(&self) -> Result<Arc<EdgeSession>> {
        match &*self.lock_lifecycle() {
            Lifecycle::Initialized(session) => Ok(Arc::clone(session)),
            _ => Err(EdgeError::NotInitialized),
        }
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Validation warnings respect the caller's `logging_enabled`
fn validate_quietly(options: RoutingOptions) -> Result<RoutingConfig> {
    let logging_enabled = options.logging_enabled.unwrap_or(true);
    with_logging(logging_enabled, move || options.validate().map_err(EdgeError::from))
}

impl Default for EdgeController {
    fn default() -> Self {
        Self::web_only()
    }
}

impl Drop for EdgeController {
    fn drop(&mut self) {
        self.destroy();
    }
}
