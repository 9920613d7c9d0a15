//! Route reconciler
//!
//! Turns a committed liveness value into a routing payload, broadcasts it
//! locally and hands it to the push worker. The worker pushes to the host
//! bridge with at most one push in flight. Payloads published while a push
//! is in flight overwrite each other, so only the newest one is pushed next.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use edge_core::{build_route_config, EdgeEvent, RouteConfigPayload, RoutingConfig};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::bridge::TransportHandle;
use crate::logging::spawn_traced;
use crate::monitor::TransitionHandler;

#[derive(Debug, Clone, Default)]
struct RouteLists {
    allow: Vec<String>,
    deny: Vec<String>,
}

pub(crate) struct RouteReconciler {
    lists: RwLock<RouteLists>,
    prefer_local: bool,
    transport: Option<Arc<TransportHandle>>,
    events: broadcast::Sender<EdgeEvent>,
    latest: watch::Sender<Option<RouteConfigPayload>>,
    retired: Arc<AtomicBool>,
}

impl RouteReconciler {
    pub(crate) fn new(
        config: &RoutingConfig,
        transport: Option<TransportHandle>,
        events: broadcast::Sender<EdgeEvent>,
    ) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            lists: RwLock::new(RouteLists {
                allow: config.allow_list.clone(),
                deny: config.deny_list.clone(),
            }),
            prefer_local: config.prefer_local,
            transport: transport.map(Arc::new),
            events,
            latest,
            retired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handler wired into the health monitor
    pub(crate) fn transition_handler(self: &Arc<Self>) -> TransitionHandler {
        let reconciler = Arc::clone(self);
        Arc::new(move |is_alive| {
            let reconciler = Arc::clone(&reconciler);
            Box::pin(async move { reconciler.apply(is_alive) })
        })
    }

    /// Spawn the task pushing published payloads to the host bridge.
    ///
    /// Does nothing in web-only mode. Must be called from within a tokio
    /// runtime.
    pub(crate) fn start_push_worker(&self) {
        let Some(transport) = self.transport.as_ref() else {
            return;
        };
        let worker = PushWorker {
            transport: Arc::clone(transport),
            latest: self.latest.subscribe(),
            events: self.events.clone(),
            retired: Arc::clone(&self.retired),
        };
        spawn_traced(worker.run());
    }

    pub(crate) fn transport(&self) -> Option<&TransportHandle> {
        self.transport.as_deref()
    }

    pub(crate) fn set_allow_list(&self, domains: Vec<String>) {
        self.lists
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .allow = domains;
    }

    pub(crate) fn set_deny_list(&self, domains: Vec<String>) {
        self.lists
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .deny = domains;
    }

    /// Stop pushing and broadcasting. A push already in flight completes
    /// silently and nothing newer is pushed.
    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::Release);
        self.latest.send_replace(None);
    }

    pub(crate) fn payload(&self, is_alive: bool) -> RouteConfigPayload {
        let lists = self.read_lists();
        build_route_config(is_alive, &lists.allow, &lists.deny, self.prefer_local)
    }

    /// Broadcast `config-changed` for `is_alive` and publish the payload to
    /// the push worker. Never waits on the host bridge.
    pub(crate) fn apply(&self, is_alive: bool) {
        if self.retired.load(Ordering::Acquire) {
            debug!(is_alive, "reconciler retired, dropping transition");
            return;
        }
        let payload = self.payload(is_alive);

        info!(
            is_alive,
            allow = payload.allow_list.len(),
            deny = payload.deny_list.len(),
            "route config changed"
        );
        publish(
            &self.events,
            EdgeEvent::config_changed(is_alive, payload.clone()),
        );

        if self.transport.is_some() {
            // Replaces any payload the worker has not picked up yet
            self.latest.send_replace(Some(payload));
        }
    }

    fn read_lists(&self) -> std::sync::RwLockReadGuard<'_, RouteLists> {
        self.lists.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn publish(events: &broadcast::Sender<EdgeEvent>, event: EdgeEvent) {
    // No subscribers is fine
    if events.send(event).is_err() {
        debug!("no event subscribers");
    }
}

// ----------------------------------------------------------------------------
// Push Worker
// ----------------------------------------------------------------------------

struct PushWorker {
    transport: Arc<TransportHandle>,
    latest: watch::Receiver<Option<RouteConfigPayload>>,
    events: broadcast::Sender<EdgeEvent>,
    retired: Arc<AtomicBool>,
}

impl PushWorker {
    async fn run(mut self) {
        let bridge = self.transport.bridge_type();

        while self.latest.changed().await.is_ok() {
            if self.retired.load(Ordering::Acquire) {
                break;
            }
            let next = self.latest.borrow_and_update().clone();
            let Some(payload) = next else {
                continue;
            };

            match self.transport.push_route_config(&payload).await {
                Ok(result) => debug!(%bridge, %result, "route config delivered"),
                Err(e) if self.retired.load(Ordering::Acquire) => {
                    debug!(%bridge, error = %e, "push failed after retire");
                    break;
                }
                Err(e) => {
                    warn!(%bridge, error = %e, "failed to push route config");
                    publish(&self.events, EdgeEvent::bridge_error(e.to_string()));
                }
            }
        }

        debug!(%bridge, "route push worker stopped");
    }
}
