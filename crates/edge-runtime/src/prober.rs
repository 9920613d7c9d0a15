//! Liveness Prober
//!
//! Reduces a bounded-time health request against the local server to a
//! boolean. At most one probe is in flight per prober: a probe requested while
//! another is outstanding returns the last known value without touching the
//! network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use edge_core::{EdgeError, RoutingConfig};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Header tagging requests as health probes
pub const HEALTH_CHECK_HEADER: &str = "X-Health-Check";

// ----------------------------------------------------------------------------
// Probe Errors
// ----------------------------------------------------------------------------

/// Why a single probe failed. Never leaves the prober; every variant means
/// "not alive".
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("health request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("health request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
    #[error("health endpoint returned status {status}")]
    Status { status: u16 },
}

// ----------------------------------------------------------------------------
// Liveness Probe Trait
// ----------------------------------------------------------------------------

/// Source of liveness for the health monitor
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Run one probe and return the committed liveness value.
    ///
    /// Must never fail and must not issue a second request while one is
    /// outstanding.
    async fn probe(&self) -> bool;

    /// Last committed liveness value
    fn is_alive(&self) -> bool;

    /// Force liveness to false and clear the in-flight marker
    fn reset(&self);
}

// ----------------------------------------------------------------------------
// Liveness State
// ----------------------------------------------------------------------------

/// Liveness value plus the at-most-one-probe guard
#[derive(Debug, Default)]
pub struct LivenessState {
    is_alive: AtomicBool,
    probe_in_flight: AtomicBool,
}

impl LivenessState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive.load(Ordering::Acquire)
    }

    pub fn is_probe_in_flight(&self) -> bool {
        self.probe_in_flight.load(Ordering::Acquire)
    }

    /// Claim the in-flight slot. `None` if a probe is already outstanding.
    pub fn try_begin_probe(&self) -> Option<InFlightGuard<'_>> {
        self.probe_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { state: self })
    }

    /// Store a new liveness value, returning the previous one
    pub fn commit(&self, is_alive: bool) -> bool {
        self.is_alive.swap(is_alive, Ordering::AcqRel)
    }

    pub fn reset(&self) {
        self.is_alive.store(false, Ordering::Release);
        self.probe_in_flight.store(false, Ordering::Release);
    }
}

/// Releases the in-flight slot on every exit path
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    state: &'a LivenessState,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.state.probe_in_flight.store(false, Ordering::Release);
    }
}

// ----------------------------------------------------------------------------
// HTTP Prober
// ----------------------------------------------------------------------------

/// Probes the local server's health endpoint over HTTP
pub struct HttpLivenessProber {
    client: reqwest::Client,
    probe_url: String,
    timeout: Duration,
    state: LivenessState,
}

impl HttpLivenessProber {
    /// Create a prober for the given endpoint and per-probe deadline
    pub fn new<T: Into<String>>(probe_url: T, timeout: Duration) -> Result<Self, EdgeError> {
        // The local server is never reached through a proxy
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| EdgeError::startup(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            probe_url: probe_url.into(),
            timeout,
            state: LivenessState::new(),
        })
    }

    pub fn from_config(config: &RoutingConfig) -> Result<Self, EdgeError> {
        Self::new(config.probe_url.clone(), config.probe_timeout)
    }

    pub fn probe_url(&self) -> &str {
        &self.probe_url
    }

    pub fn state(&self) -> &LivenessState {
        &self.state
    }

    async fn request_health(&self) -> Result<(), ProbeError> {
        let request = self
            .client
            .get(&self.probe_url)
            .header(HEALTH_CHECK_HEADER, "true")
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| ProbeError::Timeout {
                duration_ms: self.timeout.as_millis() as u64,
            })??;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status {
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl LivenessProbe for HttpLivenessProber {
    async fn probe(&self) -> bool {
        let Some(_guard) = self.state.try_begin_probe() else {
            warn!(url = %self.probe_url, "probe already in flight, reusing last result");
            return self.state.is_alive();
        };

        let is_alive = match self.request_health().await {
            Ok(()) => true,
            Err(e) => {
                if self.state.is_alive() {
                    warn!(url = %self.probe_url, error = %e, "local server unavailable");
                } else {
                    debug!(url = %self.probe_url, error = %e, "probe failed");
                }
                false
            }
        };

        let was_alive = self.state.commit(is_alive);
        if was_alive != is_alive {
            info!(
                from = if was_alive { "ALIVE" } else { "DOWN" },
                to = if is_alive { "ALIVE" } else { "DOWN" },
                "local server liveness changed"
            );
        }

        is_alive
    }

    fn is_alive(&self) -> bool {
        self.state.is_alive()
    }

    fn reset(&self) {
        self.state.reset();
    }
}
