//! Edge Routing Runtime
//!
//! Async engine that decides whether traffic for configured domains should be
//! routed to a local server or left to the remote network, and keeps a hosting
//! native shell informed.
//!
//! ## Architecture
//!
//! - [`HttpLivenessProber`] reduces a bounded-time health request to a boolean
//! - [`HealthMonitor`] schedules probes and reports liveness transitions
//! - [`BridgeResolver`] picks one host bridge from a [`HostEnvironment`]
//! - [`EdgeController`] wires them together and broadcasts [`EdgeEvent`]s
//!
//! ```rust,no_run
//! use edge_core::RoutingOptions;
//! use edge_runtime::EdgeController;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let controller = EdgeController::web_only();
//! let mut events = controller.subscribe();
//!
//! controller
//!     .init(
//!         RoutingOptions::new("http://127.0.0.1:3000/health")
//!             .allow_list(["a.com"])
//!             .deny_list(["b.com"]),
//!     )
//!     .await?;
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! # Ok(())
//! # }
//! ```

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod bridge;
pub mod controller;
mod logging;
pub mod monitor;
pub mod prober;
mod reconciler;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use bridge::{
    BridgeCallbacks, BridgeResolver, BridgeTimeouts, ConfigPlugin, CustomBridgeHost,
    HostEnvironment, MessageChannelHost, NativeBridgeHost, PluginRegistry, PromptHost,
    TransportHandle,
};
pub use controller::{EdgeController, LifecycleState, EVENT_CHANNEL_CAPACITY};
pub use monitor::{HealthMonitor, MonitorState, TransitionHandler};
pub use prober::{HttpLivenessProber, LivenessProbe, LivenessState, ProbeError, HEALTH_CHECK_HEADER};

pub use edge_core::{
    BridgeRequest, BridgeResponse, BridgeType, EdgeError, EdgeEvent, EdgeStatus, Result,
    RouteConfigPayload, RoutingConfig, RoutingOptions,
};
