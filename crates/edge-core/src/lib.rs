//! Edge Routing Core
//!
//! Foundational types for the local-server edge routing runtime: validated
//! configuration, the pure route configuration builder, local broadcast
//! events, host bridge envelopes and the shared error taxonomy. Nothing in
//! this crate performs I/O; the async engine lives in `edge-runtime`.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod bridge;
pub mod config;
pub mod errors;
pub mod events;
pub mod route;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use bridge::{
    prompt_callback_key, BridgeRequest, BridgeResponse, BridgeType, ROUTE_CONFIG_PLUGIN,
    SET_ROUTE_CONFIG,
};
pub use config::{RoutingConfig, RoutingOptions};
pub use errors::{EdgeError, HostError, Result, TransportError, ValidationError};
pub use events::{now_millis, EdgeEvent};
pub use route::{build_route_config, EdgeStatus, RouteConfigPayload};
