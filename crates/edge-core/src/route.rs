//! Route configuration derived from local-server liveness

use serde::{Deserialize, Serialize};

use crate::bridge::BridgeType;

// ----------------------------------------------------------------------------
// Route Configuration Payload
// ----------------------------------------------------------------------------

/// Routing decision delivered to the host shell on every transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfigPayload {
    /// Domains to route locally; empty while the local server is down
    pub allow_list: Vec<String>,
    /// Domains never routed locally
    pub deny_list: Vec<String>,
    /// Route everything to the local server
    pub route_all_local: bool,
    /// Prefer the local server when both are usable
    pub prefer_local: bool,
    /// Local routing is enabled at all
    pub local_enabled: bool,
}

/// Build the routing payload for a liveness value.
///
/// Pure and total: the allow list is only echoed while alive, the deny list
/// always is, and both local flags follow liveness.
pub fn build_route_config(
    is_alive: bool,
    allow_list: &[String],
    deny_list: &[String],
    prefer_local: bool,
) -> RouteConfigPayload {
    RouteConfigPayload {
        allow_list: if is_alive {
            allow_list.to_vec()
        } else {
            Vec::new()
        },
        deny_list: deny_list.to_vec(),
        route_all_local: is_alive,
        prefer_local,
        local_enabled: is_alive,
    }
}

// ----------------------------------------------------------------------------
// Status Snapshot
// ----------------------------------------------------------------------------

/// Read-only view of the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStatus {
    pub initialized: bool,
    pub is_alive: bool,
    pub bridge_type: BridgeType,
    pub allow_list: Vec<String>,
    pub deny_list: Vec<String>,
    pub route_all_local: bool,
}

impl EdgeStatus {
    /// Snapshot reported before `init` and after `destroy`
    pub fn uninitialized() -> Self {
        Self {
            initialized: false,
            is_alive: false,
            bridge_type: BridgeType::None,
            allow_list: Vec::new(),
            deny_list: Vec::new(),
            route_all_local: false,
        }
    }
}

impl Default for EdgeStatus {
    fn default() -> Self {
        Self::uninitialized()
    }
}
