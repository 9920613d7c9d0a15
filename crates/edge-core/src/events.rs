//! Local broadcast events
//!
//! Emitted by the controller on its process-wide event channel. Delivery is
//! fire-and-forget: no acknowledgement, no replay for late subscribers.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::route::RouteConfigPayload;

pub const CONFIG_CHANGED: &str = "config-changed";
pub const BRIDGE_ERROR: &str = "bridge-error";

/// Events observable by local listeners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EdgeEvent {
    /// A routing configuration was computed for a liveness value
    #[serde(rename_all = "camelCase")]
    ConfigChanged {
        is_alive: bool,
        payload: RouteConfigPayload,
        timestamp: u64,
    },
    /// Pushing a routing configuration to the host failed
    #[serde(rename_all = "camelCase")]
    BridgeError { message: String, timestamp: u64 },
}

impl EdgeEvent {
    pub fn config_changed(is_alive: bool, payload: RouteConfigPayload) -> Self {
        EdgeEvent::ConfigChanged {
            is_alive,
            payload,
            timestamp: now_millis(),
        }
    }

    pub fn bridge_error<T: Into<String>>(message: T) -> Self {
        EdgeEvent::BridgeError {
            message: message.into(),
            timestamp: now_millis(),
        }
    }

    /// Event name as seen by listeners
    pub fn name(&self) -> &'static str {
        match self {
            EdgeEvent::ConfigChanged { .. } => CONFIG_CHANGED,
            EdgeEvent::BridgeError { .. } => BRIDGE_ERROR,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            EdgeEvent::ConfigChanged { timestamp, .. } | EdgeEvent::BridgeError { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

/// Milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
