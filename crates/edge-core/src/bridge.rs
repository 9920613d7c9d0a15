//! Host bridge identifiers and wire envelopes
//!
//! Asynchronous bridges (message posting and legacy prompt) exchange a
//! request envelope carrying a correlation id and receive a response envelope
//! matched by that id.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::route::RouteConfigPayload;

/// Method name used for every routing push
pub const SET_ROUTE_CONFIG: &str = "setRouteConfig";

/// Plugin name looked up in a host plugin registry
pub const ROUTE_CONFIG_PLUGIN: &str = "NativeConfig";

// ----------------------------------------------------------------------------
// Bridge Type
// ----------------------------------------------------------------------------

/// Kind of host bridge selected at init
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BridgeType {
    /// Generic native bridge with a synchronous call
    NativeBridge,
    /// Named plugin in a host plugin registry
    PluginBridge,
    /// Custom bridge object with a synchronous call
    CustomBridge,
    /// Asynchronous message channel with correlated responses
    PostMessageBridge,
    /// Legacy string prompt with a callback registry
    PromptBridge,
    /// No host bridge; decisions stay local
    None,
}

impl BridgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeType::NativeBridge => "native-bridge",
            BridgeType::PluginBridge => "plugin-bridge",
            BridgeType::CustomBridge => "custom-bridge",
            BridgeType::PostMessageBridge => "post-message-bridge",
            BridgeType::PromptBridge => "prompt-bridge",
            BridgeType::None => "none",
        }
    }

    /// Whether routing decisions reach a host shell
    pub fn is_native(&self) -> bool {
        !matches!(self, BridgeType::None)
    }
}

impl fmt::Display for BridgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ----------------------------------------------------------------------------
// Wire Envelopes
// ----------------------------------------------------------------------------

/// Request posted to an asynchronous bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRequest {
    pub method: String,
    pub params: RouteConfigPayload,
    pub correlation_id: String,
}

impl BridgeRequest {
    pub fn set_route_config(params: RouteConfigPayload, correlation_id: String) -> Self {
        Self {
            method: SET_ROUTE_CONFIG.to_string(),
            params,
            correlation_id,
        }
    }
}

/// Response delivered back by the host, matched on `correlation_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeResponse {
    pub correlation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResponse {
    pub fn ok<T: Into<String>>(correlation_id: T, result: serde_json::Value) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn err<T: Into<String>, E: Into<String>>(correlation_id: T, error: E) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Registry key under which a prompt-bridge callback is stored
pub fn prompt_callback_key(correlation_id: &str) -> String {
    format!("${}", correlation_id)
}
