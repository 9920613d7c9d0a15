//! Host capabilities
//!
//! Each trait is one communication mechanism a hosting native shell may
//! expose. A `HostEnvironment` collects whichever of them are present; the
//! resolver picks the first usable one in priority order.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use edge_core::{BridgeRequest, HostError, RouteConfigPayload};

// ----------------------------------------------------------------------------
// Capability Traits
// ----------------------------------------------------------------------------

/// Generic native bridge with a synchronous, fire-and-forget call
pub trait NativeBridgeHost: Send + Sync {
    /// Whether the bridge is backed by a native shell right now
    fn is_native(&self) -> bool;

    fn call(&self, method: &str, params: &RouteConfigPayload) -> Result<(), HostError>;
}

/// Plugin exposing the routing push
#[async_trait]
pub trait ConfigPlugin: Send + Sync {
    async fn set_route_config(
        &self,
        payload: &RouteConfigPayload,
    ) -> Result<serde_json::Value, HostError>;
}

/// Named plugin registry
pub trait PluginRegistry: Send + Sync {
    fn plugin(&self, name: &str) -> Option<Arc<dyn ConfigPlugin>>;
}

/// Custom bridge object with a synchronous push
pub trait CustomBridgeHost: Send + Sync {
    fn set_route_config(&self, payload: &RouteConfigPayload) -> Result<(), HostError>;
}

/// Asynchronous message channel. Responses come back through
/// `BridgeCallbacks::deliver`.
pub trait MessageChannelHost: Send + Sync {
    fn post_message(&self, request: &BridgeRequest) -> Result<(), HostError>;
}

/// Legacy prompt taking one serialized request. Responses come back through
/// `BridgeCallbacks::resolve` under the `$<correlationId>` key.
///
/// `prompt` is called on a runtime worker thread. Implementations must hand
/// the message off and return at once; one that blocks until the user or
/// host answers stalls the runtime and its own deadline.
pub trait PromptHost: Send + Sync {
    fn prompt(&self, message: &str) -> Result<(), HostError>;
}

// ----------------------------------------------------------------------------
// Host Environment
// ----------------------------------------------------------------------------

/// Capabilities exposed by the embedding shell
#[derive(Clone, Default)]
pub struct HostEnvironment {
    pub native_bridge: Option<Arc<dyn NativeBridgeHost>>,
    pub plugins: Option<Arc<dyn PluginRegistry>>,
    pub custom_bridge: Option<Arc<dyn CustomBridgeHost>>,
    pub message_channel: Option<Arc<dyn MessageChannelHost>>,
    pub prompt: Option<Arc<dyn PromptHost>>,
}

impl HostEnvironment {
    /// Environment with no host capabilities (web-only mode)
    pub fn web_only() -> Self {
        Self::default()
    }

    pub fn with_native_bridge(mut self, bridge: Arc<dyn NativeBridgeHost>) -> Self {
        self.native_bridge = Some(bridge);
        self
    }

    pub fn with_plugins(mut self, registry: Arc<dyn PluginRegistry>) -> Self {
        self.plugins = Some(registry);
        self
    }

    pub fn with_custom_bridge(mut self, bridge: Arc<dyn CustomBridgeHost>) -> Self {
        self.custom_bridge = Some(bridge);
        self
    }

    pub fn with_message_channel(mut self, channel: Arc<dyn MessageChannelHost>) -> Self {
        self.message_channel = Some(channel);
        self
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn PromptHost>) -> Self {
        self.prompt = Some(prompt);
        self
    }
}

impl fmt::Debug for HostEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostEnvironment")
            .field("native_bridge", &self.native_bridge.is_some())
            .field("plugins", &self.plugins.is_some())
            .field("custom_bridge", &self.custom_bridge.is_some())
            .field("message_channel", &self.message_channel.is_some())
            .field("prompt", &self.prompt.is_some())
            .finish()
    }
}
