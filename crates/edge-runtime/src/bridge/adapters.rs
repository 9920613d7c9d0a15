//! Transport adapters
//!
//! One adapter per host mechanism. Each pushes a `RouteConfigPayload` and
//! resolves to the host's result value, or `Null` for fire-and-forget hosts.

use std::sync::Arc;
use std::time::Duration;

use edge_core::{
    prompt_callback_key, BridgeRequest, BridgeType, HostError, RouteConfigPayload,
    TransportError, SET_ROUTE_CONFIG,
};
use serde_json::Value;
use tracing::debug;

use super::callbacks::{correlation_id, BridgeCallbacks};
use super::host::{ConfigPlugin, CustomBridgeHost, MessageChannelHost, NativeBridgeHost, PromptHost};

fn host_failure(bridge: BridgeType) -> impl FnOnce(HostError) -> TransportError {
    move |source| TransportError::Host {
        bridge: bridge.as_str(),
        source,
    }
}

// ----------------------------------------------------------------------------
// Synchronous Adapters
// ----------------------------------------------------------------------------

pub struct NativeBridgeAdapter {
    host: Arc<dyn NativeBridgeHost>,
}

impl NativeBridgeAdapter {
    pub fn new(host: Arc<dyn NativeBridgeHost>) -> Self {
        Self { host }
    }

    fn push(&self, payload: &RouteConfigPayload) -> Result<Value, TransportError> {
        self.host
            .call(SET_ROUTE_CONFIG, payload)
            .map(|_| Value::Null)
            .map_err(host_failure(BridgeType::NativeBridge))
    }
}

pub struct PluginBridgeAdapter {
    plugin: Arc<dyn ConfigPlugin>,
}

impl PluginBridgeAdapter {
    pub fn new(plugin: Arc<dyn ConfigPlugin>) -> Self {
        Self { plugin }
    }

    async fn push(&self, payload: &RouteConfigPayload) -> Result<Value, TransportError> {
        self.plugin
            .set_route_config(payload)
            .await
            .map_err(host_failure(BridgeType::PluginBridge))
    }
}

pub struct CustomBridgeAdapter {
    host: Arc<dyn CustomBridgeHost>,
}

impl CustomBridgeAdapter {
    pub fn new(host: Arc<dyn CustomBridgeHost>) -> Self {
        Self { host }
    }

    fn push(&self, payload: &RouteConfigPayload) -> Result<Value, TransportError> {
        self.host
            .set_route_config(payload)
            .map(|_| Value::Null)
            .map_err(host_failure(BridgeType::CustomBridge))
    }
}

// ----------------------------------------------------------------------------
// Correlated Adapters
// ----------------------------------------------------------------------------

/// Posts a request envelope and waits for the matching response
pub struct PostMessageAdapter {
    channel: Arc<dyn MessageChannelHost>,
    callbacks: BridgeCallbacks,
    timeout: Duration,
}

impl PostMessageAdapter {
    pub fn new(
        channel: Arc<dyn MessageChannelHost>,
        callbacks: BridgeCallbacks,
        timeout: Duration,
    ) -> Self {
        Self {
            channel,
            callbacks,
            timeout,
        }
    }

    async fn push(&self, payload: &RouteConfigPayload) -> Result<Value, TransportError> {
        let id = correlation_id();
        // Registered before posting so an immediate reply is not lost
        let pending = self.callbacks.register(id.clone());
        let request = BridgeRequest::set_route_config(payload.clone(), id);

        debug!(correlation_id = %request.correlation_id, "posting route config");
        self.channel
            .post_message(&request)
            .map_err(host_failure(BridgeType::PostMessageBridge))?;

        pending
            .wait(BridgeType::PostMessageBridge.as_str(), self.timeout)
            .await
    }
}

/// Sends the serialized envelope through a blocking prompt and waits for the
/// `$<correlationId>` callback
pub struct PromptAdapter {
    prompt: Arc<dyn PromptHost>,
    callbacks: BridgeCallbacks,
    timeout: Duration,
}

impl PromptAdapter {
    pub fn new(prompt: Arc<dyn PromptHost>, callbacks: BridgeCallbacks, timeout: Duration) -> Self {
        Self {
            prompt,
            callbacks,
            timeout,
        }
    }

    async fn push(&self, payload: &RouteConfigPayload) -> Result<Value, TransportError> {
        let id = correlation_id();
        let key = prompt_callback_key(&id);
        let request = BridgeRequest::set_route_config(payload.clone(), id);
        let message = serde_json::to_string(&request).map_err(|e| {
            TransportError::Serialization {
                reason: e.to_string(),
            }
        })?;

        let pending = self.callbacks.register(key);
        self.prompt
            .prompt(&message)
            .map_err(host_failure(BridgeType::PromptBridge))?;

        pending
            .wait(BridgeType::PromptBridge.as_str(), self.timeout)
            .await
    }
}

// ----------------------------------------------------------------------------
// Transport Handle
// ----------------------------------------------------------------------------

/// The bridge chosen at init
pub enum TransportHandle {
    Native(NativeBridgeAdapter),
    Plugin(PluginBridgeAdapter),
    Custom(CustomBridgeAdapter),
    PostMessage(PostMessageAdapter),
    Prompt(PromptAdapter),
}

impl TransportHandle {
    pub fn bridge_type(&self) -> BridgeType {
        match self {
            TransportHandle::Native(_) => BridgeType::NativeBridge,
            TransportHandle::Plugin(_) => BridgeType::PluginBridge,
            TransportHandle::Custom(_) => BridgeType::CustomBridge,
            TransportHandle::PostMessage(_) => BridgeType::PostMessageBridge,
            TransportHandle::Prompt(_) => BridgeType::PromptBridge,
        }
    }

    /// Push a routing payload to the host
    pub async fn push_route_config(
        &self,
        payload: &RouteConfigPayload,
    ) -> Result<Value, TransportError> {
        match self {
            TransportHandle::Native(adapter) => adapter.push(payload),
            TransportHandle::Plugin(adapter) => adapter.push(payload).await,
            TransportHandle::Custom(adapter) => adapter.push(payload),
            TransportHandle::PostMessage(adapter) => adapter.push(payload).await,
            TransportHandle::Prompt(adapter) => adapter.push(payload).await,
        }
    }
}

impl std::fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TransportHandle")
            .field(&self.bridge_type())
            .finish()
    }
}
