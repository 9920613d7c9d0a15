//! Transport adapter resolution
//!
//! Host capabilities are probed in a fixed priority order and the first usable
//! one wins. Absence of every capability is web-only mode, not an error.

use std::sync::Arc;
use std::time::Duration;

use edge_core::{BridgeType, ROUTE_CONFIG_PLUGIN};
use tracing::{debug, info};

use super::adapters::{
    CustomBridgeAdapter, NativeBridgeAdapter, PluginBridgeAdapter, PostMessageAdapter,
    PromptAdapter, TransportHandle,
};
use super::callbacks::BridgeCallbacks;
use super::host::HostEnvironment;

/// Default response deadline for the message-channel bridge
pub const DEFAULT_POST_MESSAGE_TIMEOUT_MS: u64 = 5000;

/// Default response deadline for the prompt bridge
pub const DEFAULT_PROMPT_TIMEOUT_MS: u64 = 10000;

/// Response deadlines for the correlated bridges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeTimeouts {
    pub post_message: Duration,
    pub prompt: Duration,
}

impl Default for BridgeTimeouts {
    fn default() -> Self {
        Self {
            post_message: Duration::from_millis(DEFAULT_POST_MESSAGE_TIMEOUT_MS),
            prompt: Duration::from_millis(DEFAULT_PROMPT_TIMEOUT_MS),
        }
    }
}

// ----------------------------------------------------------------------------
// Capability Probes
// ----------------------------------------------------------------------------

struct CapabilityProbe {
    bridge_type: BridgeType,
    connect: fn(&BridgeResolver) -> Option<TransportHandle>,
}

/// Highest priority first
const CAPABILITY_PROBES: [CapabilityProbe; 5] = [
    CapabilityProbe {
        bridge_type: BridgeType::NativeBridge,
        connect: connect_native,
    },
    CapabilityProbe {
        bridge_type: BridgeType::PluginBridge,
        connect: connect_plugin,
    },
    CapabilityProbe {
        bridge_type: BridgeType::CustomBridge,
        connect: connect_custom,
    },
    CapabilityProbe {
        bridge_type: BridgeType::PostMessageBridge,
        connect: connect_post_message,
    },
    CapabilityProbe {
        bridge_type: BridgeType::PromptBridge,
        connect: connect_prompt,
    },
];

fn connect_native(resolver: &BridgeResolver) -> Option<TransportHandle> {
    resolver
        .host
        .native_bridge
        .as_ref()
        .filter(|bridge| bridge.is_native())
        .map(|bridge| TransportHandle::Native(NativeBridgeAdapter::new(Arc::clone(bridge))))
}

fn connect_plugin(resolver: &BridgeResolver) -> Option<TransportHandle> {
    resolver
        .host
        .plugins
        .as_ref()
        .and_then(|registry| registry.plugin(ROUTE_CONFIG_PLUGIN))
        .map(|plugin| TransportHandle::Plugin(PluginBridgeAdapter::new(plugin)))
}

fn connect_custom(resolver: &BridgeResolver) -> Option<TransportHandle> {
    resolver
        .host
        .custom_bridge
        .as_ref()
        .map(|bridge| TransportHandle::Custom(CustomBridgeAdapter::new(Arc::clone(bridge))))
}

fn connect_post_message(resolver: &BridgeResolver) -> Option<TransportHandle> {
    resolver.host.message_channel.as_ref().map(|channel| {
        TransportHandle::PostMessage(PostMessageAdapter::new(
            Arc::clone(channel),
            resolver.callbacks.clone(),
            resolver.timeouts.post_message,
        ))
    })
}

fn connect_prompt(resolver: &BridgeResolver) -> Option<TransportHandle> {
    resolver.host.prompt.as_ref().map(|prompt| {
        TransportHandle::Prompt(PromptAdapter::new(
            Arc::clone(prompt),
            resolver.callbacks.clone(),
            resolver.timeouts.prompt,
        ))
    })
}

// ----------------------------------------------------------------------------
// Bridge Resolver
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BridgeResolver {
    host: HostEnvironment,
    callbacks: BridgeCallbacks,
    timeouts: BridgeTimeouts,
}

impl BridgeResolver {
    pub fn new(host: HostEnvironment) -> Self {
        Self::with_timeouts(host, BridgeTimeouts::default())
    }

    pub fn with_timeouts(host: HostEnvironment, timeouts: BridgeTimeouts) -> Self {
        Self {
            host,
            callbacks: BridgeCallbacks::new(),
            timeouts,
        }
    }

    /// Select the highest-priority available bridge. `None` means web-only.
    pub fn resolve(&self) -> Option<TransportHandle> {
        for probe in CAPABILITY_PROBES.iter() {
            match (probe.connect)(self) {
                Some(handle) => {
                    info!(bridge = %probe.bridge_type, "host bridge detected");
                    return Some(handle);
                }
                None => debug!(bridge = %probe.bridge_type, "host bridge unavailable"),
            }
        }

        info!("no host bridge detected, running in web-only mode");
        None
    }

    /// Registry the host uses to deliver correlated responses
    pub fn callbacks(&self) -> &BridgeCallbacks {
        &self.callbacks
    }
}
