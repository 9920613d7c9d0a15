//! Host bridge layer
//!
//! Capability traits the embedding shell implements, one adapter per
//! mechanism, the correlation registry for asynchronous replies, and the
//! resolver that picks a single bridge at init.

pub mod adapters;
pub mod callbacks;
pub mod host;
pub mod resolver;

pub use adapters::TransportHandle;
pub use callbacks::BridgeCallbacks;
pub use host::{
    ConfigPlugin, CustomBridgeHost, HostEnvironment, MessageChannelHost, NativeBridgeHost,
    PluginRegistry, PromptHost,
};
pub use resolver::{BridgeResolver, BridgeTimeouts};
