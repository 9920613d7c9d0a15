//! Error types for the edge routing runtime
//!
//! This module contains the error taxonomy shared by every crate in the
//! workspace: configuration validation errors, host bridge transport errors,
//! and the main `EdgeError` type that unifies them for the public API.

use thiserror::Error;

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Configuration validation failures. Fatal to `init`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("probeUrl is required")]
    MissingProbeUrl,
    #[error("probeIntervalMs must be at least {min}ms, got {value}ms")]
    IntervalTooShort { value: u64, min: u64 },
    #[error("probeTimeoutMs must be at least {min}ms, got {value}ms")]
    TimeoutTooShort { value: u64, min: u64 },
    #[error("Malformed configuration: {reason}")]
    Malformed { reason: String },
}

/// Failure reported by a host capability (native call, plugin, message post, prompt)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new<T: Into<String>>(message: T) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Host bridge push failures. Logged and broadcast, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("{bridge} bridge call failed: {source}")]
    Host {
        bridge: &'static str,
        #[source]
        source: HostError,
    },
    #[error("{bridge} bridge call timed out after {duration_ms}ms")]
    Timeout {
        bridge: &'static str,
        duration_ms: u64,
    },
    #[error("{bridge} bridge rejected the request: {reason}")]
    Rejected {
        bridge: &'static str,
        reason: String,
    },
    #[error("Failed to serialize bridge request: {reason}")]
    Serialization { reason: String },
    #[error("Response waiter for {correlation_id} was dropped")]
    WaiterDropped { correlation_id: String },
}

// ----------------------------------------------------------------------------
// Main Error Type
// ----------------------------------------------------------------------------

/// Errors surfaced by the public controller API
#[derive(Debug, Error)]
pub enum EdgeError {
    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Edge runtime is not initialized")]
    NotInitialized,

    #[error("Startup failed: {reason}")]
    Startup { reason: String },
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl EdgeError {
    /// Create a startup error with a reason
    pub fn startup<T: Into<String>>(reason: T) -> Self {
        EdgeError::Startup {
            reason: reason.into(),
        }
    }

    /// Whether this error came from configuration validation
    pub fn is_validation(&self) -> bool {
        matches!(self, EdgeError::Validation(_))
    }
}

impl TransportError {
    /// Whether the push failed because no response arrived in time
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, EdgeError>;
