//! Correlation registry for asynchronous bridges
//!
//! Every asynchronous push registers a one-shot waiter under its correlation
//! key before the request leaves, and the waiter is removed again when the
//! response arrives, when the deadline passes, or when the push is dropped.
//! A response for a key that is no longer registered is dropped.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use edge_core::{now_millis, BridgeResponse, TransportError};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

/// Host reply: a result value or a rejection reason
type Reply = Result<Value, String>;

/// Generate a unique correlation id
pub(crate) fn correlation_id() -> String {
    format!("cb_{}_{}", now_millis(), Uuid::new_v4().simple())
}

// ----------------------------------------------------------------------------
// Bridge Callbacks
// ----------------------------------------------------------------------------

/// Handle through which the host delivers bridge responses.
///
/// Cheap to clone; all clones share one registry.
#[derive(Clone, Default)]
pub struct BridgeCallbacks {
    pending: Arc<DashMap<String, oneshot::Sender<Reply>>>,
}

impl BridgeCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a message-bridge response. Returns `false` if nothing was waiting.
    pub fn deliver(&self, response: BridgeResponse) -> bool {
        match response.error {
            Some(reason) => self.reject(&response.correlation_id, reason),
            None => self.resolve(
                &response.correlation_id,
                response.result.unwrap_or(Value::Null),
            ),
        }
    }

    /// Complete the waiter registered under `key` with a result
    pub fn resolve(&self, key: &str, value: Value) -> bool {
        self.complete(key, Ok(value))
    }

    /// Fail the waiter registered under `key`
    pub fn reject<R: Into<String>>(&self, key: &str, reason: R) -> bool {
        self.complete(key, Err(reason.into()))
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn register(&self, key: String) -> PendingReply {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(key.clone(), tx);
        PendingReply {
            key,
            rx,
            registry: self.clone(),
        }
    }

    fn complete(&self, key: &str, reply: Reply) -> bool {
        match self.pending.remove(key) {
            Some((_, tx)) => tx.send(reply).is_ok(),
            None => {
                debug!(key, "dropping response with no registered waiter");
                false
            }
        }
    }
}

impl std::fmt::Debug for BridgeCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeCallbacks")
            .field("pending", &self.pending.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Pending Reply
// ----------------------------------------------------------------------------

/// Waiter for one correlated response. Deregisters itself on drop.
pub(crate) struct PendingReply {
    key: String,
    rx: oneshot::Receiver<Reply>,
    registry: BridgeCallbacks,
}

impl PendingReply {
    /// Wait for the response until `deadline` passes
    pub(crate) async fn wait(
        mut self,
        bridge: &'static str,
        deadline: Duration,
    ) -> Result<Value, TransportError> {
        match tokio::time::timeout(deadline, &mut self.rx).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(reason))) => Err(TransportError::Rejected { bridge, reason }),
            Ok(Err(_)) => Err(TransportError::WaiterDropped {
                correlation_id: self.key.clone(),
            }),
            Err(_) => {
                warn!(bridge, key = %self.key, "bridge call timed out");
                Err(TransportError::Timeout {
                    bridge,
                    duration_ms: deadline.as_millis() as u64,
                })
            }
        }
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.registry.pending.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_ids_are_unique() {
        let a = correlation_id();
        let b = correlation_id();
        assert!(a.starts_with("cb_"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_resolve_completes_waiter() {
        let callbacks = BridgeCallbacks::new();
        let pending = callbacks.register("cb_1".to_string());
        assert!(callbacks.is_pending("cb_1"));

        assert!(callbacks.resolve("cb_1", serde_json::json!({"ok": true})));
        let value = pending.wait("test", Duration::from_secs(1)).await.unwrap();

        assert_eq!(value, serde_json::json!({"ok": true}));
        assert_eq!(callbacks.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_error_response_rejects() {
        let callbacks = BridgeCallbacks::new();
        let pending = callbacks.register("cb_2".to_string());

        assert!(callbacks.deliver(BridgeResponse::err("cb_2", "denied")));
        let err = pending.wait("test", Duration::from_secs(1)).await.unwrap_err();

        assert_eq!(
            err,
            TransportError::Rejected {
                bridge: "test",
                reason: "denied".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_deregisters_and_drops_late_reply() {
        let callbacks = BridgeCallbacks::new();
        let pending = callbacks.register("cb_3".to_string());

        let err = pending
            .wait("test", Duration::from_millis(5000))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(callbacks.pending_count(), 0);
        assert!(!callbacks.resolve("cb_3", Value::Null));
    }

    #[test]
    fn test_dropping_waiter_deregisters() {
        let callbacks = BridgeCallbacks::new();
        let pending = callbacks.register("cb_4".to_string());
        drop(pending);
        assert!(!callbacks.is_pending("cb_4"));
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let callbacks = BridgeCallbacks::new();
        assert!(!callbacks.deliver(BridgeResponse::ok("missing", Value::Null)));
    }
}
