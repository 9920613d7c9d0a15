//! Integration tests for the edge controller against a real HTTP endpoint
//!
//! A wiremock server stands in for the local server's health endpoint. Host
//! bridges are in-process fakes implementing the capability traits.

use std::sync::Arc;
use std::time::Duration;

use edge_core::{
    BridgeRequest, BridgeResponse, BridgeType, EdgeEvent, HostError, RouteConfigPayload,
    RoutingOptions,
};
use edge_runtime::{
    BridgeTimeouts, EdgeController, HostEnvironment, HttpLivenessProber, LivenessProbe,
    MessageChannelHost,
};
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ----------------------------------------------------------------------------
// Test Utilities
// ----------------------------------------------------------------------------

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn domains(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn options_for(url: String) -> RoutingOptions {
    RoutingOptions::new(url)
        .probe_interval_ms(60_000)
        .probe_timeout_ms(1000)
        .allow_list(["a.com"])
        .deny_list(["b.com"])
}

async fn next_event(rx: &mut broadcast::Receiver<EdgeEvent>) -> EdgeEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event should arrive within timeout")
        .expect("event channel should stay open")
}

async fn next_config(rx: &mut broadcast::Receiver<EdgeEvent>) -> (bool, RouteConfigPayload) {
    loop {
        if let EdgeEvent::ConfigChanged {
            is_alive, payload, ..
        } = next_event(rx).await
        {
            return (is_alive, payload);
        }
    }
}

async fn mount_healthy(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

/// Message channel that hands every posted request to the test
struct ForwardingChannel {
    tx: mpsc::UnboundedSender<BridgeRequest>,
}

impl MessageChannelHost for ForwardingChannel {
    fn post_message(&self, request: &BridgeRequest) -> Result<(), HostError> {
        self.tx
            .send(request.clone())
            .map_err(|_| HostError::new("channel closed"))
    }
}

// ----------------------------------------------------------------------------
// Routing Scenarios
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_refused_connection_then_recovery() {
    init_tracing();
    let server = MockServer::start().await;
    let controller = EdgeController::web_only();
    let mut rx = controller.subscribe();

    // Nothing listens on the discard port
    controller
        .init(options_for("http://127.0.0.1:9/health".to_string()))
        .await
        .unwrap();

    let (is_alive, payload) = next_config(&mut rx).await;
    assert!(!is_alive);
    assert_eq!(
        payload,
        RouteConfigPayload {
            allow_list: Vec::new(),
            deny_list: domains(&["b.com"]),
            route_all_local: false,
            prefer_local: false,
            local_enabled: false,
        }
    );
    controller.destroy();

    // Same configuration against an endpoint that answers 200
    mount_healthy(&server).await;
    controller
        .init(options_for(format!("{}/health", server.uri())))
        .await
        .unwrap();
    next_config(&mut rx).await;

    assert!(controller.manual_check().await.unwrap());
    let (is_alive, payload) = next_config(&mut rx).await;
    assert!(is_alive);
    assert_eq!(payload.allow_list, domains(&["a.com"]));
    assert!(payload.route_all_local);
    assert!(controller.status().is_alive);
}

#[tokio::test]
async fn test_manual_check_after_endpoint_recovers() {
    init_tracing();
    let server = MockServer::start().await;
    let controller = EdgeController::web_only();
    let mut rx = controller.subscribe();

    // No mock mounted yet: wiremock answers 404
    controller
        .init(options_for(format!("{}/health", server.uri())))
        .await
        .unwrap();
    let (is_alive, _) = next_config(&mut rx).await;
    assert!(!is_alive);

    mount_healthy(&server).await;
    assert!(controller.manual_check().await.unwrap());

    let (is_alive, payload) = next_config(&mut rx).await;
    assert!(is_alive);
    assert_eq!(payload.allow_list, domains(&["a.com"]));
}

#[tokio::test]
async fn test_allow_list_update_while_alive_reemits() {
    init_tracing();
    let server = MockServer::start().await;
    mount_healthy(&server).await;
    let controller = EdgeController::web_only();
    let mut rx = controller.subscribe();

    controller
        .init(options_for(format!("{}/health", server.uri())))
        .await
        .unwrap();
    let (is_alive, _) = next_config(&mut rx).await;
    assert!(is_alive);

    controller.update_allow_list(domains(&["c.com"])).unwrap();

    let (is_alive, payload) = next_config(&mut rx).await;
    assert!(is_alive);
    assert_eq!(payload.allow_list, domains(&["c.com"]));
    assert_eq!(payload.deny_list, domains(&["b.com"]));
}

#[tokio::test]
async fn test_deny_list_update_while_down_keeps_allow_empty() {
    init_tracing();
    let server = MockServer::start().await;
    let controller = EdgeController::web_only();
    let mut rx = controller.subscribe();

    controller
        .init(options_for(format!("{}/health", server.uri())))
        .await
        .unwrap();
    next_config(&mut rx).await;

    controller.update_deny_list(domains(&["d.com"])).unwrap();

    let (is_alive, payload) = next_config(&mut rx).await;
    assert!(!is_alive);
    assert!(payload.allow_list.is_empty());
    assert_eq!(payload.deny_list, domains(&["d.com"]));
    assert_eq!(controller.status().deny_list, domains(&["d.com"]));
}

// ----------------------------------------------------------------------------
// Prober Behavior
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_probe_sends_health_check_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .and(header("X-Health-Check", "true"))
        .and(header("Cache-Control", "no-cache"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let prober = HttpLivenessProber::new(
        format!("{}/health", server.uri()),
        Duration::from_millis(1000),
    )
    .unwrap();

    assert!(prober.probe().await);
    server.verify().await;
}

#[tokio::test]
async fn test_concurrent_probe_is_suppressed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let prober = HttpLivenessProber::new(
        format!("{}/health", server.uri()),
        Duration::from_millis(2000),
    )
    .unwrap();

    let first = prober.probe();
    let second = async {
        // Let the first probe claim the in-flight slot
        tokio::time::sleep(Duration::from_millis(50)).await;
        prober.probe().await
    };
    let (first, second) = tokio::join!(first, second);

    assert!(first);
    // Suppressed probe reports the value from before the first one finished
    assert!(!second);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_slow_endpoint_times_out_as_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(2000)))
        .mount(&server)
        .await;

    let prober = HttpLivenessProber::new(
        format!("{}/health", server.uri()),
        Duration::from_millis(500),
    )
    .unwrap();

    assert!(!prober.probe().await);
    assert!(!prober.state().is_probe_in_flight());
}

#[tokio::test]
async fn test_server_error_reduces_to_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let prober = HttpLivenessProber::new(
        format!("{}/health", server.uri()),
        Duration::from_millis(1000),
    )
    .unwrap();

    assert!(!prober.probe().await);
}

// ----------------------------------------------------------------------------
// Host Bridge Delivery
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_post_message_bridge_round_trip() {
    init_tracing();
    let server = MockServer::start().await;
    mount_healthy(&server).await;

    let (tx, mut requests) = mpsc::unbounded_channel();
    let host = HostEnvironment::web_only().with_message_channel(Arc::new(ForwardingChannel { tx }));
    let controller = EdgeController::new(host);
    let callbacks = controller.bridge_callbacks();
    let mut rx = controller.subscribe();

    controller
        .init(options_for(format!("{}/health", server.uri())))
        .await
        .unwrap();
    assert_eq!(controller.bridge_type(), BridgeType::PostMessageBridge);

    let request = timeout(Duration::from_secs(5), requests.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.method, "setRouteConfig");
    assert_eq!(request.params.allow_list, domains(&["a.com"]));
    assert!(callbacks.deliver(BridgeResponse::ok(
        request.correlation_id,
        serde_json::json!({"applied": true})
    )));

    // The config change is broadcast whether or not the host has answered
    match next_event(&mut rx).await {
        EdgeEvent::ConfigChanged { is_alive, .. } => assert!(is_alive),
        other => panic!("expected config-changed, got {:?}", other),
    }
    assert_eq!(callbacks.pending_count(), 0);
}

#[tokio::test]
async fn test_bridge_timeout_follows_config_with_error() {
    init_tracing();
    let server = MockServer::start().await;
    mount_healthy(&server).await;

    // Requests are accepted but never answered
    let (tx, mut requests) = mpsc::unbounded_channel();
    let host = HostEnvironment::web_only().with_message_channel(Arc::new(ForwardingChannel { tx }));
    let controller = EdgeController::with_bridge_timeouts(
        host,
        BridgeTimeouts {
            post_message: Duration::from_millis(100),
            prompt: Duration::from_millis(100),
        },
    );
    let callbacks = controller.bridge_callbacks();
    let mut rx = controller.subscribe();

    controller
        .init(options_for(format!("{}/health", server.uri())))
        .await
        .unwrap();

    // Broadcast locally without waiting on the bridge
    match next_event(&mut rx).await {
        EdgeEvent::ConfigChanged { is_alive, .. } => assert!(is_alive),
        other => panic!("expected config-changed, got {:?}", other),
    }
    match next_event(&mut rx).await {
        EdgeEvent::BridgeError { message, .. } => assert!(message.contains("timed out")),
        other => panic!("expected bridge-error, got {:?}", other),
    }

    // The late reply finds no waiter
    let request = requests.recv().await.unwrap();
    assert_eq!(callbacks.pending_count(), 0);
    assert!(!callbacks.deliver(BridgeResponse::ok(
        request.correlation_id,
        serde_json::Value::Null
    )));
}

#[tokio::test]
async fn test_reinit_after_destroy_resolves_again() {
    init_tracing();
    let server = MockServer::start().await;
    mount_healthy(&server).await;
    let controller = EdgeController::web_only();

    controller
        .init(options_for(format!("{}/health", server.uri())))
        .await
        .unwrap();
    controller.destroy();
    assert!(!controller.status().initialized);

    let mut rx = controller.subscribe();
    controller
        .init(options_for(format!("{}/health", server.uri())).logging_enabled(false))
        .await
        .unwrap();

    let (is_alive, _) = next_config(&mut rx).await;
    assert!(is_alive);
    assert!(controller.status().initialized);
    assert_eq!(controller.bridge_type(), BridgeType::None);
}
