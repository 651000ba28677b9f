use std::time::Duration;

use faultline_stub::{Fault, StubState, spawn_ephemeral};
use faultline_types::{EdgeId, HealthStatus, ProtocolError};
use faultline_view::{FetchError, FetchHint, HttpSnapshotClient, SnapshotSource};

// Second 75 of a 120 s cycle: inside the payment outage.
const PAYMENT_OUTAGE: i64 = 1_700_000_040_000 + 75_000;

async fn client_for(state: &StubState) -> HttpSnapshotClient {
    let (addr, _server) = spawn_ephemeral(state.clone())
        .await
        .expect("bind stub backend");
    HttpSnapshotClient::new(format!("http://{addr}"), Duration::from_secs(5))
}

#[tokio::test]
async fn exact_fetch_returns_requested_instant() {
    let state = StubState::new();
    let client = client_for(&state).await;

    let snapshot = client
        .fetch(FetchHint::Exact(PAYMENT_OUTAGE))
        .await
        .expect("snapshot");

    assert_eq!(snapshot.timestamp(), PAYMENT_OUTAGE);
    assert_eq!(
        snapshot.node("payment-gateway").map(|node| node.health_status),
        Some(HealthStatus::Down)
    );
    let edge = snapshot
        .edge(&EdgeId::new("order-service", "payment-gateway"))
        .expect("payment edge");
    assert!(edge.is_active);
    assert_eq!(state.requested(), vec![PAYMENT_OUTAGE]);
}

#[tokio::test]
async fn live_fetch_sends_advisory_timestamp() {
    let state = StubState::new();
    let client = client_for(&state).await;

    client
        .fetch(FetchHint::Live { advisory_ms: 42_000 })
        .await
        .expect("snapshot");
    assert_eq!(state.requested(), vec![42_000]);
}

#[tokio::test]
async fn server_error_is_network_error() {
    let state = StubState::new();
    state.inject(Fault::ServerError);
    let client = client_for(&state).await;

    let err = client
        .fetch(FetchHint::Exact(PAYMENT_OUTAGE))
        .await
        .expect_err("injected 500");
    match err {
        FetchError::Network(message) => assert!(message.contains("500"), "{message}"),
        other => panic!("expected network error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_protocol_error() {
    let state = StubState::new();
    state.inject(Fault::MalformedBody);
    let client = client_for(&state).await;

    assert!(matches!(
        client.fetch(FetchHint::Exact(1)).await,
        Err(FetchError::Protocol(ProtocolError::Decode(_)))
    ));
}

#[tokio::test]
async fn dangling_edge_is_protocol_error() {
    let state = StubState::new();
    state.inject(Fault::DanglingEdge);
    let client = client_for(&state).await;

    let err = client
        .fetch(FetchHint::Exact(1))
        .await
        .expect_err("dangling edge");
    assert!(matches!(
        err,
        FetchError::Protocol(ProtocolError::UnknownEndpoint { ref missing, .. })
            if missing == "decommissioned-service"
    ));

    // The fault was used up; the next fetch succeeds.
    assert!(client.fetch(FetchHint::Exact(1)).await.is_ok());
}

#[tokio::test]
async fn raw_body_and_cors_headers() {
    let state = StubState::new();
    let client = client_for(&state).await;

    let raw = tokio::task::spawn_blocking({
        let client = client.clone();
        move || client.fetch_raw_blocking(FetchHint::Exact(PAYMENT_OUTAGE))
    })
    .await
    .expect("join")
    .expect("raw body");
    assert!(raw.contains("\"payment-gateway\""), "{raw}");

    let url = client.graph_url(FetchHint::Exact(1));
    let origin = tokio::task::spawn_blocking(move || {
        ureq::get(&url)
            .call()
            .map(|response| response.header("access-control-allow-origin").map(str::to_string))
    })
    .await
    .expect("join")
    .expect("GET");
    assert_eq!(origin.as_deref(), Some("*"));
}

