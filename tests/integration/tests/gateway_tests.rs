//! Gateway Integration Tests
//!
//! Each test starts one or more gateways on ephemeral ports with in-memory
//! backends; no external services are needed.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::sync::Arc;
use std::time::Duration;

use dawn_cache::MemoryPubSub;
use dawn_core::ParticipantId;
use dawn_db::MemoryChatStore;
use dawn_service::MessageService;
use integration_tests::*;
use reqwest::StatusCode;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;

const QUIET: Duration = Duration::from_millis(200);

// ============================================================================
// Health and handshake
// ============================================================================

#[tokio::test]
async fn test_health_reports_bridge_and_connections() {
    let server = TestServer::start().await.unwrap();
    let _p1 = server.connect(1).await.unwrap();

    let response = server.get("/health").await.unwrap();
    let health: HealthResponse = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(health.status, "ok");
    assert_eq!(health.pubsub, "active");
    assert_eq!(health.connections, 1);
}

#[tokio::test]
async fn test_handshake_without_token_is_unauthorized() {
    let server = TestServer::start().await.unwrap();

    match connect_async(server.ws_url(None)).await {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 401),
        other => panic!("expected a 401 handshake, got {:?}", other.map(|_| ())),
    }
    match connect_async(server.ws_url(Some("not-a-jwt"))).await {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 401),
        other => panic!("expected a 401 handshake, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_ready_uses_the_first_known_name() {
    let server = TestServer::start().await.unwrap();

    let (first, ready) = server.connect_as(5, "Misty").await.unwrap();
    assert_eq!(ready["participant_id"], 5);
    assert_eq!(ready["display_name"], "Misty");
    assert!(ready["connection_id"].as_str().is_some_and(|id| !id.is_empty()));

    // The profile already exists, so a later token's name is ignored
    let (_second, ready) = server.connect_as(5, "Someone Else").await.unwrap();
    assert_eq!(ready["display_name"], "Misty");

    first.close().await.unwrap();
}

// ============================================================================
// Rooms and messages
// ============================================================================

// P1 and P2 are members of R42; P3 is not
#[tokio::test]
async fn test_room_members_exchange_messages() {
    let server = TestServer::start().await.unwrap();
    let room = create_room(&server.state, "R42", &[1, 2]).await.unwrap();
    let mut p1 = server.connect(1).await.unwrap();
    let mut p2 = server.connect(2).await.unwrap();
    let mut p3 = server.connect(3).await.unwrap();

    p1.send(join_frame(room, 1)).await.unwrap();
    assert_eq!(p1.expect("room:joined").await.unwrap()["room_id"], room.into_inner());
    p2.send(join_frame(room, 2)).await.unwrap();
    p2.expect("room:joined").await.unwrap();

    p1.send(send_frame(room, 1, "hi")).await.unwrap();

    let to_p1 = p1.expect("message:new").await.unwrap();
    let to_p2 = p2.expect("message:new").await.unwrap();
    assert_eq!(to_p1["id"], to_p2["id"]);
    assert_eq!(to_p2["content"], "hi");
    assert_eq!(to_p2["sender_nickname"], "Trainer 1");

    // P3 sees the sidebar update but never the message
    let frames = p3.drain(QUIET).await.unwrap();
    assert!(frames.iter().any(|(event, _)| event == "room:updated"));
    assert!(frames.iter().all(|(event, _)| event != "message:new"));

    p3.send(send_frame(room, 3, "x")).await.unwrap();
    assert_eq!(p3.expect("error").await.unwrap()["code"], "NOT_ROOM_MEMBER");
    let frames = p2.drain(QUIET).await.unwrap();
    assert!(frames.iter().all(|(event, _)| event != "message:new"));

    let history = MessageService::new(server.state.services())
        .get_recent(room, ParticipantId::new(2), None)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content.as_deref(), Some("hi"));
}

#[tokio::test]
async fn test_sequential_sends_keep_order() {
    let server = TestServer::start().await.unwrap();
    let room = create_room(&server.state, "Ordering", &[1, 2]).await.unwrap();
    let mut p1 = server.connect(1).await.unwrap();
    let mut p2 = server.connect(2).await.unwrap();
    p1.send(join_frame(room, 1)).await.unwrap();
    p1.expect("room:joined").await.unwrap();
    p2.send(join_frame(room, 2)).await.unwrap();
    p2.expect("room:joined").await.unwrap();

    for content in ["A", "B", "C"] {
        p1.send(send_frame(room, 1, content)).await.unwrap();
    }

    let mut received = Vec::new();
    for _ in 0..3 {
        let message = p2.expect("message:new").await.unwrap();
        received.push(message["content"].as_str().unwrap().to_string());
    }
    assert_eq!(received, ["A", "B", "C"]);
}

#[tokio::test]
async fn test_leave_and_unknown_events() {
    let server = TestServer::start().await.unwrap();
    let room = create_room(&server.state, "Lobby", &[1, 2]).await.unwrap();
    let mut p1 = server.connect(1).await.unwrap();
    let mut p2 = server.connect(2).await.unwrap();
    p2.send(join_frame(room, 2)).await.unwrap();
    p2.expect("room:joined").await.unwrap();
    p2.send(leave_frame(room)).await.unwrap();

    p2.send(serde_json::json!({"event": "room:explode", "data": {}})).await.unwrap();
    let error = p2.expect("error").await.unwrap();
    assert_eq!(error["code"], "UNKNOWN_MESSAGE");

    p1.send(send_frame(room, 1, "after leave")).await.unwrap();
    let frames = p2.drain(QUIET).await.unwrap();
    assert!(frames.iter().all(|(event, _)| event != "message:new"));
}

// ============================================================================
// Typing
// ============================================================================

#[tokio::test]
async fn test_typing_indicator_lapses_without_stop() {
    let server = TestServer::start().await.unwrap();
    let room = create_room(&server.state, "Typing", &[1, 2]).await.unwrap();
    let mut p1 = server.connect(1).await.unwrap();
    let mut p2 = server.connect(2).await.unwrap();
    p1.send(join_frame(room, 1)).await.unwrap();
    p1.expect("room:joined").await.unwrap();
    p2.send(join_frame(room, 2)).await.unwrap();
    p2.expect("room:joined").await.unwrap();

    p1.send(typing_frame("typing:start", room, 1)).await.unwrap();
    let update = p2.expect("typing:update").await.unwrap();
    assert_eq!(update["typers"][0]["participant_id"], 1);
    assert_eq!(update["typers"][0]["display_name"], "Trainer 1");

    // Typing TTL in the test config is 200 ms
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(server.state.cache().get_typers(room).await.unwrap().is_empty());

    // The sender never hears about its own typing
    let frames = p1.drain(QUIET).await.unwrap();
    assert!(frames.iter().all(|(event, _)| event != "typing:update"));
}

// ============================================================================
// Multiple processes
// ============================================================================

#[tokio::test]
async fn test_processes_bridge_over_shared_hub() {
    let store = Arc::new(MemoryChatStore::new());
    let hub = MemoryPubSub::new();
    let a = TestServer::start_on(store.clone(), hub.clone()).await.unwrap();
    let b = TestServer::start_on(store, hub).await.unwrap();
    let room = create_room(&a.state, "Bridged", &[1, 2]).await.unwrap();

    let mut p1 = a.connect(1).await.unwrap();
    let mut p2 = b.connect(2).await.unwrap();
    p1.send(join_frame(room, 1)).await.unwrap();
    p1.expect("room:joined").await.unwrap();
    p2.send(join_frame(room, 2)).await.unwrap();
    p2.expect("room:joined").await.unwrap();

    p1.send(send_frame(room, 1, "over the bridge")).await.unwrap();

    assert_eq!(p2.expect("message:new").await.unwrap()["content"], "over the bridge");
    let frames = p1.drain(QUIET).await.unwrap();
    let copies = frames.iter().filter(|(event, _)| event == "message:new").count();
    assert_eq!(copies, 1);
}

#[tokio::test]
async fn test_degraded_processes_stay_local() {
    let store = Arc::new(MemoryChatStore::new());
    let hub = MemoryPubSub::unavailable();
    let a = TestServer::start_on(store.clone(), hub.clone()).await.unwrap();
    let b = TestServer::start_on(store, hub).await.unwrap();
    let room = create_room(&a.state, "Split", &[1, 2]).await.unwrap();

    let health: HealthResponse = assert_json(a.get("/health").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(health.pubsub, "degraded");

    let mut p1 = a.connect(1).await.unwrap();
    let mut p2 = b.connect(2).await.unwrap();
    p1.send(join_frame(room, 1)).await.unwrap();
    p1.expect("room:joined").await.unwrap();
    p2.send(join_frame(room, 2)).await.unwrap();
    p2.expect("room:joined").await.unwrap();

    p1.send(send_frame(room, 1, "only here")).await.unwrap();

    assert_eq!(p1.expect("message:new").await.unwrap()["content"], "only here");
    let frames = p2.drain(QUIET).await.unwrap();
    assert!(frames.iter().all(|(event, _)| event != "message:new"));

    // Persisted all the same
    let history = MessageService::new(b.state.services())
        .get_recent(room, ParticipantId::new(2), None)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);

    p1.close().await.unwrap();
}
