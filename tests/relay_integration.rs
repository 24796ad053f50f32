mod common;

use std::time::Duration;

use serde_json::json;
use tokio_test::assert_ok;

use common::{ws_connect, ws_expect_silence, ws_read, ws_send, TestServer};
use fruit_party::net::{connect, ReconnectPolicy, Transport};
use fruit_party::ws::protocol::{ClientMsg, Point, ServerMsg};

#[tokio::test]
async fn set_name_is_broadcast_to_everyone_including_sender() {
    let server = TestServer::new().await;
    let mut alice = ws_connect(&server.ws_url()).await;
    let mut bob = ws_connect(&server.ws_url()).await;

    ws_send(&mut alice, json!({"event": "setName", "data": {"name": "  Alice  "}})).await;

    let to_alice = ws_read(&mut alice).await;
    let to_bob = ws_read(&mut bob).await;
    assert_eq!(to_alice, to_bob);
    assert_eq!(to_alice["event"], "join");
    assert_eq!(to_alice["data"]["name"], "Alice");
}

#[tokio::test]
async fn aim_is_stamped_with_sender_and_name() {
    let server = TestServer::new().await;
    let mut sender = ws_connect(&server.ws_url()).await;
    let mut watcher = ws_connect(&server.ws_url()).await;

    ws_send(&mut sender, json!({"event": "aim", "data": {"x": 0.125, "y": 0.75}})).await;
    let unnamed = ws_read(&mut watcher).await;
    assert_eq!(unnamed["event"], "aim");
    assert_eq!(unnamed["data"]["x"], 0.125);
    assert_eq!(unnamed["data"]["y"], 0.75);
    assert_eq!(unnamed["data"]["name"], "");

    ws_send(&mut sender, json!({"event": "setName", "data": {"name": "x".repeat(100)}})).await;
    let join = ws_read(&mut watcher).await;
    assert_eq!(join["data"]["name"].as_str().map(str::len), Some(24));

    ws_send(&mut sender, json!({"event": "slash", "data": {"x": 1, "y": 0}})).await;
    let slash = ws_read(&mut watcher).await;
    assert_eq!(slash["event"], "slash");
    assert_eq!(slash["data"]["id"], unnamed["data"]["id"]);
    assert_eq!(slash["data"]["name"], "x".repeat(24));
}

#[tokio::test]
async fn malformed_frames_are_dropped_without_closing() {
    let server = TestServer::new().await;
    let mut sender = ws_connect(&server.ws_url()).await;
    let mut watcher = ws_connect(&server.ws_url()).await;

    for frame in [
        json!({"event": "setName", "data": {"name": ""}}),
        json!({"event": "setName", "data": {"name": "   "}}),
        json!({"event": "setName", "data": {"name": 123}}),
        json!({"event": "aim", "data": {"x": "a", "y": 0.1}}),
        json!({"event": "dance", "data": {}}),
    ] {
        ws_send(&mut sender, frame).await;
    }
    ws_expect_silence(&mut watcher).await;

    // Still open
    ws_send(&mut sender, json!({"event": "aim", "data": {"x": 0.5, "y": 0.5}})).await;
    assert_eq!(ws_read(&mut watcher).await["event"], "aim");
}

#[tokio::test]
async fn closing_a_socket_broadcasts_leave() {
    let server = TestServer::new().await;
    let mut leaver = ws_connect(&server.ws_url()).await;
    let mut watcher = ws_connect(&server.ws_url()).await;

    ws_send(&mut leaver, json!({"event": "setName", "data": {"name": "gone"}})).await;
    let join = ws_read(&mut watcher).await;
    assert_eq!(server.state.relay.named_count(), 1);

    assert_ok!(leaver.close(None).await);
    let leave = ws_read(&mut watcher).await;
    assert_eq!(leave["event"], "leave");
    assert_eq!(leave["data"]["id"], join["data"]["id"]);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.state.relay.named_count(), 0);
    assert_eq!(server.state.relay.connection_count(), 1);
}

#[tokio::test]
async fn event_stream_peer_talks_to_websocket_peer() {
    let server = TestServer::new().await;
    let mut watcher = ws_connect(&server.ws_url()).await;

    let mut sse = connect(
        &server.base_url(),
        &ReconnectPolicy::only(Transport::EventStream),
    )
    .await
    .unwrap();
    assert_eq!(sse.transport, Transport::EventStream);
    let session = sse.session.unwrap();

    assert_ok!(
        sse.send(ClientMsg::Slash(Point { x: 0.25, y: 0.5 }))
            .await
    );
    let seen = ws_read(&mut watcher).await;
    assert_eq!(seen["event"], "slash");
    assert_eq!(seen["data"]["id"], session.to_string());

    // And the event-stream peer hears websocket traffic
    ws_send(&mut watcher, json!({"event": "setName", "data": {"name": "ws"}})).await;
    let heard = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match sse.recv().await {
                Some(ServerMsg::Join { name, .. }) => return name,
                Some(_) => continue,
                None => panic!("event stream closed"),
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(heard, "ws");
}

#[tokio::test]
async fn websocket_client_sees_its_own_join() {
    let server = TestServer::new().await;
    let mut conn = connect(&server.base_url(), &ReconnectPolicy::default())
        .await
        .unwrap();
    assert_eq!(conn.transport, Transport::WebSocket);

    assert_ok!(
        conn.send(ClientMsg::SetName {
            name: "me".to_string()
        })
        .await
    );
    let msg = tokio::time::timeout(Duration::from_secs(2), conn.recv())
        .await
        .unwrap();
    assert!(matches!(msg, Some(ServerMsg::Join { name, .. }) if name == "me"));
}

#[tokio::test]
async fn health_endpoints_answer() {
    let server = TestServer::new().await;
    for path in ["/health", "/healthz"] {
        let body: serde_json::Value = reqwest::get(format!("{}{path}", server.base_url()))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }
}
