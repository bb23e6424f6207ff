//! End-to-end sessions over real WebSocket connections.

use async_trait::async_trait;
use diagram_collab_server::config::ServerConfig;
use diagram_collab_server::models::{Diagram, UserIdentity};
use diagram_collab_server::routes::{AppState, create_router};
use diagram_collab_server::services::{AuthError, Authenticator};
use diagram_collab_server::storage::{Collection, DocumentStore, InMemoryDocumentStore};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Accepts `Bearer ada` and `Bearer bob`, rejects everything else.
struct StaticAuthenticator;

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, credential: &str) -> Result<UserIdentity, AuthError> {
        match credential {
            "Bearer ada" => Ok(UserIdentity::new("u1", "Ada")),
            "Bearer bob" => Ok(UserIdentity::new("u2", "Bob")),
            _ => Err(AuthError::Unauthorized),
        }
    }
}

async fn spawn_server() -> (SocketAddr, Diagram) {
    let store = Arc::new(InMemoryDocumentStore::new());
    let diagram = Diagram::new("Main", Uuid::new_v4());
    store
        .insert(Collection::Diagram, serde_json::to_value(&diagram).unwrap())
        .await
        .unwrap();

    let config = ServerConfig::from_lookup(|_| None).unwrap();
    let state = AppState::new(store, Arc::new(StaticAuthenticator), &config);
    let app = create_router(state, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, diagram)
}

async fn connect(addr: SocketAddr, token: &str) -> Socket {
    let (socket, _) = connect_async(format!("ws://{}/ws?token={}", addr, token))
        .await
        .unwrap();
    socket
}

async fn send(socket: &mut Socket, event: &str, args: Value) {
    let frame = json!({"event": event, "args": args});
    socket
        .send(Message::text(frame.to_string()))
        .await
        .unwrap();
}

/// Next event frame, or None once the server closed the socket.
async fn next_event(socket: &mut Socket) -> Option<Value> {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for the server");
        match message {
            Some(Ok(Message::Text(text))) => return Some(serde_json::from_str(&text).unwrap()),
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => continue,
        }
    }
}

/// Skip frames until the named event arrives.
async fn expect_event(socket: &mut Socket, name: &str) -> Value {
    loop {
        let event = next_event(socket)
            .await
            .unwrap_or_else(|| panic!("socket closed while waiting for {}", name));
        if event["event"] == name {
            return event["data"].clone();
        }
    }
}

/// Next event frame, which must carry `name`.
async fn expect_next(socket: &mut Socket, name: &str) -> Value {
    let event = next_event(socket)
        .await
        .unwrap_or_else(|| panic!("socket closed while waiting for {}", name));
    assert_eq!(event["event"], name, "unexpected frame {}", event);
    event["data"].clone()
}

#[tokio::test]
async fn test_rejected_credential_closes_connection() {
    let (addr, _) = spawn_server().await;
    let mut socket = connect(addr, "mallory").await;

    let response = next_event(&mut socket).await.unwrap();
    assert_eq!(response["event"], "connection_response");
    assert_eq!(response["data"]["success"], false);
    assert_eq!(response["data"]["error"], "unauthorized!");

    assert!(next_event(&mut socket).await.is_none());
}

#[tokio::test]
async fn test_authorization_header_is_accepted() {
    let (addr, _) = spawn_server().await;
    let mut request = format!("ws://{}/ws", addr).into_client_request().unwrap();
    request
        .headers_mut()
        .insert("authorization", HeaderValue::from_static("Bearer bob"));
    let (mut socket, _) = connect_async(request).await.unwrap();

    let response = expect_event(&mut socket, "connection_response").await;
    assert_eq!(response["success"], true);
}

#[tokio::test]
async fn test_mutation_before_join_closes_connection() {
    let (addr, _) = spawn_server().await;
    let mut socket = connect(addr, "ada").await;
    expect_event(&mut socket, "connection_response").await;

    send(
        &mut socket,
        "delete_model",
        json!([{"modelId": Uuid::new_v4()}]),
    )
    .await;

    let notice = expect_event(&mut socket, "error").await;
    assert_eq!(notice["error_type"], "connection");
    assert!(next_event(&mut socket).await.is_none());
}

#[tokio::test]
async fn test_unknown_diagram_keeps_connection_open() {
    let (addr, _) = spawn_server().await;
    let mut socket = connect(addr, "ada").await;
    expect_event(&mut socket, "connection_response").await;

    let missing = Uuid::new_v4();
    send(&mut socket, "join_diagram", json!([{"diagramId": missing}])).await;
    let notice = expect_event(&mut socket, "diagram_not_found").await;
    assert_eq!(notice["diagramId"], missing.to_string());

    send(&mut socket, "join_diagram", json!([{}])).await;
    let notice = expect_event(&mut socket, "error").await;
    assert_eq!(notice["error_type"], "missingParameters");
    assert_eq!(notice["message"], json!(["diagramId"]));
}

#[tokio::test]
async fn test_two_members_share_live_edits() {
    let (addr, diagram) = spawn_server().await;
    let mut ada = connect(addr, "ada").await;
    let mut bob = connect(addr, "bob").await;
    expect_event(&mut ada, "connection_response").await;
    expect_event(&mut bob, "connection_response").await;

    send(&mut ada, "join_diagram", json!([{"diagramId": diagram.id}])).await;
    assert_eq!(expect_next(&mut ada, "all_diagram_models").await, json!([]));
    assert_eq!(
        expect_next(&mut ada, "user_joined").await,
        json!({"id": "u1", "name": "Ada"})
    );

    send(&mut bob, "join_diagram", json!([{"diagramId": diagram.id}])).await;
    expect_next(&mut bob, "all_diagram_models").await;
    expect_next(&mut bob, "user_joined").await;
    let joined = expect_next(&mut ada, "user_joined").await;
    assert_eq!(joined, json!({"id": "u2", "name": "Bob"}));

    send(
        &mut ada,
        "create_model",
        json!([
            {"type": "textBox", "path": "/a", "text": "hi"},
            {"x": 0, "y": 0, "w": 10, "h": 10}
        ]),
    )
    .await;
    let added = expect_event(&mut ada, "model_added").await;
    let seen = expect_event(&mut bob, "model_added").await;
    assert_eq!(added, seen);
    assert_eq!(added["model"]["text"], "hi");
    assert_eq!(added["model"]["history"][0]["action"], "createModel");
    let rep_id = added["_id"].clone();

    send(
        &mut bob,
        "update_model_representation",
        json!([{"_id": rep_id, "x": 25, "y": 30, "w": 10, "h": 10}]),
    )
    .await;
    for socket in [&mut ada, &mut bob] {
        let updated = expect_event(socket, "model_updated").await;
        assert_eq!(updated["_id"], rep_id);
        assert_eq!(updated["x"], 25.0);
    }

    drop(bob);
    let left = expect_event(&mut ada, "user_left").await;
    assert_eq!(left["id"], "u2");
}

#[tokio::test]
async fn test_snapshot_is_first_frame_after_join() {
    let (addr, diagram) = spawn_server().await;
    let mut ada = connect(addr, "ada").await;
    let mut bob = connect(addr, "bob").await;
    expect_next(&mut ada, "connection_response").await;
    expect_next(&mut bob, "connection_response").await;

    send(&mut ada, "join_diagram", json!([{"diagramId": diagram.id}])).await;
    expect_next(&mut ada, "all_diagram_models").await;
    expect_next(&mut ada, "user_joined").await;
    send(
        &mut ada,
        "create_model",
        json!([
            {"type": "class", "path": "/", "name": "Order"},
            {"x": 0, "y": 0, "w": 10, "h": 10}
        ]),
    )
    .await;
    expect_next(&mut ada, "model_added").await;

    for _ in 0..20 {
        send(&mut bob, "join_diagram", json!([{"diagramId": diagram.id}])).await;
        let snapshot = expect_next(&mut bob, "all_diagram_models").await;
        assert_eq!(snapshot.as_array().map(Vec::len), Some(1));
        assert_eq!(snapshot[0]["model"]["name"], "Order");
        expect_next(&mut bob, "user_joined").await;

        send(&mut bob, "leave_diagram", json!([])).await;
        expect_next(&mut ada, "user_joined").await;
        expect_next(&mut ada, "user_left").await;
    }
}
