//! Plain HTTP endpoints served next to the WebSocket route.

use axum::http::StatusCode;
use axum_test::TestServer;
use diagram_collab_server::config::ServerConfig;
use diagram_collab_server::routes::{AppState, create_router};
use diagram_collab_server::services::HttpAuthenticator;
use diagram_collab_server::storage::InMemoryDocumentStore;
use serde_json::Value;
use std::sync::Arc;

fn create_test_server() -> TestServer {
    let config = ServerConfig::from_lookup(|_| None).unwrap();
    let authenticator = HttpAuthenticator::new(&config.auth_service_url).unwrap();
    let app_state = AppState::new(
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(authenticator),
        &config,
    );
    TestServer::new(create_router(app_state, &config)).unwrap()
}

#[tokio::test]
async fn test_root_reports_running() {
    let server = create_test_server();

    let response = server.get("/").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "Server is running!");
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "diagram-collab-server");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_plain_get_on_websocket_route_is_rejected() {
    let server = create_test_server();

    let response = server.get("/ws").await;

    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let server = create_test_server();

    let response = server.get("/api/v1/tables").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
