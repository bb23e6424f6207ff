//! WebSocket collaboration route for real-time multi-user diagram editing.
//!
//! One connection is one session: it authenticates on upgrade, then carries
//! inbound events to the dispatcher and room broadcasts back to the client.

use axum::{
    Router,
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::{HeaderMap, header::AUTHORIZATION},
    response::Response,
    routing::get,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::AppState;
use crate::models::UserIdentity;
use crate::protocol::{ConnectionRefused, ConnectionResponse, ServerEvent, Session, error_types};
use crate::services::AuthError;

/// WebSocket connection query parameters
#[derive(Deserialize)]
struct WebSocketQuery {
    /// Browsers cannot set headers on upgrade requests
    token: Option<String>,
}

/// Create collaboration router
pub fn collaboration_router() -> Router<AppState> {
    Router::new().route("/ws", get(handle_websocket))
}

/// Handle WebSocket upgrade and connection
async fn handle_websocket(
    Query(query): Query<WebSocketQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    let credential = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| query.token.map(|token| format!("Bearer {}", token)));

    ws.on_upgrade(move |socket| handle_socket(socket, state, credential))
}

async fn authenticate(
    state: &AppState,
    credential: Option<String>,
) -> Result<UserIdentity, ConnectionRefused> {
    let credential = credential.ok_or(AuthError::MissingCredential)?;
    Ok(state.authenticator.authenticate(&credential).await?)
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(axum::Error::new)?;
    sender.send(Message::Text(json.into())).await
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState, credential: Option<String>) {
    let (mut sender, mut receiver) = socket.split();

    let identity = match authenticate(&state, credential).await {
        Ok(identity) => identity,
        Err(refused) => {
            warn!("[Collaboration] Connection refused: {}", refused);
            let response = ServerEvent::ConnectionResponse(ConnectionResponse::refused(
                refused.to_string(),
            ));
            if send_event(&mut sender, &response).await.is_ok() {
                let _ = sender.send(Message::Close(None)).await;
            }
            return;
        }
    };

    let (outbox, mut inbox) = mpsc::unbounded_channel();
    let mut session = Session::new(identity, outbox);
    info!(
        "[Collaboration] User {} connected as {}",
        session.user_id(),
        session.connection_id()
    );
    session.reply(ServerEvent::ConnectionResponse(ConnectionResponse::accepted()));

    let dispatcher = state.dispatcher.clone();
    loop {
        // Direct replies take priority over room traffic
        tokio::select! {
            biased;
            Some(event) = inbox.recv() => {
                if send_event(&mut sender, &event).await.is_err() {
                    break;
                }
            }
            Some(event) = session.next_room_event() => {
                if send_event(&mut sender, &event).await.is_err() {
                    break;
                }
            }
            message = receiver.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if let Err(refused) = dispatcher.dispatch_text(&mut session, text.as_str()).await {
                        while let Ok(event) = inbox.try_recv() {
                            let _ = send_event(&mut sender, &event).await;
                        }
                        let notice = ServerEvent::error(error_types::CONNECTION, refused.to_string());
                        let _ = send_event(&mut sender, &notice).await;
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("[Collaboration] Socket error on {}: {}", session.connection_id(), e);
                    break;
                }
            },
        }
    }

    dispatcher.disconnect(&mut session).await;
}
