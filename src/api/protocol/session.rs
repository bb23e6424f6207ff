//! Per-connection state.

use super::events::{ServerEvent, UserPresence};
use crate::models::{Diagram, UserIdentity};
use tokio::sync::{broadcast, mpsc};
use tracing::warn;
use uuid::Uuid;

/// One authenticated connection and the room it is bound to, if any.
pub struct Session {
    connection_id: Uuid,
    identity: UserIdentity,
    diagram: Option<Diagram>,
    room: Option<String>,
    subscription: Option<broadcast::Receiver<ServerEvent>>,
    outbox: mpsc::UnboundedSender<ServerEvent>,
}

impl Session {
    pub fn new(identity: UserIdentity, outbox: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            identity,
            diagram: None,
            room: None,
            subscription: None,
            outbox,
        }
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn user_id(&self) -> &str {
        &self.identity.id
    }

    pub fn presence(&self) -> UserPresence {
        UserPresence {
            id: self.identity.id.clone(),
            name: self.identity.name.clone(),
        }
    }

    pub fn diagram(&self) -> Option<&Diagram> {
        self.diagram.as_ref()
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    /// Send an event to this connection only.
    pub fn reply(&self, event: ServerEvent) {
        if self.outbox.send(event).is_err() {
            warn!(
                "[Session] Connection {} closed before reply could be sent",
                self.connection_id
            );
        }
    }

    pub(crate) fn bind(
        &mut self,
        diagram: Diagram,
        subscription: broadcast::Receiver<ServerEvent>,
    ) {
        self.room = Some(diagram.id.to_string());
        self.diagram = Some(diagram);
        self.subscription = Some(subscription);
    }

    /// Leave the current room, dropping its subscription.
    pub(crate) fn unbind(&mut self) -> Option<String> {
        self.diagram = None;
        self.subscription = None;
        self.room.take()
    }

    /// Next event broadcast to the bound room.
    ///
    /// Pends forever while unbound. Events missed by a lagging receiver are
    /// skipped.
    pub async fn next_room_event(&mut self) -> Option<ServerEvent> {
        let Some(receiver) = self.subscription.as_mut() else {
            return std::future::pending().await;
        };

        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "[Session] Connection {} lagged behind, skipped {} event(s)",
                        self.connection_id, skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.subscription = None;
                    return None;
                }
            }
        }
    }

    /// Room events already queued for this connection, without waiting.
    pub fn drain_room_events(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        if let Some(receiver) = self.subscription.as_mut() {
            loop {
                match receiver.try_recv() {
                    Ok(event) => events.push(event),
                    Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
        }
        events
    }
}
