//! Per-diagram broadcast channels.
//!
//! A room is keyed by the diagram id. Every connection bound to the diagram
//! holds a receiver; a room with no receivers left is pruned.

use super::events::ServerEvent;
use std::collections::HashMap;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info};

pub struct RoomBus {
    channels: Mutex<HashMap<String, broadcast::Sender<ServerEvent>>>,
    capacity: usize,
}

impl RoomBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Get or create the room's channel and subscribe to it.
    pub async fn subscribe(&self, room: &str) -> broadcast::Receiver<ServerEvent> {
        let mut channels = self.channels.lock().await;

        if let Some(tx) = channels.get(room) {
            tx.subscribe()
        } else {
            let (tx, rx) = broadcast::channel::<ServerEvent>(self.capacity);
            channels.insert(room.to_string(), tx);
            info!("[Rooms] Created broadcast channel for diagram: {}", room);
            rx
        }
    }

    /// Deliver `event` to every member of `room`, sender included.
    ///
    /// Returns the number of receivers reached.
    pub async fn broadcast(&self, room: &str, event: ServerEvent) -> usize {
        let channels = self.channels.lock().await;
        let Some(tx) = channels.get(room) else {
            debug!("[Rooms] No members in {} for {}", room, event.name());
            return 0;
        };

        let name = event.name();
        match tx.send(event) {
            Ok(receivers) => {
                debug!("[Rooms] Broadcast {} to {} member(s) of {}", name, receivers, room);
                receivers
            }
            Err(_) => 0,
        }
    }

    /// Drop the room's channel once nobody listens to it anymore.
    pub async fn release(&self, room: &str) {
        let mut channels = self.channels.lock().await;
        if channels
            .get(room)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            channels.remove(room);
            info!("[Rooms] Removed broadcast channel for diagram: {}", room);
        }
    }

    pub async fn member_count(&self, room: &str) -> usize {
        self.channels
            .lock()
            .await
            .get(room)
            .map_or(0, |tx| tx.receiver_count())
    }

    pub async fn room_count(&self) -> usize {
        self.channels.lock().await.len()
    }
}
