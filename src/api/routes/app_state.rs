//! Application state management.
//!
//! Holds the shared document store, authentication client, room bus and
//! dispatcher handed to every route handler.

use crate::config::ServerConfig;
use crate::protocol::{Dispatcher, RoomBus};
use crate::services::Authenticator;
use crate::storage::{DocumentStore, InMemoryDocumentStore, PostgresDocumentStore, StorageError};
use std::sync::Arc;
use tracing::info;

/// Application state shared across all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document store backing every service
    pub store: Arc<dyn DocumentStore>,
    /// Exchanges connection credentials for user identities
    pub authenticator: Arc<dyn Authenticator>,
    /// Broadcast channels (diagram id -> channel)
    pub rooms: Arc<RoomBus>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        authenticator: Arc<dyn Authenticator>,
        config: &ServerConfig,
    ) -> Self {
        let rooms = Arc::new(RoomBus::new(config.broadcast_capacity));
        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            rooms.clone(),
            config.log_relation_removal,
        ));
        Self {
            store,
            authenticator,
            rooms,
            dispatcher,
        }
    }
}

/// Open the document store named by the configuration.
///
/// Connects to PostgreSQL (running migrations) if `DATABASE_URL` is set,
/// otherwise falls back to the in-memory store.
pub async fn init_storage(config: &ServerConfig) -> Result<Arc<dyn DocumentStore>, StorageError> {
    match &config.database_url {
        Some(database_url) => {
            let store = PostgresDocumentStore::connect(database_url).await?;
            info!("Using PostgreSQL document store");
            Ok(Arc::new(store))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory document store");
            Ok(Arc::new(InMemoryDocumentStore::new()))
        }
    }
}
