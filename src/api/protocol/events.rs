//! Wire format of the collaboration protocol.
//!
//! Inbound frames: `{"event": "<name>", "args": [<payload>, ...]}`.
//! Outbound frames: `{"event": "<name>", "data": <payload>}`.

use crate::models::FullModelRepresentation;
use crate::services::ModelView;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Error types reported in `error` events.
pub mod error_types {
    pub const MISSING_PARAMETERS: &str = "missingParameters";
    pub const INVALID_PARAMETERS: &str = "invalidParameters";
    pub const UNKNOWN_EVENT: &str = "unknownEvent";
    pub const MODEL_ERROR: &str = "model_error";
    pub const UPDATE_MODEL_ERROR: &str = "update_model_error";
    pub const DELETE_MODEL_ERROR: &str = "deleteModelError";
    pub const DELETE_REPRESENTATION_ERROR: &str = "deleteRepresentationError";
    pub const LIST_ITEM_NOT_FOUND: &str = "listItemNotFound";
    pub const CONNECTION: &str = "connection";
    pub const GENERAL: &str = "general";
}

/// A named inbound event with positional payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl ClientFrame {
    pub fn new(event: &str, args: Vec<Value>) -> Self {
        Self {
            event: event.to_string(),
            args,
        }
    }

    /// Positional payload; absent arguments read as `null`.
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionResponse {
    pub fn accepted() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn refused(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPresence {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub error_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
}

impl ErrorNotice {
    pub fn new(error_type: &str, message: impl Into<Value>) -> Self {
        Self {
            error_type: error_type.to_string(),
            message: Some(message.into()),
        }
    }

    pub fn bare(error_type: &str) -> Self {
        Self {
            error_type: error_type.to_string(),
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDeleted {
    pub model_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRepDeleted {
    pub model_rep_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramNotFound {
    pub diagram_id: String,
}

/// Outbound events, sent to one connection or broadcast to a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    ConnectionResponse(ConnectionResponse),
    AllDiagramModels(Vec<FullModelRepresentation>),
    UserJoined(UserPresence),
    UserLeft(UserPresence),
    ModelAdded(FullModelRepresentation),
    ModelUpdated(ModelView),
    ModelRepUpdated(FullModelRepresentation),
    ModelDeleted(ModelDeleted),
    ModelRepDeleted(ModelRepDeleted),
    DiagramNotFound(DiagramNotFound),
    Error(ErrorNotice),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::ConnectionResponse(_) => "connection_response",
            ServerEvent::AllDiagramModels(_) => "all_diagram_models",
            ServerEvent::UserJoined(_) => "user_joined",
            ServerEvent::UserLeft(_) => "user_left",
            ServerEvent::ModelAdded(_) => "model_added",
            ServerEvent::ModelUpdated(_) => "model_updated",
            ServerEvent::ModelRepUpdated(_) => "model_rep_updated",
            ServerEvent::ModelDeleted(_) => "model_deleted",
            ServerEvent::ModelRepDeleted(_) => "model_rep_deleted",
            ServerEvent::DiagramNotFound(_) => "diagram_not_found",
            ServerEvent::Error(_) => "error",
        }
    }

    pub fn error(error_type: &str, message: impl Into<Value>) -> Self {
        ServerEvent::Error(ErrorNotice::new(error_type, message))
    }
}
