//! Routes inbound events to the model services.
//!
//! Every mutating event follows the same path: room precondition, payload
//! validation, service call, then either a room broadcast of the success
//! event or an error event to the requester alone.

use super::error::ConnectionRefused;
use super::events::{
    ClientFrame, DiagramNotFound, ErrorNotice, ModelDeleted, ModelRepDeleted, ServerEvent,
    error_types,
};
use super::payloads::{
    AttributeRemoval, JoinDiagram, ModelRef, RelationRefs, RelationRemoval, RepresentationRef,
};
use super::rooms::RoomBus;
use super::session::Session;
use super::validation::{self, Schema, ValidationError, validate};
use crate::models::{Attribute, Diagram, Geometry, ModelContent, Relation, RepresentationPatch};
use crate::services::{DiagramService, ModelRefs, ModelService, ModelView, ServiceError};
use crate::storage::DocumentStore;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Why a single request was aborted.
#[derive(Debug)]
enum RequestError {
    Refused(ConnectionRefused),
    Invalid(ValidationError),
    Malformed(String),
    Service(ServiceError),
}

impl From<ConnectionRefused> for RequestError {
    fn from(err: ConnectionRefused) -> Self {
        RequestError::Refused(err)
    }
}

impl From<ValidationError> for RequestError {
    fn from(err: ValidationError) -> Self {
        RequestError::Invalid(err)
    }
}

impl From<ServiceError> for RequestError {
    fn from(err: ServiceError) -> Self {
        RequestError::Service(err)
    }
}

type RequestResult = Result<(), RequestError>;

/// Validate a raw payload against its schema, then decode it.
fn payload<T: DeserializeOwned>(value: Value, schema: &Schema) -> Result<T, RequestError> {
    validate(&value, schema)?;
    serde_json::from_value(value).map_err(|e| RequestError::Malformed(e.to_string()))
}

#[derive(Clone)]
pub struct Dispatcher {
    diagrams: DiagramService,
    models: ModelService,
    rooms: Arc<RoomBus>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn DocumentStore>, rooms: Arc<RoomBus>, log_relation_removal: bool) -> Self {
        Self {
            diagrams: DiagramService::new(store.clone()),
            models: ModelService::new(store, log_relation_removal),
            rooms,
        }
    }

    pub fn rooms(&self) -> &Arc<RoomBus> {
        &self.rooms
    }

    pub fn models(&self) -> &ModelService {
        &self.models
    }

    pub fn diagrams(&self) -> &DiagramService {
        &self.diagrams
    }

    /// Decode a raw text frame and dispatch it.
    pub async fn dispatch_text(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), ConnectionRefused> {
        match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) => self.dispatch(session, frame).await,
            Err(e) => {
                warn!(
                    "[Dispatcher] Malformed frame from connection {}: {}",
                    session.connection_id(),
                    e
                );
                session.reply(ServerEvent::error(
                    error_types::INVALID_PARAMETERS,
                    e.to_string(),
                ));
                Ok(())
            }
        }
    }

    /// Handle one inbound event.
    ///
    /// Only refusals escape; every other failure is reported to the
    /// requester and ends the request, not the connection.
    pub async fn dispatch(
        &self,
        session: &mut Session,
        frame: ClientFrame,
    ) -> Result<(), ConnectionRefused> {
        debug!(
            "[Dispatcher] {} from user {} ({} arg(s))",
            frame.event,
            session.user_id(),
            frame.args.len()
        );

        let outcome = match frame.event.as_str() {
            "join_diagram" => self.join_diagram(session, frame.arg(0)).await,
            "leave_diagram" => {
                self.leave_diagram(session).await;
                Ok(())
            }
            "create_model" => self.create_model(session, frame.arg(0), frame.arg(1)).await,
            "add_model" => self.add_model(session, frame.arg(0), frame.arg(1)).await,
            "update_model_representation" => {
                self.update_model_representation(session, frame.arg(0)).await
            }
            "add_model_attribute" => {
                self.add_model_attribute(session, frame.arg(0), frame.arg(1))
                    .await
            }
            "remove_model_attribute" => self.remove_model_attribute(session, frame.arg(0)).await,
            "update_model_attribute" => {
                self.update_model_attribute(session, frame.arg(0), frame.arg(1))
                    .await
            }
            "create_model_relation" => {
                self.create_model_relation(session, frame.arg(0), frame.arg(1))
                    .await
            }
            "update_model_relation" => {
                self.update_model_relation(session, frame.arg(0), frame.arg(1))
                    .await
            }
            "remove_model_relation" => self.remove_model_relation(session, frame.arg(0)).await,
            "delete_model" => self.delete_model(session, frame.arg(0)).await,
            "delete_model_rep" => self.delete_model_rep(session, frame.arg(0)).await,
            other => {
                warn!("[Dispatcher] Unknown event: {}", other);
                session.reply(ServerEvent::error(
                    error_types::UNKNOWN_EVENT,
                    format!("unknown event `{}`", other),
                ));
                Ok(())
            }
        };

        match outcome {
            Ok(()) => Ok(()),
            Err(RequestError::Refused(refused)) => {
                warn!(
                    "[Dispatcher] Refusing connection {} on {}: {}",
                    session.connection_id(),
                    frame.event,
                    refused
                );
                Err(refused)
            }
            Err(RequestError::Invalid(invalid)) => {
                debug!("[Dispatcher] {} rejected: {}", frame.event, invalid);
                session.reply(ServerEvent::Error(invalid.notice()));
                Ok(())
            }
            Err(RequestError::Malformed(reason)) => {
                debug!("[Dispatcher] {} malformed: {}", frame.event, reason);
                session.reply(ServerEvent::error(error_types::INVALID_PARAMETERS, reason));
                Ok(())
            }
            Err(RequestError::Service(err)) => {
                session.reply(self.service_failure(&frame.event, err));
                Ok(())
            }
        }
    }

    fn service_failure(&self, event: &str, err: ServiceError) -> ServerEvent {
        match err {
            ServiceError::ListItemNotFound { .. } => {
                warn!("[Dispatcher] {} failed: {}", event, err);
                ServerEvent::error(error_types::LIST_ITEM_NOT_FOUND, err.to_string())
            }
            other => {
                error!("[Dispatcher] {} failed: {}", event, other);
                ServerEvent::error(error_types::GENERAL, other.to_string())
            }
        }
    }

    /// Leave the current room on disconnect.
    pub async fn disconnect(&self, session: &mut Session) {
        self.leave_diagram(session).await;
        info!(
            "[Dispatcher] Connection {} for user {} closed",
            session.connection_id(),
            session.user_id()
        );
    }

    fn require_room(session: &Session) -> Result<(String, Diagram), ConnectionRefused> {
        match (session.room(), session.diagram()) {
            (Some(room), Some(diagram)) => Ok((room.to_string(), diagram.clone())),
            _ => Err(ConnectionRefused::NotInRoom),
        }
    }

    /// Broadcast the success event to the room, or tell the requester why not.
    async fn respond<T>(
        &self,
        session: &Session,
        room: &str,
        result: Option<T>,
        success: impl FnOnce(T) -> ServerEvent,
        failure: ErrorNotice,
    ) {
        match result {
            Some(value) => {
                self.rooms.broadcast(room, success(value)).await;
            }
            None => session.reply(ServerEvent::Error(failure)),
        }
    }

    async fn join_diagram(&self, session: &mut Session, data: Value) -> RequestResult {
        let request: JoinDiagram = payload(data, &validation::JOIN_DIAGRAM)?;

        let diagram = match Uuid::parse_str(&request.diagram_id) {
            Ok(id) => self.diagrams.get_diagram(id).await?,
            Err(_) => None,
        };
        let Some(diagram) = diagram else {
            info!(
                "[Dispatcher] User {} asked for unknown diagram {}",
                session.user_id(),
                request.diagram_id
            );
            session.reply(ServerEvent::DiagramNotFound(DiagramNotFound {
                diagram_id: request.diagram_id,
            }));
            return Ok(());
        };

        if session.room().is_some() {
            self.leave_diagram(session).await;
        }

        // Subscribe before reading the snapshot
        let room = diagram.id.to_string();
        let subscription = self.rooms.subscribe(&room).await;
        let models = match self
            .models
            .get_full_model_representations_for_diagram(diagram.id)
            .await
        {
            Ok(models) => models,
            Err(err) => {
                drop(subscription);
                self.rooms.release(&room).await;
                return Err(err.into());
            }
        };
        session.bind(diagram, subscription);
        info!(
            "[Dispatcher] User {} joined diagram {}",
            session.user_id(),
            room
        );

        session.reply(ServerEvent::AllDiagramModels(models));
        self.rooms
            .broadcast(&room, ServerEvent::UserJoined(session.presence()))
            .await;
        Ok(())
    }

    async fn leave_diagram(&self, session: &mut Session) {
        let Some(room) = session.room().map(str::to_string) else {
            debug!(
                "[Dispatcher] Connection {} left without a room",
                session.connection_id()
            );
            return;
        };

        self.rooms
            .broadcast(&room, ServerEvent::UserLeft(session.presence()))
            .await;
        session.unbind();
        self.rooms.release(&room).await;
        info!(
            "[Dispatcher] User {} left diagram {}",
            session.user_id(),
            room
        );
    }

    async fn create_model(&self, session: &mut Session, model: Value, rep: Value) -> RequestResult {
        let (room, diagram) = Self::require_room(session)?;
        let content: ModelContent = payload(model, &validation::MODEL)?;
        let geometry: Geometry = payload(rep, &validation::REPRESENTATION)?;

        let result = self
            .models
            .create(content, geometry, &diagram, session.user_id())
            .await?;
        self.respond(
            session,
            &room,
            result,
            ServerEvent::ModelAdded,
            ErrorNotice::new(error_types::MODEL_ERROR, "model could not be created"),
        )
        .await;
        Ok(())
    }

    async fn add_model(&self, session: &mut Session, model_ref: Value, rep: Value) -> RequestResult {
        let (room, diagram) = Self::require_room(session)?;
        let model_ref: ModelRef = payload(model_ref, &validation::MODEL_REF)?;
        let geometry: Geometry = payload(rep, &validation::REPRESENTATION)?;

        let result = self
            .models
            .add_to_diagram(model_ref.model_id, geometry, &diagram)
            .await?;
        self.respond(
            session,
            &room,
            result,
            ServerEvent::ModelAdded,
            ErrorNotice::new(
                error_types::MODEL_ERROR,
                format!("model {} could not be added", model_ref.model_id),
            ),
        )
        .await;
        Ok(())
    }

    async fn update_model_representation(&self, session: &mut Session, data: Value) -> RequestResult {
        let (room, _) = Self::require_room(session)?;
        let patch: RepresentationPatch = payload(data, &validation::REPRESENTATION_UPDATE)?;
        let representation_id = patch.id;

        let result = self.models.update_model_representation(patch).await?;
        self.respond(
            session,
            &room,
            result,
            |full| ServerEvent::ModelUpdated(ModelView::Full(full)),
            ErrorNotice::new(
                error_types::UPDATE_MODEL_ERROR,
                format!("representation {} was not updated", representation_id),
            ),
        )
        .await;
        Ok(())
    }

    async fn add_model_attribute(
        &self,
        session: &mut Session,
        refs: Value,
        attribute: Value,
    ) -> RequestResult {
        let (room, _) = Self::require_room(session)?;
        let refs: ModelRefs = payload(refs, &validation::MODEL_REF)?;
        let attribute: Attribute = payload(attribute, &validation::ATTRIBUTE)?;

        let result = self
            .models
            .add_attribute(refs, attribute, session.user_id())
            .await?;
        self.respond(
            session,
            &room,
            result,
            ServerEvent::ModelUpdated,
            ErrorNotice::new(
                error_types::UPDATE_MODEL_ERROR,
                format!("attribute not added to model {}", refs.model_id),
            ),
        )
        .await;
        Ok(())
    }

    async fn remove_model_attribute(&self, session: &mut Session, data: Value) -> RequestResult {
        let (room, _) = Self::require_room(session)?;
        let removal: AttributeRemoval = payload(data, &validation::ATTRIBUTE_REMOVAL)?;

        let result = self
            .models
            .remove_attribute(removal.refs(), removal.attribute_id, session.user_id())
            .await?;
        self.respond(
            session,
            &room,
            result,
            ServerEvent::ModelUpdated,
            ErrorNotice::new(
                error_types::UPDATE_MODEL_ERROR,
                format!(
                    "attribute {} not removed from model {}",
                    removal.attribute_id, removal.model_id
                ),
            ),
        )
        .await;
        Ok(())
    }

    async fn update_model_attribute(
        &self,
        session: &mut Session,
        refs: Value,
        attribute: Value,
    ) -> RequestResult {
        let (room, _) = Self::require_room(session)?;
        let refs: ModelRefs = payload(refs, &validation::MODEL_REF)?;
        let attribute: Attribute = payload(attribute, &validation::ATTRIBUTE_UPDATE)?;
        let attribute_id = attribute.id;

        let result = self
            .models
            .update_attribute(refs, attribute, session.user_id())
            .await?;
        self.respond(
            session,
            &room,
            result,
            ServerEvent::ModelUpdated,
            ErrorNotice::new(
                error_types::UPDATE_MODEL_ERROR,
                format!(
                    "attribute {} of model {} not updated",
                    attribute_id, refs.model_id
                ),
            ),
        )
        .await;
        Ok(())
    }

    async fn create_model_relation(
        &self,
        session: &mut Session,
        refs: Value,
        relation: Value,
    ) -> RequestResult {
        let (room, _) = Self::require_room(session)?;
        let refs: RelationRefs = payload(refs, &validation::RELATION_REFS)?;
        let relation: Relation = payload(relation, &validation::RELATION)?;

        let result = self
            .models
            .create_relation(refs.model_id, refs.model_rep_id, relation, session.user_id())
            .await?;
        self.respond(
            session,
            &room,
            result,
            ServerEvent::ModelRepUpdated,
            ErrorNotice::new(
                error_types::UPDATE_MODEL_ERROR,
                format!("relation not created on model {}", refs.model_id),
            ),
        )
        .await;
        Ok(())
    }

    async fn update_model_relation(
        &self,
        session: &mut Session,
        refs: Value,
        relation: Value,
    ) -> RequestResult {
        let (room, _) = Self::require_room(session)?;
        let refs: ModelRefs = payload(refs, &validation::MODEL_REF)?;
        let relation: Relation = payload(relation, &validation::RELATION_UPDATE)?;
        let relation_id = relation.id;

        let result = self
            .models
            .update_relation(refs, relation, session.user_id())
            .await?;
        self.respond(
            session,
            &room,
            result,
            ServerEvent::ModelUpdated,
            ErrorNotice::new(
                error_types::UPDATE_MODEL_ERROR,
                format!(
                    "relation {} of model {} not updated",
                    relation_id, refs.model_id
                ),
            ),
        )
        .await;
        Ok(())
    }

    async fn remove_model_relation(&self, session: &mut Session, data: Value) -> RequestResult {
        let (room, _) = Self::require_room(session)?;
        let removal: RelationRemoval = payload(data, &validation::RELATION_REMOVAL)?;

        let result = self
            .models
            .delete_relation(
                removal.model_id,
                removal.model_rep_id,
                removal.relation_id,
                removal.deep,
                session.user_id(),
            )
            .await?;
        self.respond(
            session,
            &room,
            result,
            ServerEvent::ModelRepUpdated,
            ErrorNotice::new(
                error_types::UPDATE_MODEL_ERROR,
                format!(
                    "relation {} not removed from representation {}",
                    removal.relation_id, removal.model_rep_id
                ),
            ),
        )
        .await;
        Ok(())
    }

    /// Deleting a model notifies every diagram that drew it.
    async fn delete_model(&self, session: &mut Session, data: Value) -> RequestResult {
        Self::require_room(session)?;
        let model_ref: ModelRef = payload(data, &validation::MODEL_REF)?;

        let affected = self
            .diagrams
            .get_diagrams_for_model(model_ref.model_id)
            .await?;

        if self.models.delete_model(model_ref.model_id).await? {
            for diagram in &affected {
                self.rooms
                    .broadcast(
                        &diagram.id.to_string(),
                        ServerEvent::ModelDeleted(ModelDeleted {
                            model_id: model_ref.model_id,
                        }),
                    )
                    .await;
            }
        } else {
            session.reply(ServerEvent::error(
                error_types::DELETE_MODEL_ERROR,
                format!("model not deleted, id: {}", model_ref.model_id),
            ));
        }
        Ok(())
    }

    async fn delete_model_rep(&self, session: &mut Session, data: Value) -> RequestResult {
        let (room, _) = Self::require_room(session)?;
        let rep_ref: RepresentationRef = payload(data, &validation::REPRESENTATION_REF)?;

        let deleted = self
            .models
            .delete_model_representation(rep_ref.model_rep_id)
            .await?;
        self.respond(
            session,
            &room,
            deleted.then_some(rep_ref.model_rep_id),
            |model_rep_id| ServerEvent::ModelRepDeleted(ModelRepDeleted { model_rep_id }),
            ErrorNotice::new(
                error_types::DELETE_REPRESENTATION_ERROR,
                format!("could not delete representation: {}", rep_ref.model_rep_id),
            ),
        )
        .await;
        Ok(())
    }
}
