//! Model service: the mutation engine for models, representations and
//! their embedded attributes and relations.
//!
//! Multi-document flows (create model → create representation → register
//! it on the diagram, and the delete cascades) run as plain sequences of
//! single-document store calls. A failure part way through leaves the
//! earlier steps in place; every step is safe to repeat.
//!
//! Mutations re-read the affected documents from the store before
//! returning, so callers always broadcast the stored state.

use super::error::{ServiceError, parse};
use super::history_ledger::HistoryLedger;
use crate::models::{
    Attribute, Diagram, FullModelRepresentation, Geometry, HistoryAction, Model, ModelContent,
    Relation, RelationRepresentation, Representation, RepresentationPatch,
};
use crate::storage::{Collection, DocumentStore, Filter, JoinSpec, PullMatcher};
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const ATTRIBUTES: &str = "attributes";
const RELATIONS: &str = "relations";
const MODELS: &str = "models";

const REPRESENTATION_WITH_MODEL: JoinSpec = JoinSpec {
    local: Collection::ModelRepresentation,
    local_field: "modelId",
    foreign: Collection::Model,
    foreign_field: "_id",
    to_field: "model",
    unwind: true,
};

/// Which model a sub-document change targets, and optionally the
/// representation the caller wants back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRefs {
    pub model_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_rep_id: Option<Uuid>,
}

/// Result of a model mutation, shaped by the identifiers the caller supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelView {
    Full(FullModelRepresentation),
    Model(Model),
}

/// Service for managing models and their representations.
#[derive(Clone)]
pub struct ModelService {
    store: Arc<dyn DocumentStore>,
    ledger: HistoryLedger,
    log_relation_removal: bool,
}

impl ModelService {
    /// Create a new model service instance.
    pub fn new(store: Arc<dyn DocumentStore>, log_relation_removal: bool) -> Self {
        Self {
            ledger: HistoryLedger::new(store.clone()),
            store,
            log_relation_removal,
        }
    }

    pub async fn get_model(&self, model_id: Uuid) -> Result<Option<Model>, ServiceError> {
        self.store
            .find_one(Collection::Model, &Filter::by_id(model_id))
            .await?
            .map(parse)
            .transpose()
    }

    pub async fn get_representation(
        &self,
        representation_id: Uuid,
    ) -> Result<Option<Representation>, ServiceError> {
        self.store
            .find_one(
                Collection::ModelRepresentation,
                &Filter::by_id(representation_id),
            )
            .await?
            .map(parse)
            .transpose()
    }

    pub async fn get_full_model_representation(
        &self,
        representation_id: Uuid,
    ) -> Result<Option<FullModelRepresentation>, ServiceError> {
        let mut joined = self
            .store
            .join(&REPRESENTATION_WITH_MODEL, &Filter::by_id(representation_id))
            .await?;

        if joined.is_empty() {
            return Ok(None);
        }
        parse(joined.swap_remove(0)).map(Some)
    }

    pub async fn get_full_model_representations_for_diagram(
        &self,
        diagram_id: Uuid,
    ) -> Result<Vec<FullModelRepresentation>, ServiceError> {
        self.store
            .join(
                &REPRESENTATION_WITH_MODEL,
                &Filter::new().eq("diagramId", diagram_id),
            )
            .await?
            .into_iter()
            .map(parse)
            .collect()
    }

    /// Create a model and draw it on `diagram`.
    pub async fn create(
        &self,
        content: ModelContent,
        geometry: Geometry,
        diagram: &Diagram,
        user_id: &str,
    ) -> Result<Option<FullModelRepresentation>, ServiceError> {
        if !unique_ids(content.attributes.iter().map(|a| a.id))
            || !unique_ids(content.relations.iter().map(|r| r.id))
        {
            warn!("[ModelService] Rejected model with duplicate embedded ids");
            return Ok(None);
        }

        let model = Model::create(content, diagram.project_id, user_id);
        self.store
            .insert(Collection::Model, serde_json::to_value(&model)?)
            .await?;
        info!(
            "[ModelService] Created {} model {} in project {}",
            model.kind.type_name(),
            model.id,
            model.project_id
        );

        self.place(model.id, diagram.id, geometry).await
    }

    /// Draw an existing model on `diagram`.
    pub async fn add_to_diagram(
        &self,
        model_id: Uuid,
        geometry: Geometry,
        diagram: &Diagram,
    ) -> Result<Option<FullModelRepresentation>, ServiceError> {
        if self.get_model(model_id).await?.is_none() {
            return Ok(None);
        }
        self.place(model_id, diagram.id, geometry).await
    }

    async fn place(
        &self,
        model_id: Uuid,
        diagram_id: Uuid,
        geometry: Geometry,
    ) -> Result<Option<FullModelRepresentation>, ServiceError> {
        let representation = Representation::place(model_id, diagram_id, geometry);
        self.store
            .insert(
                Collection::ModelRepresentation,
                serde_json::to_value(&representation)?,
            )
            .await?;

        let registered = self
            .store
            .push(
                Collection::Diagram,
                diagram_id,
                MODELS,
                json!(representation.id),
            )
            .await?;
        if !registered {
            warn!(
                "[ModelService] Diagram {} missing, representation {} left unregistered",
                diagram_id, representation.id
            );
            return Ok(None);
        }

        self.get_full_model_representation(representation.id).await
    }

    /// Patch the geometry of a representation.
    ///
    /// `modelId`/`diagramId` never change; a patch naming different ones is rejected.
    pub async fn update_model_representation(
        &self,
        patch: RepresentationPatch,
    ) -> Result<Option<FullModelRepresentation>, ServiceError> {
        let Some(existing) = self.get_representation(patch.id).await? else {
            return Ok(None);
        };
        let model_id = patch.model_id.unwrap_or(existing.model_id);
        let diagram_id = patch.diagram_id.unwrap_or(existing.diagram_id);
        if model_id != existing.model_id || diagram_id != existing.diagram_id {
            warn!(
                "[ModelService] Refused to move representation {} to another model or diagram",
                patch.id
            );
            return Ok(None);
        }

        let mut fields = Map::new();
        fields.insert("x".to_string(), json!(patch.geometry.x));
        fields.insert("y".to_string(), json!(patch.geometry.y));
        fields.insert("w".to_string(), json!(patch.geometry.w));
        fields.insert("h".to_string(), json!(patch.geometry.h));

        let updated = self
            .store
            .update(Collection::ModelRepresentation, patch.id, fields)
            .await?;
        if updated.is_none() {
            return Ok(None);
        }

        self.get_full_model_representation(patch.id).await
    }

    /// Delete a model together with every representation of it.
    ///
    /// Rooms to notify must be looked up before the delete; afterwards no
    /// diagram lists the model any more.
    pub async fn delete_model(&self, model_id: Uuid) -> Result<bool, ServiceError> {
        let representations: Vec<Representation> = self
            .store
            .find(
                Collection::ModelRepresentation,
                &Filter::new().eq("modelId", model_id),
            )
            .await?
            .into_iter()
            .map(parse)
            .collect::<Result<_, _>>()?;

        for representation in &representations {
            self.delete_model_representation(representation.id).await?;
        }

        let deleted = self
            .store
            .delete(Collection::Model, &Filter::by_id(model_id))
            .await?;
        if deleted {
            info!(
                "[ModelService] Deleted model {} with {} representation(s)",
                model_id,
                representations.len()
            );
        }
        Ok(deleted)
    }

    /// Unregister a representation from every diagram, then delete it.
    pub async fn delete_model_representation(
        &self,
        representation_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let holders = self
            .store
            .find(
                Collection::Diagram,
                &Filter::new().contains(MODELS, representation_id),
            )
            .await?;
        for holder in holders {
            let diagram: Diagram = parse(holder)?;
            self.store
                .pull(
                    Collection::Diagram,
                    diagram.id,
                    MODELS,
                    &PullMatcher::id(representation_id),
                )
                .await?;
        }

        Ok(self
            .store
            .delete(
                Collection::ModelRepresentation,
                &Filter::by_id(representation_id),
            )
            .await?)
    }

    pub async fn add_attribute(
        &self,
        refs: ModelRefs,
        attribute: Attribute,
        user_id: &str,
    ) -> Result<Option<ModelView>, ServiceError> {
        let Some(model) = self.get_model(refs.model_id).await? else {
            return Ok(None);
        };
        if model.attribute(attribute.id).is_some() {
            warn!(
                "[ModelService] Attribute {} already exists on model {}",
                attribute.id, model.id
            );
            return Ok(None);
        }

        let pushed = self
            .store
            .push(
                Collection::Model,
                refs.model_id,
                ATTRIBUTES,
                serde_json::to_value(&attribute)?,
            )
            .await?;
        if !pushed {
            return Ok(None);
        }

        self.ledger
            .record(
                refs.model_id,
                user_id,
                HistoryAction::AddAttribute { item: attribute },
            )
            .await?;
        self.resolve(refs).await
    }

    pub async fn remove_attribute(
        &self,
        refs: ModelRefs,
        attribute_id: Uuid,
        user_id: &str,
    ) -> Result<Option<ModelView>, ServiceError> {
        let pulled = self
            .store
            .pull(
                Collection::Model,
                refs.model_id,
                ATTRIBUTES,
                &PullMatcher::item_id(attribute_id),
            )
            .await?;
        if !pulled {
            return Ok(None);
        }

        self.ledger
            .record(
                refs.model_id,
                user_id,
                HistoryAction::RemoveAttribute {
                    item_id: attribute_id,
                },
            )
            .await?;
        self.resolve(refs).await
    }

    pub async fn update_attribute(
        &self,
        refs: ModelRefs,
        attribute: Attribute,
        user_id: &str,
    ) -> Result<Option<ModelView>, ServiceError> {
        let Some(model) = self.get_model(refs.model_id).await? else {
            return Ok(None);
        };
        let old = model
            .attribute(attribute.id)
            .cloned()
            .ok_or(ServiceError::ListItemNotFound {
                document_id: model.id,
                field: ATTRIBUTES,
                identifier: attribute.id,
            })?;
        if old == attribute {
            return Ok(Some(self.view(refs, model).await?));
        }

        let changed = self
            .store
            .update_in_list(
                Collection::Model,
                refs.model_id,
                ATTRIBUTES,
                attribute.id,
                serde_json::to_value(&attribute)?,
            )
            .await?;
        if !changed {
            return Ok(None);
        }

        self.ledger
            .record(
                refs.model_id,
                user_id,
                HistoryAction::UpdateAttribute {
                    old,
                    new: attribute,
                },
            )
            .await?;
        self.resolve(refs).await
    }

    /// Add a relation to the model and its visual anchor to the representation.
    pub async fn create_relation(
        &self,
        model_id: Uuid,
        representation_id: Uuid,
        relation: Relation,
        user_id: &str,
    ) -> Result<Option<FullModelRepresentation>, ServiceError> {
        let Some(model) = self.get_model(model_id).await? else {
            return Ok(None);
        };
        if model.relation(relation.id).is_some() {
            warn!(
                "[ModelService] Relation {} already exists on model {}",
                relation.id, model.id
            );
            return Ok(None);
        }
        match self.get_representation(representation_id).await? {
            Some(representation) if representation.model_id == model_id => {}
            Some(_) => {
                warn!(
                    "[ModelService] Representation {} does not draw model {}",
                    representation_id, model_id
                );
                return Ok(None);
            }
            None => return Ok(None),
        }

        let pushed = self
            .store
            .push(
                Collection::Model,
                model_id,
                RELATIONS,
                serde_json::to_value(&relation)?,
            )
            .await?;
        if !pushed {
            return Ok(None);
        }

        let anchor = RelationRepresentation::for_relation(relation.id);
        let anchored = self
            .store
            .push(
                Collection::ModelRepresentation,
                representation_id,
                RELATIONS,
                serde_json::to_value(&anchor)?,
            )
            .await?;
        if !anchored {
            warn!(
                "[ModelService] Representation {} missing, relation {} has no anchor",
                representation_id, relation.id
            );
            return Ok(None);
        }

        self.ledger
            .record(
                model_id,
                user_id,
                HistoryAction::CreateRelation { item: relation },
            )
            .await?;
        self.get_full_model_representation(representation_id).await
    }

    pub async fn update_relation(
        &self,
        refs: ModelRefs,
        relation: Relation,
        user_id: &str,
    ) -> Result<Option<ModelView>, ServiceError> {
        let Some(model) = self.get_model(refs.model_id).await? else {
            return Ok(None);
        };
        let old = model
            .relation(relation.id)
            .cloned()
            .ok_or(ServiceError::ListItemNotFound {
                document_id: model.id,
                field: RELATIONS,
                identifier: relation.id,
            })?;
        if old == relation {
            return Ok(Some(self.view(refs, model).await?));
        }

        let changed = self
            .store
            .update_in_list(
                Collection::Model,
                refs.model_id,
                RELATIONS,
                relation.id,
                serde_json::to_value(&relation)?,
            )
            .await?;
        if !changed {
            return Ok(None);
        }

        self.ledger
            .record(
                refs.model_id,
                user_id,
                HistoryAction::UpdateRelation { old, new: relation },
            )
            .await?;
        self.resolve(refs).await
    }

    /// Remove a relation's anchor from the representation.
    ///
    /// With `deep`, the relation itself is removed from the model along with
    /// its anchors on every other representation of the model.
    pub async fn delete_relation(
        &self,
        model_id: Uuid,
        representation_id: Uuid,
        relation_id: Uuid,
        deep: bool,
        user_id: &str,
    ) -> Result<Option<FullModelRepresentation>, ServiceError> {
        let anchor = PullMatcher::Where(Filter::new().eq("relationId", relation_id));
        let unanchored = self
            .store
            .pull(
                Collection::ModelRepresentation,
                representation_id,
                RELATIONS,
                &anchor,
            )
            .await?;
        if !unanchored {
            return Ok(None);
        }

        if deep {
            let removed = self
                .store
                .pull(
                    Collection::Model,
                    model_id,
                    RELATIONS,
                    &PullMatcher::item_id(relation_id),
                )
                .await?;

            let others = self
                .store
                .find(
                    Collection::ModelRepresentation,
                    &Filter::new().eq("modelId", model_id),
                )
                .await?;
            for other in others {
                let other: Representation = parse(other)?;
                if other.id != representation_id {
                    self.store
                        .pull(
                            Collection::ModelRepresentation,
                            other.id,
                            RELATIONS,
                            &anchor,
                        )
                        .await?;
                }
            }

            if removed && self.log_relation_removal {
                self.ledger
                    .record(
                        model_id,
                        user_id,
                        HistoryAction::RemoveRelation {
                            item_id: relation_id,
                        },
                    )
                    .await?;
            }
        }

        self.get_full_model_representation(representation_id).await
    }

    async fn resolve(&self, refs: ModelRefs) -> Result<Option<ModelView>, ServiceError> {
        match refs.model_rep_id {
            Some(representation_id) => Ok(self
                .get_full_model_representation(representation_id)
                .await?
                .map(ModelView::Full)),
            None => Ok(self.get_model(refs.model_id).await?.map(ModelView::Model)),
        }
    }

    /// View of an already loaded model, joining the representation when one was asked for.
    async fn view(&self, refs: ModelRefs, model: Model) -> Result<ModelView, ServiceError> {
        if let Some(representation_id) = refs.model_rep_id {
            if let Some(full) = self.get_full_model_representation(representation_id).await? {
                return Ok(ModelView::Full(full));
            }
        }
        Ok(ModelView::Model(model))
    }
}

fn unique_ids(ids: impl Iterator<Item = Uuid>) -> bool {
    let mut seen = HashSet::new();
    ids.into_iter().all(|id| seen.insert(id))
}
