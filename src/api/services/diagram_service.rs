//! Read access to diagrams.

use super::error::{ServiceError, parse};
use crate::models::{Diagram, Representation};
use crate::storage::{Collection, DocumentStore, Filter};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct DiagramService {
    store: Arc<dyn DocumentStore>,
}

impl DiagramService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get_diagram(&self, diagram_id: Uuid) -> Result<Option<Diagram>, ServiceError> {
        self.store
            .find_one(Collection::Diagram, &Filter::by_id(diagram_id))
            .await?
            .map(parse)
            .transpose()
    }

    /// Diagrams that draw at least one representation of the model.
    pub async fn get_diagrams_for_model(
        &self,
        model_id: Uuid,
    ) -> Result<Vec<Diagram>, ServiceError> {
        let representations = self
            .store
            .find(
                Collection::ModelRepresentation,
                &Filter::new().eq("modelId", model_id),
            )
            .await?;

        let mut diagrams: Vec<Diagram> = Vec::new();
        for representation in representations {
            let representation: Representation = parse(representation)?;
            let holders = self
                .store
                .find(
                    Collection::Diagram,
                    &Filter::new().contains("models", representation.id),
                )
                .await?;
            for holder in holders {
                let diagram: Diagram = parse(holder)?;
                if !diagrams.iter().any(|d| d.id == diagram.id) {
                    diagrams.push(diagram);
                }
            }
        }

        Ok(diagrams)
    }
}
