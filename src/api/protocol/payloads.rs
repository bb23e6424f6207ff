//! Typed inbound payloads that are not domain documents.

use crate::services::ModelRefs;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinDiagram {
    /// Kept as text: an unparsable id is simply a diagram that does not exist.
    pub diagram_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRef {
    pub model_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepresentationRef {
    pub model_rep_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRemoval {
    pub model_id: Uuid,
    pub attribute_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_rep_id: Option<Uuid>,
}

impl AttributeRemoval {
    pub fn refs(&self) -> ModelRefs {
        ModelRefs {
            model_id: self.model_id,
            model_rep_id: self.model_rep_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationRefs {
    pub model_id: Uuid,
    pub model_rep_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationRemoval {
    pub model_id: Uuid,
    pub model_rep_id: Uuid,
    pub relation_id: Uuid,
    #[serde(default)]
    pub deep: bool,
}
