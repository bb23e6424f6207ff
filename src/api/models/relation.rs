use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    #[default]
    Association,
    Aggregation,
    Composition,
    Inheritance,
    Realization,
    Dependency,
}

/// A semantic relation from the owning model to `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    #[serde(rename = "_id", default = "Uuid::new_v4")]
    pub id: Uuid,
    pub target: Uuid,
    #[serde(default)]
    pub relation_type: RelationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_multiplicity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_multiplicity: Option<String>,
}

impl Relation {
    pub fn new(target: Uuid, relation_type: RelationType) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            relation_type,
            label: None,
            source_multiplicity: None,
            target_multiplicity: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Visual anchor of a relation, embedded in the drawing representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationRepresentation {
    #[serde(rename = "_id", default = "Uuid::new_v4")]
    pub id: Uuid,
    pub relation_id: Uuid,
    #[serde(default)]
    pub points: Vec<Point>,
}

impl RelationRepresentation {
    pub fn for_relation(relation_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            relation_id,
            points: Vec::new(),
        }
    }
}
