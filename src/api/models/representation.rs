use super::model::Model;
use super::relation::RelationRepresentation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Placement of a model on one diagram.
///
/// `model_id` and `diagram_id` are fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Representation {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub model_id: Uuid,
    pub diagram_id: Uuid,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default)]
    pub relations: Vec<RelationRepresentation>,
}

impl Representation {
    pub fn place(model_id: Uuid, diagram_id: Uuid, geometry: Geometry) -> Self {
        Self {
            id: Uuid::new_v4(),
            model_id,
            diagram_id,
            x: geometry.x,
            y: geometry.y,
            w: geometry.w,
            h: geometry.h,
            relations: Vec::new(),
        }
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }
}

/// Geometry patch sent by `update_model_representation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepresentationPatch {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram_id: Option<Uuid>,
    #[serde(flatten)]
    pub geometry: Geometry,
}

/// A representation joined with the model it draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullModelRepresentation {
    #[serde(flatten)]
    pub representation: Representation,
    pub model: Model,
}
