// Models module - diagrams, models, representations and their embedded documents

pub mod attribute;
pub mod diagram;
pub mod history;
pub mod identity;
pub mod model;
pub mod relation;
pub mod representation;

pub use attribute::{AccessModifier, Attribute, AttributeKind, MethodParameter};
pub use diagram::Diagram;
pub use history::{History, HistoryAction, HistoryEntry};
pub use identity::UserIdentity;
pub use model::{Model, ModelContent, ModelKind};
pub use relation::{Point, Relation, RelationRepresentation, RelationType};
pub use representation::{FullModelRepresentation, Geometry, Representation, RepresentationPatch};
