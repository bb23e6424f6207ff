use super::attribute::Attribute;
use super::history::{History, HistoryAction, HistoryEntry};
use super::relation::Relation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Model variants, discriminated by the `type` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModelKind {
    Class { name: String },
    TextBox { text: String },
}

impl ModelKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ModelKind::Class { .. } => "class",
            ModelKind::TextBox { .. } => "textBox",
        }
    }
}

/// The client-supplied content of a model, also recorded by `createModel` history entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelContent {
    pub path: String,
    #[serde(flatten)]
    pub kind: ModelKind,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl ModelContent {
    pub fn new(path: &str, kind: ModelKind) -> Self {
        Self {
            path: path.to_string(),
            kind,
            attributes: Vec::new(),
            relations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub project_id: Uuid,
    pub path: String,
    #[serde(flatten)]
    pub kind: ModelKind,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub(crate) history: History,
}

impl Model {
    /// Build a new model owned by `project_id`, recording its creation in history.
    pub fn create(content: ModelContent, project_id: Uuid, user_id: &str) -> Self {
        let mut history = History::new();
        history.append(HistoryEntry::new(
            user_id,
            HistoryAction::CreateModel {
                item: content.clone(),
            },
        ));

        Self {
            id: Uuid::new_v4(),
            project_id,
            path: content.path,
            kind: content.kind,
            attributes: content.attributes,
            relations: content.relations,
            history,
        }
    }

    /// Audit trail, oldest first. Entries are only added through the store.
    ///
    /// ```compile_fail
    /// use diagram_collab_server::models::{History, Model};
    ///
    /// fn wipe(model: &mut Model) {
    ///     model.history = History::new();
    /// }
    /// ```
    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn attribute(&self, attribute_id: Uuid) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.id == attribute_id)
    }

    pub fn relation(&self, relation_id: Uuid) -> Option<&Relation> {
        self.relations.iter().find(|r| r.id == relation_id)
    }
}
