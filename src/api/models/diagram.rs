use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A canvas. Created outside this server; only its `models` set is mutated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub project_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Representation ids drawn on this diagram
    #[serde(default)]
    pub models: Vec<Uuid>,
}

impl Diagram {
    pub fn new(title: &str, project_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            project_id,
            path: None,
            models: Vec::new(),
        }
    }
}
