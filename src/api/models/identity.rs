use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User identity returned by the authentication service.
///
/// The service may send the id as `_id`, `id` or both, and not always as a
/// string; `_id` wins and non-string ids are kept in their JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawIdentity")]
pub struct UserIdentity {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Remaining profile fields, kept opaque
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl UserIdentity {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            profile: Map::new(),
        }
    }
}

#[derive(Deserialize)]
struct RawIdentity {
    #[serde(rename = "_id", default)]
    primary_id: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    name: String,
    #[serde(flatten)]
    profile: Map<String, Value>,
}

impl TryFrom<RawIdentity> for UserIdentity {
    type Error = String;

    fn try_from(raw: RawIdentity) -> Result<Self, Self::Error> {
        let id = [raw.primary_id, raw.id]
            .into_iter()
            .flatten()
            .find_map(id_string)
            .ok_or_else(|| "identity carries no `_id` or `id`".to_string())?;

        Ok(Self {
            id,
            name: raw.name,
            profile: raw.profile,
        })
    }
}

fn id_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(id) if id.is_empty() => None,
        Value::String(id) => Some(id),
        other => Some(other.to_string()),
    }
}
