use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessModifier {
    Public,
    Private,
    Protected,
    Package,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

/// Attribute variants, discriminated by the `kind` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AttributeKind {
    #[serde(rename_all = "camelCase")]
    Field {
        name: String,
        #[serde(rename = "type")]
        data_type: String,
        access_modifier: AccessModifier,
    },
    #[serde(rename_all = "camelCase")]
    Method {
        name: String,
        #[serde(rename = "type")]
        data_type: String,
        access_modifier: AccessModifier,
        #[serde(default)]
        parameters: Vec<MethodParameter>,
    },
    Value {
        value: String,
    },
}

/// An entry in a model's embedded `attributes` list.
///
/// Payloads without an `_id` get a fresh one on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "_id", default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: AttributeKind,
}

impl Attribute {
    pub fn new(kind: AttributeKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
        }
    }

    pub fn field(name: &str, data_type: &str, access_modifier: AccessModifier) -> Self {
        Self::new(AttributeKind::Field {
            name: name.to_string(),
            data_type: data_type.to_string(),
            access_modifier,
        })
    }

    pub fn value(value: &str) -> Self {
        Self::new(AttributeKind::Value {
            value: value.to_string(),
        })
    }
}
