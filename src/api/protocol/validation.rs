//! Required-key checks for inbound payloads.
//!
//! Each payload has a static schema: a base key set plus, for polymorphic
//! payloads, a discriminator field whose value selects extra keys.
//! Validation runs before any store access.

use super::events::{ErrorNotice, error_types};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy)]
pub struct Discriminator {
    pub field: &'static str,
    pub variants: &'static [(&'static str, &'static [&'static str])],
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub required: &'static [&'static str],
    pub discriminator: Option<Discriminator>,
}

impl Schema {
    pub const fn keys(required: &'static [&'static str]) -> Self {
        Self {
            required,
            discriminator: None,
        }
    }

    pub const fn tagged(required: &'static [&'static str], discriminator: Discriminator) -> Self {
        Self {
            required,
            discriminator: Some(discriminator),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),
    #[error("payload must have `{0}` field")]
    MissingDiscriminator(&'static str),
    #[error("unsupported {field} `{value}`")]
    UnknownVariant { field: &'static str, value: String },
}

impl ValidationError {
    pub fn notice(&self) -> ErrorNotice {
        match self {
            ValidationError::MissingParameters(keys) => {
                ErrorNotice::new(error_types::MISSING_PARAMETERS, keys.clone())
            }
            ValidationError::MissingDiscriminator(_) => {
                ErrorNotice::new(error_types::MISSING_PARAMETERS, self.to_string())
            }
            ValidationError::UnknownVariant { .. } => {
                ErrorNotice::new(error_types::INVALID_PARAMETERS, self.to_string())
            }
        }
    }
}

/// Check `payload` against `schema`, listing every missing key.
pub fn validate(payload: &Value, schema: &Schema) -> Result<(), ValidationError> {
    let present = |key: &str| payload.get(key).is_some();

    let mut required: Vec<&'static str> = Vec::new();
    if let Some(discriminator) = &schema.discriminator {
        let tag = payload
            .get(discriminator.field)
            .ok_or(ValidationError::MissingDiscriminator(discriminator.field))?;
        let variant_keys = tag
            .as_str()
            .and_then(|tag| {
                discriminator
                    .variants
                    .iter()
                    .find(|(name, _)| *name == tag)
                    .map(|(_, keys)| *keys)
            })
            .ok_or_else(|| ValidationError::UnknownVariant {
                field: discriminator.field,
                value: tag.as_str().map_or_else(|| tag.to_string(), str::to_string),
            })?;
        required.extend(schema.required);
        required.extend(variant_keys);
    } else {
        required.extend(schema.required);
    }

    let missing: Vec<String> = required
        .into_iter()
        .filter(|key| !present(key))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingParameters(missing))
    }
}

const CLASS_KEYS: &[&str] = &["name"];
const TEXT_BOX_KEYS: &[&str] = &["text"];
const FIELD_KEYS: &[&str] = &["name", "type", "accessModifier"];
const METHOD_KEYS: &[&str] = &["name", "type", "accessModifier", "parameters"];
const VALUE_KEYS: &[&str] = &["value"];

const MODEL_TYPE: Discriminator = Discriminator {
    field: "type",
    variants: &[("class", CLASS_KEYS), ("textBox", TEXT_BOX_KEYS)],
};

const ATTRIBUTE_KIND: Discriminator = Discriminator {
    field: "kind",
    variants: &[
        ("field", FIELD_KEYS),
        ("method", METHOD_KEYS),
        ("value", VALUE_KEYS),
    ],
};

pub const JOIN_DIAGRAM: Schema = Schema::keys(&["diagramId"]);
pub const MODEL: Schema = Schema::tagged(&["type", "path"], MODEL_TYPE);
pub const REPRESENTATION: Schema = Schema::keys(&["x", "y", "w", "h"]);
pub const REPRESENTATION_UPDATE: Schema = Schema::keys(&["_id", "x", "y", "w", "h"]);
pub const REPRESENTATION_REF: Schema = Schema::keys(&["modelRepId"]);
pub const MODEL_REF: Schema = Schema::keys(&["modelId"]);
pub const ATTRIBUTE: Schema = Schema::tagged(&["kind"], ATTRIBUTE_KIND);
pub const ATTRIBUTE_UPDATE: Schema = Schema::tagged(&["_id", "kind"], ATTRIBUTE_KIND);
pub const ATTRIBUTE_REMOVAL: Schema = Schema::keys(&["modelId", "attributeId"]);
pub const RELATION_REFS: Schema = Schema::keys(&["modelId", "modelRepId"]);
pub const RELATION: Schema = Schema::keys(&["target"]);
pub const RELATION_UPDATE: Schema = Schema::keys(&["_id", "target"]);
pub const RELATION_REMOVAL: Schema = Schema::keys(&["modelId", "modelRepId", "relationId"]);
