//! Required-key validation of inbound payloads.

use diagram_collab_server::protocol::validation::{
    ATTRIBUTE, ATTRIBUTE_UPDATE, JOIN_DIAGRAM, MODEL, RELATION_REMOVAL, REPRESENTATION_UPDATE,
};
use diagram_collab_server::protocol::{ValidationError, error_types, validate};
use serde_json::json;

fn missing(keys: &[&str]) -> Result<(), ValidationError> {
    Err(ValidationError::MissingParameters(
        keys.iter().map(|k| k.to_string()).collect(),
    ))
}

#[test]
fn test_class_model_requires_name() {
    let payload = json!({"type": "class", "path": "/"});
    assert_eq!(validate(&payload, &MODEL), missing(&["name"]));

    let payload = json!({"type": "class", "path": "/", "name": "Order"});
    assert_eq!(validate(&payload, &MODEL), Ok(()));
}

#[test]
fn test_text_box_model_requires_text_not_name() {
    let payload = json!({"type": "textBox", "path": "/", "text": "note"});
    assert_eq!(validate(&payload, &MODEL), Ok(()));

    let payload = json!({"type": "textBox", "name": "note"});
    assert_eq!(validate(&payload, &MODEL), missing(&["path", "text"]));
}

#[test]
fn test_missing_discriminator_is_a_missing_parameter() {
    let err = validate(&json!({"path": "/", "name": "Order"}), &MODEL).unwrap_err();
    assert_eq!(err, ValidationError::MissingDiscriminator("type"));

    let notice = err.notice();
    assert_eq!(notice.error_type, error_types::MISSING_PARAMETERS);
    assert!(notice.message.unwrap().as_str().unwrap().contains("type"));
}

#[test]
fn test_unknown_variant_is_invalid() {
    let err = validate(&json!({"kind": "property", "name": "x"}), &ATTRIBUTE).unwrap_err();
    assert_eq!(
        err,
        ValidationError::UnknownVariant {
            field: "kind",
            value: "property".to_string()
        }
    );
    assert_eq!(err.notice().error_type, error_types::INVALID_PARAMETERS);
}

#[test]
fn test_attribute_variants() {
    let field = json!({"kind": "field", "name": "id", "type": "int"});
    assert_eq!(validate(&field, &ATTRIBUTE), missing(&["accessModifier"]));

    let method = json!({
        "kind": "method",
        "name": "run",
        "type": "void",
        "accessModifier": "public",
        "parameters": []
    });
    assert_eq!(validate(&method, &ATTRIBUTE), Ok(()));

    let value = json!({"kind": "value", "value": "RED"});
    assert_eq!(validate(&value, &ATTRIBUTE), Ok(()));
    assert_eq!(validate(&value, &ATTRIBUTE_UPDATE), missing(&["_id"]));
}

#[test]
fn test_missing_parameters_notice_lists_keys() {
    let err = validate(&json!({"_id": "r", "x": 1}), &REPRESENTATION_UPDATE).unwrap_err();
    let notice = err.notice();
    assert_eq!(notice.error_type, error_types::MISSING_PARAMETERS);
    assert_eq!(notice.message, Some(json!(["y", "w", "h"])));
}

#[test]
fn test_optional_keys_are_not_required() {
    let removal = json!({"modelId": "m", "modelRepId": "r", "relationId": "x"});
    assert_eq!(validate(&removal, &RELATION_REMOVAL), Ok(()));
    assert_eq!(validate(&json!({"diagramId": "d"}), &JOIN_DIAGRAM), Ok(()));
}
