//! Wire shape of the diagram documents.

use diagram_collab_server::models::{
    AccessModifier, Attribute, AttributeKind, Diagram, FullModelRepresentation, Geometry,
    HistoryAction, HistoryEntry, Model, ModelContent, ModelKind, Relation, RelationType,
    Representation, RepresentationPatch, UserIdentity,
};
use diagram_collab_server::services::ModelView;
use serde_json::json;
use uuid::Uuid;

#[test]
fn test_model_content_from_client_payload() {
    let content: ModelContent = serde_json::from_value(json!({
        "type": "class",
        "name": "Order",
        "path": "/shop",
        "attributes": [
            {"kind": "field", "name": "id", "type": "uuid", "accessModifier": "private"}
        ]
    }))
    .unwrap();

    assert_eq!(
        content.kind,
        ModelKind::Class {
            name: "Order".to_string()
        }
    );
    assert_eq!(content.attributes.len(), 1);
    assert!(content.relations.is_empty());
    match &content.attributes[0].kind {
        AttributeKind::Field {
            data_type,
            access_modifier,
            ..
        } => {
            assert_eq!(data_type, "uuid");
            assert_eq!(*access_modifier, AccessModifier::Private);
        }
        other => panic!("unexpected attribute kind: {:?}", other),
    }
}

#[test]
fn test_model_create_records_creation() {
    let content = ModelContent::new(
        "/",
        ModelKind::TextBox {
            text: "remember".to_string(),
        },
    );
    let project_id = Uuid::new_v4();
    let model = Model::create(content.clone(), project_id, "user-1");

    assert_eq!(model.project_id, project_id);
    assert_eq!(model.history().len(), 1);
    let entry = model.history().last().unwrap();
    assert_eq!(entry.user_id, "user-1");
    assert_eq!(entry.action, HistoryAction::CreateModel { item: content });

    let value = serde_json::to_value(&model).unwrap();
    assert_eq!(value["type"], "textBox");
    assert_eq!(value["text"], "remember");
    assert_eq!(value["projectId"], json!(project_id));
    assert_eq!(value["history"][0]["action"], "createModel");
    assert_eq!(value["history"][0]["item"]["type"], "textBox");
}

#[test]
fn test_history_entry_shape() {
    let item_id = Uuid::new_v4();
    let entry = HistoryEntry::new("u", HistoryAction::RemoveAttribute { item_id });
    let value = serde_json::to_value(&entry).unwrap();

    assert_eq!(value["action"], "removeAttribute");
    assert_eq!(value["itemId"], json!(item_id));
    assert_eq!(value["userId"], "u");
    assert!(value["timestamp"].as_str().is_some());

    let back: HistoryEntry = serde_json::from_value(value).unwrap();
    assert_eq!(back, entry);
}

#[test]
fn test_payloads_without_ids_get_fresh_ones() {
    let a: Attribute = serde_json::from_value(json!({"kind": "value", "value": "RED"})).unwrap();
    let b: Attribute = serde_json::from_value(json!({"kind": "value", "value": "RED"})).unwrap();
    assert_ne!(a.id, b.id);

    let relation: Relation =
        serde_json::from_value(json!({"target": Uuid::new_v4()})).unwrap();
    assert_eq!(relation.relation_type, RelationType::Association);
    assert!(relation.label.is_none());
}

#[test]
fn test_method_attribute_round_trip_keeps_parameters() {
    let attribute: Attribute = serde_json::from_value(json!({
        "_id": Uuid::new_v4(),
        "kind": "method",
        "name": "total",
        "type": "decimal",
        "accessModifier": "public",
        "parameters": [{"name": "tax", "type": "bool"}]
    }))
    .unwrap();

    let value = serde_json::to_value(&attribute).unwrap();
    assert_eq!(value["kind"], "method");
    assert_eq!(value["parameters"][0]["type"], "bool");
}

#[test]
fn test_representation_patch_accepts_integers() {
    let id = Uuid::new_v4();
    let patch: RepresentationPatch =
        serde_json::from_value(json!({"_id": id, "x": 10, "y": 20, "w": 100, "h": 50})).unwrap();

    assert_eq!(patch.id, id);
    assert_eq!(patch.model_id, None);
    assert_eq!(
        patch.geometry,
        Geometry {
            x: 10.0,
            y: 20.0,
            w: 100.0,
            h: 50.0
        }
    );
}

#[test]
fn test_full_representation_flattens_representation() {
    let diagram = Diagram::new("Main", Uuid::new_v4());
    let model = Model::create(
        ModelContent::new(
            "/",
            ModelKind::Class {
                name: "A".to_string(),
            },
        ),
        diagram.project_id,
        "u",
    );
    let representation = Representation::place(
        model.id,
        diagram.id,
        Geometry {
            x: 1.0,
            y: 2.0,
            w: 3.0,
            h: 4.0,
        },
    );
    let full = FullModelRepresentation {
        representation: representation.clone(),
        model: model.clone(),
    };

    let value = serde_json::to_value(&full).unwrap();
    assert_eq!(value["_id"], json!(representation.id));
    assert_eq!(value["modelId"], json!(model.id));
    assert_eq!(value["diagramId"], json!(diagram.id));
    assert_eq!(value["model"]["name"], "A");

    let view: ModelView = serde_json::from_value(value).unwrap();
    assert_eq!(view, ModelView::Full(full));

    let view: ModelView = serde_json::from_value(serde_json::to_value(&model).unwrap()).unwrap();
    assert_eq!(view, ModelView::Model(model));
}

#[test]
fn test_user_identity_accepts_either_id_key() {
    let a: UserIdentity = serde_json::from_value(json!({"_id": "1", "name": "Ada"})).unwrap();
    let b: UserIdentity =
        serde_json::from_value(json!({"id": "1", "name": "Ada", "email": "ada@example.com"}))
            .unwrap();

    assert_eq!(a.id, b.id);
    assert_eq!(b.profile["email"], "ada@example.com");
    assert_eq!(a, UserIdentity::new("1", "Ada"));
}

#[test]
fn test_user_identity_with_both_id_keys_prefers_underscore_id() {
    let identity: UserIdentity =
        serde_json::from_value(json!({"_id": "abc", "id": "legacy", "name": "Ada"})).unwrap();

    assert_eq!(identity.id, "abc");
    assert!(identity.profile.is_empty());
}

#[test]
fn test_user_identity_stringifies_non_string_ids() {
    let numeric: UserIdentity = serde_json::from_value(json!({"_id": 42, "name": "Ada"})).unwrap();
    assert_eq!(numeric.id, "42");

    let fallback: UserIdentity =
        serde_json::from_value(json!({"_id": null, "id": 7, "name": "Bob"})).unwrap();
    assert_eq!(fallback.id, "7");

    let serialized = serde_json::to_value(&numeric).unwrap();
    assert_eq!(serialized["_id"], "42");
}

#[test]
fn test_user_identity_without_any_id_is_rejected() {
    let result = serde_json::from_value::<UserIdentity>(json!({"name": "Ada"}));
    assert!(result.is_err());
}

#[test]
fn test_field_helper() {
    let attribute = Attribute::field("name", "string", AccessModifier::Protected);
    let value = serde_json::to_value(&attribute).unwrap();
    assert_eq!(value["kind"], "field");
    assert_eq!(value["accessModifier"], "protected");
}
