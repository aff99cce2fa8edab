//! JsonSchema validation for the wire types shared with the admin API.

use desk_core::{AppList, AppRecord, Identity};
use pretty_assertions::assert_eq;
use schemars::schema_for;

fn schema_errors(schema: &serde_json::Value, instance: &serde_json::Value) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

#[test]
fn identity_matches_its_schema() {
    let schema = serde_json::to_value(schema_for!(Identity)).unwrap();
    let instance = serde_json::to_value(Identity::new("u-1", "alice")).unwrap();
    assert_eq!(schema_errors(&schema, &instance), Vec::<String>::new());
}

#[test]
fn identity_schema_requires_username() {
    let schema = serde_json::to_value(schema_for!(Identity)).unwrap();
    let instance = serde_json::json!({ "id": "u-1" });
    assert!(!schema_errors(&schema, &instance).is_empty());
}

#[test]
fn app_list_from_server_payload_matches_schema() {
    let payload = serde_json::json!({
        "applist": [
            { "id": "a1", "title": "Billing", "type": "web", "description": "invoices" },
            { "id": "a2", "title": "Reports", "type": "batch", "description": "" }
        ]
    });
    let list: AppList = serde_json::from_value(payload.clone()).unwrap();
    assert_eq!(list.applist.len(), 2);
    assert_eq!(list.applist[1].app_type, "batch");

    let schema = serde_json::to_value(schema_for!(AppList)).unwrap();
    assert_eq!(schema_errors(&schema, &payload), Vec::<String>::new());
}

#[test]
fn new_record_serializes_empty_id() {
    let record = AppRecord {
        title: "Scratch".into(),
        app_type: "cli".into(),
        ..Default::default()
    };
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["id"], "");
    assert_eq!(json["type"], "cli");
}
