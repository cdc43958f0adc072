//! Per-kind value loading contracts: membership, required handling, ordering

use formwork::{Document, ErrorKind, Field, Schema};
use rstest::rstest;
use serde_json::json;

fn doc(value: serde_json::Value) -> Document {
    Document::from(value)
}

fn field(value: serde_json::Value) -> Field {
    Field::load_template(&doc(value)).unwrap()
}

fn color_select() -> Field {
    field(json!({
        "id": "color", "name": "Color", "kind": "select", "select": ["red", "green", "blue"]
    }))
}

#[rstest]
#[case("red")]
#[case("green")]
#[case("blue")]
fn select_accepts_every_candidate(#[case] choice: &str) {
    let value = color_select().load_value(&Document::from(choice)).unwrap();
    assert_eq!(value.dump_value().unwrap(), Document::from(choice));
}

#[rstest]
#[case("Red")]
#[case("red ")]
#[case("")]
#[case("purple")]
fn select_rejects_anything_else(#[case] choice: &str) {
    let err = color_select().load_value(&Document::from(choice)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidChoice);
    assert_eq!(err.path().unwrap().last(), Some("color"));
}

#[rstest]
#[case(json!([]))]
#[case(json!(["green"]))]
#[case(json!(["blue", "red", "blue"]))]
fn selectarray_accepts_candidate_subsets(#[case] chosen: serde_json::Value) {
    let template = field(json!({
        "id": "colors", "name": "Colors", "kind": "selectarray",
        "selectarray": ["red", "green", "blue"]
    }));
    let input = doc(chosen);
    let value = template.load_value(&input).unwrap();
    assert_eq!(value.dump_value().unwrap(), input);
}

#[test]
fn selectarray_fails_whole_call_on_one_bad_element() {
    let template = field(json!({
        "id": "colors", "name": "Colors", "kind": "selectarray", "selectarray": ["red", "green"]
    }));
    let err = template.load_value(&doc(json!(["red", "teal", "green"]))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidChoice);
    assert!(err.to_string().contains("teal"));
}

/// A parent of the given kind with a required `a` and an optional `b`.
fn parent_of(kind: &str) -> Field {
    field(json!({
        "id": "parent", "name": "Parent", "kind": kind,
        kind: [
            {"id": "a", "name": "A", "kind": "string", "required": true},
            {"id": "b", "name": "B", "kind": "string"},
        ]
    }))
}

#[rstest]
#[case("array")]
#[case("nestselect")]
#[case("nestselectarray")]
fn missing_required_child_fails(#[case] kind: &str) {
    let err = parent_of(kind).load_value(&doc(json!({"b": "x"}))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequiredFieldMissing);
    assert_eq!(err.path().unwrap().last(), Some("parent"));
    assert!(err.to_string().contains("'a'"));
}

#[test]
fn incrementarray_tolerates_missing_required_child() {
    let value = parent_of("incrementarray")
        .load_value(&doc(json!({"b": ["x", "y"]})))
        .unwrap();
    assert_eq!(value.children().len(), 2);
    assert_eq!(value.dump_value().unwrap(), doc(json!({"b": ["x", "y"]})));
}

#[rstest]
#[case("array")]
#[case("nestselect")]
#[case("nestselectarray")]
#[case("incrementarray")]
fn recursive_kinds_require_a_map(#[case] kind: &str) {
    let err = parent_of(kind).load_value(&doc(json!(["a"]))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralType);
}

#[test]
fn nestselect_resolves_only_first_declared_child() {
    let value = parent_of("nestselect")
        .load_value(&doc(json!({"b": "second", "a": "first"})))
        .unwrap();
    assert_eq!(value.dump_value().unwrap(), doc(json!({"a": "first"})));
}

#[test]
fn duplicate_sibling_ids_resolve_first_match() {
    let template = field(json!({
        "id": "parent", "name": "Parent", "kind": "array",
        "array": [
            {"id": "dup", "name": "As text", "kind": "string"},
            {"id": "dup", "name": "As number", "kind": "number"},
        ]
    }));
    assert_eq!(template.child("dup").unwrap().name, "As text");

    // Both template children read the same key; the number child rejects the string.
    let err = template.load_value(&doc(json!({"dup": "x"}))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralType);
    assert_eq!(err.path().unwrap().segments(), ["parent", "dup"]);
}

#[test]
fn incrementarray_groups_by_child_on_dump() {
    let template = field(json!({
        "id": "log", "name": "Log", "kind": "incrementarray",
        "incrementarray": [
            {"id": "in", "name": "In", "kind": "number"},
            {"id": "out", "name": "Out", "kind": "number"},
        ]
    }));
    let input = doc(json!({"out": [3, 4], "in": [1, 2]}));
    let value = template.load_value(&input).unwrap();

    let order: Vec<_> = value
        .children()
        .iter()
        .map(|c| (c.id.as_str(), c.as_f64().unwrap()))
        .collect();
    assert_eq!(order, [("in", 1.0), ("in", 2.0), ("out", 3.0), ("out", 4.0)]);
    assert_eq!(value.dump_value().unwrap(), input);
}

#[test]
fn failure_returns_no_partial_result() {
    let schema = Schema::load_template(&doc(json!({
        "id": "s", "name": "S",
        "fields": [
            {"id": "ok", "name": "Ok", "kind": "string"},
            {"id": "bad", "name": "Bad", "kind": "number"},
        ]
    })))
    .unwrap();
    let result = schema.load_value(&doc(json!({"s": {"ok": "fine", "bad": "nope"}})));
    let err = result.unwrap_err();
    assert_eq!(err.path().unwrap().segments(), ["s", "bad"]);
}

#[test]
fn deep_required_error_names_nearest_parent() {
    let schema = Schema::load_template(&doc(json!({
        "id": "settings", "name": "Settings",
        "fields": [{
            "id": "network", "name": "Network", "kind": "array",
            "array": [{
                "id": "proxy", "name": "Proxy", "kind": "array",
                "array": [{"id": "host", "name": "Host", "kind": "string", "required": true}]
            }]
        }]
    })))
    .unwrap();
    let err = schema
        .load_value(&doc(json!({"settings": {"network": {"proxy": {}}}})))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequiredFieldMissing);
    assert_eq!(
        err.to_string(),
        "settings.network.proxy: required field 'host' is missing"
    );
}
