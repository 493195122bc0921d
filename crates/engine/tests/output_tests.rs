//! Golden tests for the four output shapes.
//!
//! The projections are part of the wire contract: member order and member
//! presence are fixed, so these compare full serialized values.

use jsonschema_engine::{evaluate, EvaluationOptions, OutputFormat};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {"a": {"type": "integer"}},
        "required": ["a"]
    })
}

fn run(format: OutputFormat, instance: &Value) -> Value {
    let options = EvaluationOptions::default().with_output_format(format);
    evaluate(&schema(), instance, &options)
        .expect("evaluation should succeed")
        .to_value()
}

#[test]
fn test_flag_output() {
    assert_eq!(run(OutputFormat::Flag, &json!({"a": 1})), json!({"valid": true}));
    assert_eq!(run(OutputFormat::Flag, &json!({})), json!({"valid": false}));
}

#[test]
fn test_basic_output_valid() {
    assert_eq!(
        run(OutputFormat::Basic, &json!({"a": 1})),
        json!({
            "valid": true,
            "details": [
                {
                    "valid": true,
                    "evaluationPath": "",
                    "schemaLocation": "json-schema:///#",
                    "instanceLocation": "",
                    "annotations": {"properties": ["a"]}
                }
            ]
        })
    );
}

#[test]
fn test_basic_output_invalid() {
    assert_eq!(
        run(OutputFormat::Basic, &json!({"a": "x"})),
        json!({
            "valid": false,
            "details": [
                {
                    "valid": false,
                    "evaluationPath": "/properties/a",
                    "schemaLocation": "json-schema:///#/properties/a",
                    "instanceLocation": "/a",
                    "errors": [
                        {
                            "keyword": "type",
                            "message": "Value is \"string\" but should be \"integer\""
                        }
                    ]
                }
            ]
        })
    );
}

#[test]
fn test_verbose_output_includes_passing_nodes() {
    assert_eq!(
        run(OutputFormat::Verbose, &json!({"a": 1})),
        json!({
            "valid": true,
            "evaluationPath": "",
            "schemaLocation": "json-schema:///#",
            "instanceLocation": "",
            "annotations": {"properties": ["a"]},
            "details": [
                {
                    "valid": true,
                    "evaluationPath": "/properties/a",
                    "schemaLocation": "json-schema:///#/properties/a",
                    "instanceLocation": "/a"
                }
            ]
        })
    );
}

#[test]
fn test_detailed_output_collapses_contentless_passing_nodes() {
    // Valid case: the passing /properties/a node carries nothing and is
    // spliced out; the annotated root stays.
    assert_eq!(
        run(OutputFormat::Detailed, &json!({"a": 1})),
        json!({
            "valid": true,
            "evaluationPath": "",
            "schemaLocation": "json-schema:///#",
            "instanceLocation": "",
            "annotations": {"properties": ["a"]}
        })
    );

    // Invalid case: the failing leaf keeps its location.
    assert_eq!(
        run(OutputFormat::Detailed, &json!({"a": "x"})),
        json!({
            "valid": false,
            "evaluationPath": "",
            "schemaLocation": "json-schema:///#",
            "instanceLocation": "",
            "details": [
                {
                    "valid": false,
                    "evaluationPath": "/properties/a",
                    "schemaLocation": "json-schema:///#/properties/a",
                    "instanceLocation": "/a",
                    "errors": [
                        {
                            "keyword": "type",
                            "message": "Value is \"string\" but should be \"integer\""
                        }
                    ]
                }
            ]
        })
    );
}

#[test]
fn test_member_order_is_bit_exact() {
    let value = run(OutputFormat::Verbose, &json!({"a": 1}));
    let serialized = serde_json::to_string(&value).unwrap();
    let expected = concat!(
        r#"{"valid":true,"#,
        r#""evaluationPath":"","#,
        r#""schemaLocation":"json-schema:///#","#,
        r#""instanceLocation":"","#,
        r#""annotations":{"properties":["a"]},"#,
        r#""details":[{"valid":true,"#,
        r#""evaluationPath":"/properties/a","#,
        r#""schemaLocation":"json-schema:///#/properties/a","#,
        r#""instanceLocation":"/a"}]}"#
    );
    assert_eq!(serialized, expected);
}

#[test]
fn test_nested_error_keeps_intermediate_invalid_nodes_in_detailed() {
    let schema = json!({
        "properties": {
            "outer": {"items": {"type": "integer"}}
        }
    });
    let options = EvaluationOptions::default().with_output_format(OutputFormat::Detailed);
    let value = evaluate(&schema, &json!({"outer": [1, "x"]}), &options)
        .unwrap()
        .to_value();
    // Root → /properties/outer → /items chain stays intact because every
    // node on the failure path is invalid.
    assert_eq!(value["valid"], json!(false));
    let outer = &value["details"][0];
    assert_eq!(outer["evaluationPath"], json!("/properties/outer"));
    let leaf = &outer["details"][0];
    assert_eq!(leaf["evaluationPath"], json!("/properties/outer/items"));
    assert_eq!(leaf["instanceLocation"], json!("/outer/1"));
    assert_eq!(leaf["errors"][0]["keyword"], json!("type"));
}
