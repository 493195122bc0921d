//! Dialect selection and per-dialect keyword behavior.

use jsonschema_engine::{
    evaluate, Dialect, EvaluationError, EvaluationOptions, OutputFormat,
};
use serde_json::{json, Value};

fn is_valid(schema: &Value, instance: &Value) -> bool {
    evaluate(schema, instance, &EvaluationOptions::default())
        .expect("evaluation should succeed")
        .valid()
}

#[test]
fn test_dialect_detected_from_schema_member() {
    // prefixItems only exists from 2020-12; under draft 7 it is an unknown
    // member and asserts nothing.
    let draft7 = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "prefixItems": [{"type": "integer"}]
    });
    assert!(is_valid(&draft7, &json!(["not an integer"])));

    let latest = json!({"prefixItems": [{"type": "integer"}]});
    assert!(!is_valid(&latest, &json!(["not an integer"])));
}

#[test]
fn test_explicit_dialect_override_wins() {
    let schema = json!({"items": [{"type": "integer"}, {"type": "string"}]});
    // Array-form items is the draft 7 hybrid...
    let options = EvaluationOptions::default().with_dialect(Dialect::Draft7);
    assert!(evaluate(&schema, &json!([1, "a"]), &options).unwrap().valid());
    assert!(!evaluate(&schema, &json!(["a", 1]), &options).unwrap().valid());
    // ...and malformed under 2020-12.
    let err = evaluate(&schema, &json!([1, "a"]), &EvaluationOptions::default()).unwrap_err();
    assert!(matches!(err, EvaluationError::MalformedSchema { .. }));
}

#[test]
fn test_draft7_ref_overrides_siblings() {
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$ref": "#/definitions/a",
        "type": "string",
        "definitions": {"a": {"type": "integer"}}
    });
    // The sibling `type: "string"` is ignored in draft 7.
    assert!(is_valid(&schema, &json!(5)));
    assert!(!is_valid(&schema, &json!("five")));
}

#[test]
fn test_2019_ref_keeps_siblings() {
    let schema = json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$ref": "#/$defs/a",
        "minimum": 10,
        "$defs": {"a": {"type": "integer"}}
    });
    assert!(is_valid(&schema, &json!(12)));
    assert!(!is_valid(&schema, &json!(5)));
    assert!(!is_valid(&schema, &json!("12")));
}

#[test]
fn test_draft7_additional_items() {
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "items": [{"type": "integer"}, {"type": "string"}],
        "additionalItems": {"type": "boolean"}
    });
    assert!(is_valid(&schema, &json!([1, "a", true, false])));
    assert!(!is_valid(&schema, &json!([1, "a", 2])));
    // Schema-form items leaves additionalItems inert.
    let schema_form = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "items": {"type": "integer"},
        "additionalItems": {"type": "boolean"}
    });
    assert!(is_valid(&schema_form, &json!([1, 2, 3])));
}

#[test]
fn test_2020_prefix_items_with_items() {
    let schema = json!({
        "prefixItems": [{"type": "integer"}],
        "items": {"type": "string"}
    });
    assert!(is_valid(&schema, &json!([1, "a", "b"])));
    assert!(!is_valid(&schema, &json!([1, "a", 2])));
    assert!(!is_valid(&schema, &json!(["a"])));
}

#[test]
fn test_draft7_dependencies_hybrid() {
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "dependencies": {
            "credit": ["billing"],
            "shipping": {"required": ["address"]}
        }
    });
    assert!(is_valid(&schema, &json!({})));
    assert!(!is_valid(&schema, &json!({"credit": 1})));
    assert!(is_valid(&schema, &json!({"credit": 1, "billing": 2})));
    assert!(!is_valid(&schema, &json!({"shipping": 1})));
    assert!(is_valid(&schema, &json!({"shipping": 1, "address": "x"})));
}

#[test]
fn test_dependent_keywords_2019() {
    let schema = json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "dependentRequired": {"credit": ["billing"]},
        "dependentSchemas": {"shipping": {"required": ["address"]}}
    });
    assert!(!is_valid(&schema, &json!({"credit": 1})));
    assert!(!is_valid(&schema, &json!({"shipping": 1})));
    assert!(is_valid(&schema, &json!({"credit": 1, "billing": 2, "shipping": 3, "address": 4})));
}

#[test]
fn test_format_asserts_in_draft7_but_annotates_in_2020() {
    let draft7 = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "format": "ipv4"
    });
    assert!(!is_valid(&draft7, &json!("999.1.1.1")));
    assert!(is_valid(&draft7, &json!("127.0.0.1")));

    let latest = json!({"format": "ipv4"});
    assert!(is_valid(&latest, &json!("999.1.1.1")));

    // The option forces assertion in any dialect.
    let options = EvaluationOptions::default().with_format_validation(true);
    assert!(!evaluate(&latest, &json!("999.1.1.1"), &options).unwrap().valid());
}

#[test]
fn test_unknown_format_handling() {
    let schema = json!({"format": "zip-code-of-mars"});
    assert!(is_valid(&schema, &json!("anything")));

    let strict = EvaluationOptions::default().with_only_known_formats(true);
    let err = evaluate(&schema, &json!("anything"), &strict).unwrap_err();
    assert!(matches!(err, EvaluationError::UnknownFormat { .. }));
}

#[test]
fn test_format_annotation_survives_non_strings() {
    let schema = json!({"format": "ipv4"});
    let options = EvaluationOptions::default().with_output_format(OutputFormat::Basic);
    let output = evaluate(&schema, &json!(42), &options).unwrap();
    assert!(output.valid());
    let value = output.to_value();
    assert_eq!(value["details"][0]["annotations"]["format"], json!("ipv4"));
}

#[test]
fn test_unknown_members_become_annotations_when_enabled() {
    let schema = json!({"x-note": {"audience": "ops"}, "type": "object"});
    let instance = json!({});

    let silent = EvaluationOptions::default().with_output_format(OutputFormat::Basic);
    let value = evaluate(&schema, &instance, &silent).unwrap().to_value();
    assert!(value.get("details").is_none());

    let annotating = silent.clone().with_custom_keywords(true);
    let value = evaluate(&schema, &instance, &annotating).unwrap().to_value();
    assert_eq!(
        value["details"][0]["annotations"]["x-note"],
        json!({"audience": "ops"})
    );
}

#[test]
fn test_subschema_schema_member_is_advisory() {
    let schema = json!({
        "properties": {
            "a": {
                "$schema": "http://json-schema.org/draft-07/schema#",
                "type": "integer"
            }
        }
    });
    let options = EvaluationOptions::default().with_output_format(OutputFormat::Verbose);
    let output = evaluate(&schema, &json!({"a": 1}), &options).unwrap();
    assert!(output.valid());
    // The declaration is preserved as an annotation, nothing more.
    let child = &output.to_value()["details"][0];
    assert_eq!(
        child["annotations"]["$schema"],
        json!("http://json-schema.org/draft-07/schema#")
    );
}

#[test]
fn test_unknown_meta_schema_needs_loader() {
    let schema = json!({
        "$schema": "https://example.com/my-meta",
        "type": "integer"
    });
    let err = evaluate(&schema, &json!(1), &EvaluationOptions::default()).unwrap_err();
    assert!(matches!(err, EvaluationError::Loader { .. }));
}

#[test]
fn test_required_unknown_vocabulary_is_an_error() {
    use jsonschema_engine::SchemaRegistry;
    use std::sync::Arc;
    use url::Url;

    let registry = Arc::new(SchemaRegistry::new());
    registry
        .register(
            Url::parse("https://example.com/meta").unwrap(),
            &json!({
                "$vocabulary": {"https://example.com/vocab/unheard-of": true}
            }),
        )
        .unwrap();

    let schema = json!({
        "$schema": "https://example.com/meta",
        "type": "integer"
    });
    let options = EvaluationOptions::default().with_registry(registry);
    let err = evaluate(&schema, &json!(1), &options).unwrap_err();
    assert!(matches!(err, EvaluationError::UnknownVocabulary { .. }));
}

#[test]
fn test_metadata_keywords_annotate() {
    let schema = json!({
        "title": "Widget",
        "description": "A widget",
        "default": {"size": 1},
        "deprecated": true,
        "examples": [1, 2]
    });
    let options = EvaluationOptions::default().with_output_format(OutputFormat::Basic);
    let value = evaluate(&schema, &json!({}), &options).unwrap().to_value();
    let annotations = &value["details"][0]["annotations"];
    assert_eq!(annotations["title"], json!("Widget"));
    assert_eq!(annotations["default"], json!({"size": 1}));
    assert_eq!(annotations["deprecated"], json!(true));
}

#[test]
fn test_content_keywords_never_assert() {
    let schema = json!({
        "contentEncoding": "base64",
        "contentMediaType": "application/json",
        "contentSchema": {"type": "object"}
    });
    assert!(is_valid(&schema, &json!("definitely !!! not ~~~ base64")));
}

#[test]
fn test_next_dialect_selectable() {
    let schema = json!({
        "$schema": "https://json-schema.org/draft/next/schema",
        "prefixItems": [{"type": "integer"}]
    });
    assert!(!is_valid(&schema, &json!(["x"])));
}
