//! Reference resolution: registry sharing, anchors, identifier rebasing,
//! `$dynamicRef` reparenting, `$recursiveRef`, and loader failure modes.

use jsonschema_engine::{
    evaluate, EvaluationError, EvaluationOptions, OutputFormat, SchemaRegistry,
};
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

fn with_registry(registry: &Arc<SchemaRegistry>) -> EvaluationOptions {
    EvaluationOptions::default().with_registry(registry.clone())
}

fn uri(s: &str) -> Url {
    Url::parse(s).unwrap()
}

#[test]
fn test_cross_document_ref_through_shared_registry() {
    let registry = Arc::new(SchemaRegistry::new());
    registry
        .register(
            uri("https://example.com/name"),
            &json!({"type": "string", "minLength": 1}),
        )
        .unwrap();

    let schema = json!({
        "properties": {"name": {"$ref": "https://example.com/name"}}
    });
    let options = with_registry(&registry);
    assert!(evaluate(&schema, &json!({"name": "x"}), &options).unwrap().valid());
    assert!(!evaluate(&schema, &json!({"name": ""}), &options).unwrap().valid());
}

#[test]
fn test_ref_resolves_relative_to_enclosing_id() {
    let registry = Arc::new(SchemaRegistry::new());
    registry
        .register(uri("https://example.com/shapes/point"), &json!({"type": "integer"}))
        .unwrap();

    // The schema's $id rebases "point" into /shapes/.
    let schema = json!({
        "$id": "https://example.com/shapes/box",
        "properties": {"x": {"$ref": "point"}}
    });
    let options = with_registry(&registry);
    assert!(evaluate(&schema, &json!({"x": 3}), &options).unwrap().valid());
    assert!(!evaluate(&schema, &json!({"x": "3"}), &options).unwrap().valid());
}

#[test]
fn test_embedded_resource_gets_its_own_base() {
    let schema = json!({
        "$id": "https://example.com/outer",
        "$defs": {
            "inner": {
                "$id": "https://example.com/inner",
                "type": "string",
                // Relative to the *inner* resource base.
                "$defs": {"helper": {"type": "boolean"}}
            }
        },
        "properties": {
            "s": {"$ref": "https://example.com/inner"},
            "b": {"$ref": "https://example.com/inner#/$defs/helper"}
        }
    });
    let options = EvaluationOptions::default();
    assert!(evaluate(&schema, &json!({"s": "ok", "b": true}), &options).unwrap().valid());
    assert!(!evaluate(&schema, &json!({"s": 1}), &options).unwrap().valid());
    assert!(!evaluate(&schema, &json!({"b": "not bool"}), &options).unwrap().valid());
}

#[test]
fn test_anchor_resolution() {
    let schema = json!({
        "$defs": {"named": {"$anchor": "target", "type": "integer"}},
        "$ref": "#target"
    });
    assert!(evaluate(&schema, &json!(5), &EvaluationOptions::default()).unwrap().valid());
    assert!(!evaluate(&schema, &json!("5"), &EvaluationOptions::default()).unwrap().valid());
}

#[test]
fn test_draft7_hash_id_anchor() {
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "definitions": {"named": {"$id": "#target", "type": "integer"}},
        "properties": {"v": {"$ref": "#target"}}
    });
    assert!(evaluate(&schema, &json!({"v": 5}), &EvaluationOptions::default()).unwrap().valid());
    assert!(!evaluate(&schema, &json!({"v": "5"}), &EvaluationOptions::default())
        .unwrap()
        .valid());
}

#[test]
fn test_unresolvable_ref_is_a_structural_error() {
    let schema = json!({"$ref": "#/$defs/missing"});
    let err = evaluate(&schema, &json!(1), &EvaluationOptions::default()).unwrap_err();
    assert!(matches!(err, EvaluationError::ReferenceResolution { .. }));
}

#[test]
fn test_network_fetch_requires_custom_loader() {
    let schema = json!({"$ref": "https://example.com/never-registered"});
    let err = evaluate(&schema, &json!(1), &EvaluationOptions::default()).unwrap_err();
    assert!(matches!(err, EvaluationError::Loader { .. }));
}

#[test]
fn test_dynamic_ref_without_matching_anchor_behaves_as_ref() {
    let schema = json!({
        "$defs": {"named": {"$anchor": "leaf", "type": "integer"}},
        "$dynamicRef": "#leaf"
    });
    assert!(evaluate(&schema, &json!(7), &EvaluationOptions::default()).unwrap().valid());
    assert!(!evaluate(&schema, &json!("x"), &EvaluationOptions::default()).unwrap().valid());
}

#[test]
fn test_dynamic_ref_reparents_to_outermost_scope() {
    // The canonical tree / strict-tree pair: the extension's dynamic anchor
    // shadows the base's at every recursion step.
    let registry = Arc::new(SchemaRegistry::new());
    registry
        .register(
            uri("https://example.com/tree"),
            &json!({
                "$dynamicAnchor": "node",
                "type": "object",
                "properties": {
                    "data": true,
                    "children": {"type": "array", "items": {"$dynamicRef": "#node"}}
                }
            }),
        )
        .unwrap();

    let strict_tree = json!({
        "$id": "https://example.com/strict-tree",
        "$dynamicAnchor": "node",
        "$ref": "https://example.com/tree",
        "unevaluatedProperties": false
    });

    let options = with_registry(&registry);
    assert!(evaluate(
        &strict_tree,
        &json!({"children": [{"data": 1}]}),
        &options
    )
    .unwrap()
    .valid());
    // The misspelled member is caught in the *nested* node because the
    // dynamic anchor re-binds to strict-tree, not tree.
    assert!(!evaluate(
        &strict_tree,
        &json!({"children": [{"daat": 1}]}),
        &options
    )
    .unwrap()
    .valid());
}

#[test]
fn test_recursive_ref_reparents_through_recursive_anchor() {
    let registry = Arc::new(SchemaRegistry::new());
    registry
        .register(
            uri("https://example.com/inner"),
            &json!({
                "$schema": "https://json-schema.org/draft/2019-09/schema",
                "$recursiveAnchor": true,
                "required": ["n"],
                "properties": {"next": {"$recursiveRef": "#"}}
            }),
        )
        .unwrap();

    let outer = json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$id": "https://example.com/outer",
        "$recursiveAnchor": true,
        "required": ["o"],
        "properties": {"x": {"$ref": "https://example.com/inner"}}
    });

    let options = with_registry(&registry);
    // "next" is validated against the *outer* schema: the recursive anchor
    // binds at the outermost dynamic scope.
    assert!(evaluate(
        &outer,
        &json!({"o": 1, "x": {"n": 1, "next": {"o": 2}}}),
        &options
    )
    .unwrap()
    .valid());
    assert!(!evaluate(
        &outer,
        &json!({"o": 1, "x": {"n": 1, "next": {"n": 2}}}),
        &options
    )
    .unwrap()
    .valid());
}

#[test]
fn test_shared_registry_survives_distinct_anonymous_schemas() {
    let registry = Arc::new(SchemaRegistry::new());
    let options = with_registry(&registry);
    // Two different documents with no $id share the default base URI; the
    // registry hands the second one a private slot instead of erroring.
    assert!(evaluate(&json!({"type": "integer"}), &json!(1), &options).unwrap().valid());
    assert!(evaluate(&json!({"type": "string"}), &json!("x"), &options).unwrap().valid());
    // And re-evaluating the first still works (idempotent re-registration).
    assert!(evaluate(&json!({"type": "integer"}), &json!(2), &options).unwrap().valid());
}

#[test]
fn test_ref_child_node_appears_under_ref_path() {
    let schema = json!({
        "$ref": "#/$defs/x",
        "$defs": {"x": {"type": "string"}}
    });
    let options = EvaluationOptions::default().with_output_format(OutputFormat::Verbose);
    let output = evaluate(&schema, &json!(3), &options).unwrap();
    let value = output.to_value();
    let child = &value["details"][0];
    assert_eq!(child["evaluationPath"], json!("/$ref"));
    assert_eq!(child["schemaLocation"], json!("json-schema:///#/$defs/x"));
    assert_eq!(child["errors"][0]["keyword"], json!("type"));
}

#[test]
fn test_custom_keyword_registration() {
    use jsonschema_engine::{EvaluationContext, Keyword, ResultNode};

    #[derive(Debug)]
    struct EvenKeyword;

    impl Keyword for EvenKeyword {
        fn name(&self) -> &str {
            "x-even"
        }

        fn evaluate(
            &self,
            ctx: &mut EvaluationContext<'_>,
            node: &mut ResultNode,
        ) -> Result<(), EvaluationError> {
            if let Some(n) = ctx.value().as_u64() {
                if n % 2 != 0 {
                    node.fail(Some("x-even"), "Value is not even");
                }
            }
            Ok(())
        }
    }

    let registry = Arc::new(SchemaRegistry::new());
    registry.register_keyword(
        "x-even",
        Arc::new(|_name: &str, _value: &Value| {
            let keyword: Arc<dyn Keyword> = Arc::new(EvenKeyword);
            Ok(keyword)
        }),
    );

    let options = with_registry(&registry);
    assert!(evaluate(&json!({"x-even": true}), &json!(4), &options).unwrap().valid());
    assert!(!evaluate(&json!({"x-even": true}), &json!(5), &options).unwrap().valid());
}
