//! The `unevaluated*` family: applicators that observe what every other
//! keyword in the same frame (and in valid in-place descendants) already
//! covered, then apply their subschema to the remainder.
//!
//! These are the keywords the annotation-propagation protocol exists for:
//! they run last, and they read the result subtree rather than the schema.

use super::{priority, FactoryArgs, Keyword};
use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::result::ResultNode;
use crate::schema::Schema;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug)]
struct UnevaluatedItemsKeyword {
    schema: Arc<Schema>,
}

impl Keyword for UnevaluatedItemsKeyword {
    fn name(&self) -> &str {
        "unevaluatedItems"
    }

    fn priority(&self) -> i32 {
        priority::UNEVALUATED
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[
            "prefixItems",
            "items",
            "additionalItems",
            "contains",
            "if",
            "then",
            "else",
            "allOf",
            "anyOf",
            "oneOf",
            "not",
            "dependentSchemas",
            "dependencies",
            "$ref",
            "$dynamicRef",
            "$recursiveRef",
        ]
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(items) = ctx.instance().as_borrowed().and_then(Value::as_array) else {
            return Ok(());
        };
        let location = ctx.instance_location().clone();

        // Gather index coverage from this frame and valid in-place results.
        let mut covered_all = false;
        let mut covered_until: Option<u64> = None;
        let mut covered_indices: HashSet<u64> = HashSet::new();
        for name in ["prefixItems", "items", "additionalItems", "unevaluatedItems"] {
            let mut found = Vec::new();
            node.collect_annotations(name, &location, &mut found);
            for annotation in found {
                match annotation {
                    Value::Bool(true) => covered_all = true,
                    other => {
                        if let Some(n) = other.as_u64() {
                            covered_until = Some(covered_until.map_or(n, |c| c.max(n)));
                        }
                    }
                }
            }
        }
        let mut contains_matches = Vec::new();
        node.collect_annotations("contains", &location, &mut contains_matches);
        for annotation in contains_matches {
            if let Some(indices) = annotation.as_array() {
                covered_indices.extend(indices.iter().filter_map(Value::as_u64));
            }
        }
        if covered_all {
            return Ok(());
        }

        let start = covered_until.map_or(0, |n| n as usize + 1);
        let mut all_valid = true;
        let mut applied = false;
        for (i, child_value) in items.iter().enumerate().skip(start) {
            if covered_indices.contains(&(i as u64)) {
                continue;
            }
            let index = i.to_string();
            let child =
                ctx.apply_to_child(&self.schema, &["unevaluatedItems"], child_value, &index)?;
            all_valid &= child.valid();
            applied = true;
            node.add_child(child);
        }
        if !all_valid {
            node.invalidate();
        } else if applied {
            node.annotate("unevaluatedItems", json!(true));
        }
        Ok(())
    }
}

pub(crate) fn unevaluated_items(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let schema = args
        .compiler
        .compile_child(args.ctx, args.value, &["unevaluatedItems"])?;
    Ok(Arc::new(UnevaluatedItemsKeyword { schema }))
}

#[derive(Debug)]
struct UnevaluatedPropertiesKeyword {
    schema: Arc<Schema>,
}

impl Keyword for UnevaluatedPropertiesKeyword {
    fn name(&self) -> &str {
        "unevaluatedProperties"
    }

    fn priority(&self) -> i32 {
        priority::UNEVALUATED
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[
            "properties",
            "patternProperties",
            "additionalProperties",
            "if",
            "then",
            "else",
            "allOf",
            "anyOf",
            "oneOf",
            "not",
            "dependentSchemas",
            "dependencies",
            "$ref",
            "$dynamicRef",
            "$recursiveRef",
        ]
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(object) = ctx.instance().as_borrowed().and_then(Value::as_object) else {
            return Ok(());
        };
        let location = ctx.instance_location().clone();

        let mut evaluated: HashSet<String> = HashSet::new();
        for name in [
            "properties",
            "patternProperties",
            "additionalProperties",
            "unevaluatedProperties",
        ] {
            let mut found = Vec::new();
            node.collect_annotations(name, &location, &mut found);
            for annotation in found {
                if let Some(names) = annotation.as_array() {
                    evaluated.extend(names.iter().filter_map(Value::as_str).map(str::to_string));
                }
            }
        }

        let mut all_valid = true;
        let mut applied = Vec::new();
        for (name, child_value) in object {
            if evaluated.contains(name) {
                continue;
            }
            let child = ctx.apply_to_child(
                &self.schema,
                &["unevaluatedProperties"],
                child_value,
                name,
            )?;
            all_valid &= child.valid();
            applied.push(Value::String(name.clone()));
            node.add_child(child);
        }
        if !all_valid {
            node.invalidate();
        } else if !applied.is_empty() {
            node.annotate("unevaluatedProperties", Value::Array(applied));
        }
        Ok(())
    }
}

pub(crate) fn unevaluated_properties(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let schema = args
        .compiler
        .compile_child(args.ctx, args.value, &["unevaluatedProperties"])?;
    Ok(Arc::new(UnevaluatedPropertiesKeyword { schema }))
}
