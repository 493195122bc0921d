//! Core keywords that influence the frame rather than the instance:
//! identifiers, anchors, `$vocabulary`, `$comment`, and the definition
//! containers.
//!
//! Identifier rebasing and anchor registration happen at compile time in
//! the schema compiler; these keyword instances exist so the members are
//! recognized (not surfaced as custom annotations) and hold their place in
//! the evaluation order.

use super::{priority, FactoryArgs, Keyword};
use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::result::ResultNode;
use serde_json::Value;
use std::sync::Arc;

/// `$schema` outside the document root: advisory only. The active dialect
/// and vocabulary set never change mid-document; the declaration is kept
/// as an annotation.
#[derive(Debug)]
struct MetaSchemaKeyword {
    uri: String,
}

impl Keyword for MetaSchemaKeyword {
    fn name(&self) -> &str {
        "$schema"
    }

    fn priority(&self) -> i32 {
        priority::IDENTIFIER
    }

    fn evaluate(
        &self,
        _ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        node.annotate("$schema", Value::String(self.uri.clone()));
        Ok(())
    }
}

pub(crate) fn meta_schema(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(uri) = args.value.as_str() else {
        return Err(args.ctx.malformed("$schema must be a string"));
    };
    Ok(Arc::new(MetaSchemaKeyword {
        uri: uri.to_string(),
    }))
}

/// `$id`, anchors, `$vocabulary`, `$comment`: fully handled at compile
/// time, inert at evaluation time.
#[derive(Debug)]
struct IdentifierKeyword {
    name: String,
}

impl Keyword for IdentifierKeyword {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        priority::IDENTIFIER
    }

    fn evaluate(
        &self,
        _ctx: &mut EvaluationContext<'_>,
        _node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        Ok(())
    }
}

pub(crate) fn inert_identifier(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    match args.name {
        "$id" | "$anchor" | "$dynamicAnchor" | "$comment" => {
            if !args.value.is_string() {
                return Err(args
                    .ctx
                    .malformed(format!("{} must be a string", args.name)));
            }
        }
        "$recursiveAnchor" => {
            if !args.value.is_boolean() {
                return Err(args.ctx.malformed("$recursiveAnchor must be a boolean"));
            }
        }
        "$vocabulary" => {
            if !args.value.is_object() {
                return Err(args.ctx.malformed("$vocabulary must be an object"));
            }
        }
        _ => {}
    }
    Ok(Arc::new(IdentifierKeyword {
        name: args.name.to_string(),
    }))
}

/// `$defs` / `definitions`: a container of named schemas. The members are
/// compiled (interning pointer targets and registering anchors) but nothing
/// evaluates here.
#[derive(Debug)]
struct DefinitionsKeyword {
    name: String,
}

impl Keyword for DefinitionsKeyword {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        priority::DEFINITIONS
    }

    fn evaluate(
        &self,
        _ctx: &mut EvaluationContext<'_>,
        _node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        Ok(())
    }
}

pub(crate) fn definitions(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(map) = args.value.as_object() else {
        return Err(args
            .ctx
            .malformed(format!("{} must be an object of schemas", args.name)));
    };
    for (key, sub) in map {
        args.compiler.compile_child(args.ctx, sub, &[args.name, key])?;
    }
    Ok(Arc::new(DefinitionsKeyword {
        name: args.name.to_string(),
    }))
}
