//! Pure annotation keywords: schema metadata (`title`, `description`,
//! `default`, `examples`, `deprecated`, `readOnly`, `writeOnly`) and the
//! content-in-string keywords (`contentEncoding`, `contentMediaType`,
//! `contentSchema`), which annotate without decoding or asserting.

use super::{FactoryArgs, Keyword};
use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::result::ResultNode;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug)]
struct AnnotationKeyword {
    name: String,
    value: Value,
}

impl Keyword for AnnotationKeyword {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        _ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        node.annotate(&self.name, self.value.clone());
        Ok(())
    }
}

pub(crate) fn annotation(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    match args.name {
        "title" | "description" | "contentEncoding" | "contentMediaType" => {
            if !args.value.is_string() {
                return Err(args
                    .ctx
                    .malformed(format!("{} must be a string", args.name)));
            }
        }
        "deprecated" | "readOnly" | "writeOnly" => {
            if !args.value.is_boolean() {
                return Err(args
                    .ctx
                    .malformed(format!("{} must be a boolean", args.name)));
            }
        }
        "examples" => {
            if !args.value.is_array() {
                return Err(args.ctx.malformed("examples must be an array"));
            }
        }
        _ => {}
    }
    Ok(Arc::new(AnnotationKeyword {
        name: args.name.to_string(),
        value: args.value.clone(),
    }))
}
