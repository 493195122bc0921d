//! The reference keywords: `$ref`, `$dynamicRef`, `$recursiveRef`.
//!
//! Resolution happens at evaluation time against the registry; the target
//! is applied in place through the context's cycle guard. A reference
//! result adopts the target's validity; the detail lives in the child node.

use super::{priority, FactoryArgs, Keyword};
use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::resolver;
use crate::result::ResultNode;
use std::sync::Arc;

#[derive(Debug)]
struct RefKeyword {
    reference: String,
}

impl Keyword for RefKeyword {
    fn name(&self) -> &str {
        "$ref"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        ctx.check_cancelled()?;
        let target = resolver::resolve_ref(ctx, &self.reference)?;
        let child = ctx.apply_ref(&target, &["$ref"])?;
        if !child.valid() {
            node.invalidate();
        }
        node.add_child(child);
        Ok(())
    }
}

pub(crate) fn ref_(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(reference) = args.value.as_str() else {
        return Err(args.ctx.malformed("$ref must be a string"));
    };
    Ok(Arc::new(RefKeyword {
        reference: reference.to_string(),
    }))
}

#[derive(Debug)]
struct DynamicRefKeyword {
    reference: String,
}

impl Keyword for DynamicRefKeyword {
    fn name(&self) -> &str {
        "$dynamicRef"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        ctx.check_cancelled()?;
        let target = resolver::resolve_dynamic_ref(ctx, &self.reference)?;
        let child = ctx.apply_ref(&target, &["$dynamicRef"])?;
        if !child.valid() {
            node.invalidate();
        }
        node.add_child(child);
        Ok(())
    }
}

pub(crate) fn dynamic_ref(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(reference) = args.value.as_str() else {
        return Err(args.ctx.malformed("$dynamicRef must be a string"));
    };
    Ok(Arc::new(DynamicRefKeyword {
        reference: reference.to_string(),
    }))
}

#[derive(Debug)]
struct RecursiveRefKeyword;

impl Keyword for RecursiveRefKeyword {
    fn name(&self) -> &str {
        "$recursiveRef"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        ctx.check_cancelled()?;
        let target = resolver::resolve_recursive_ref(ctx)?;
        let child = ctx.apply_ref(&target, &["$recursiveRef"])?;
        if !child.valid() {
            node.invalidate();
        }
        node.add_child(child);
        Ok(())
    }
}

pub(crate) fn recursive_ref(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    if args.value.as_str() != Some("#") {
        return Err(args.ctx.malformed("$recursiveRef must be the string \"#\""));
    }
    Ok(Arc::new(RecursiveRefKeyword))
}
