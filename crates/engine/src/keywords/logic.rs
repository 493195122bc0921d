//! Boolean-logic applicators: `allOf`, `anyOf`, `oneOf`, `not`.
//!
//! Each keyword combines child validities by its own rule; the engine
//! never aggregates for them. Detail lives in the child nodes, so these
//! keywords invalidate without a message — except where every child is
//! individually valid and only the combination fails (`oneOf` with several
//! matches, `not`).

use super::{priority, FactoryArgs, Keyword};
use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::result::ResultNode;
use crate::schema::Schema;
use std::sync::Arc;

fn compile_list(
    args: &mut FactoryArgs<'_, '_>,
) -> Result<Vec<Arc<Schema>>, EvaluationError> {
    let Some(items) = args.value.as_array() else {
        return Err(args
            .ctx
            .malformed(format!("{} must be an array of schemas", args.name)));
    };
    if items.is_empty() {
        return Err(args
            .ctx
            .malformed(format!("{} must not be empty", args.name)));
    }
    items
        .iter()
        .enumerate()
        .map(|(i, sub)| {
            args.compiler
                .compile_child(args.ctx, sub, &[args.name, &i.to_string()])
        })
        .collect()
}

#[derive(Debug)]
struct AllOfKeyword {
    schemas: Vec<Arc<Schema>>,
}

impl Keyword for AllOfKeyword {
    fn name(&self) -> &str {
        "allOf"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        for (i, schema) in self.schemas.iter().enumerate() {
            let child = ctx.apply(schema, &["allOf", &i.to_string()])?;
            let failed = !child.valid();
            if failed {
                node.invalidate();
            }
            node.add_child(child);
            if failed && ctx.apply_optimizations() {
                // Flag output: remaining branches cannot change the answer.
                break;
            }
        }
        Ok(())
    }
}

pub(crate) fn all_of(mut args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    Ok(Arc::new(AllOfKeyword {
        schemas: compile_list(&mut args)?,
    }))
}

#[derive(Debug)]
struct AnyOfKeyword {
    schemas: Vec<Arc<Schema>>,
}

impl Keyword for AnyOfKeyword {
    fn name(&self) -> &str {
        "anyOf"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let mut any_valid = false;
        for (i, schema) in self.schemas.iter().enumerate() {
            let child = ctx.apply(schema, &["anyOf", &i.to_string()])?;
            any_valid |= child.valid();
            let done = any_valid && ctx.apply_optimizations();
            node.add_child(child);
            if done {
                break;
            }
        }
        if !any_valid {
            node.invalidate();
        }
        Ok(())
    }
}

pub(crate) fn any_of(mut args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    Ok(Arc::new(AnyOfKeyword {
        schemas: compile_list(&mut args)?,
    }))
}

#[derive(Debug)]
struct OneOfKeyword {
    schemas: Vec<Arc<Schema>>,
}

impl Keyword for OneOfKeyword {
    fn name(&self) -> &str {
        "oneOf"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let mut valid_count = 0usize;
        for (i, schema) in self.schemas.iter().enumerate() {
            let child = ctx.apply(schema, &["oneOf", &i.to_string()])?;
            if child.valid() {
                valid_count += 1;
            }
            node.add_child(child);
        }
        match valid_count {
            1 => {}
            0 => node.invalidate(),
            many => node.fail(
                Some("oneOf"),
                format!("{many} subschemas matched when exactly one is expected"),
            ),
        }
        Ok(())
    }
}

pub(crate) fn one_of(mut args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    Ok(Arc::new(OneOfKeyword {
        schemas: compile_list(&mut args)?,
    }))
}

#[derive(Debug)]
struct NotKeyword {
    schema: Arc<Schema>,
}

impl Keyword for NotKeyword {
    fn name(&self) -> &str {
        "not"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let child = ctx.apply(&self.schema, &["not"])?;
        if child.valid() {
            node.fail(Some("not"), "The instance must not be valid against the subschema");
        }
        node.add_child(child);
        Ok(())
    }
}

pub(crate) fn not(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let schema = args.compiler.compile_child(args.ctx, args.value, &["not"])?;
    Ok(Arc::new(NotKeyword { schema }))
}
