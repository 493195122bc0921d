//! Conditional applicators: `if`/`then`/`else`, `dependentSchemas`, and
//! the draft 6/7 `dependencies` hybrid.

use super::{priority, FactoryArgs, Keyword};
use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::result::ResultNode;
use crate::schema::Schema;
use serde_json::Value;
use std::sync::Arc;

/// `if` applies its subschema and publishes the outcome as an annotation
/// for `then`/`else`; it never affects validity itself.
#[derive(Debug)]
struct IfKeyword {
    schema: Arc<Schema>,
}

impl Keyword for IfKeyword {
    fn name(&self) -> &str {
        "if"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let child = ctx.apply(&self.schema, &["if"])?;
        node.annotate("if", Value::Bool(child.valid()));
        node.add_child(child);
        Ok(())
    }
}

pub(crate) fn if_(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let schema = args.compiler.compile_child(args.ctx, args.value, &["if"])?;
    Ok(Arc::new(IfKeyword { schema }))
}

#[derive(Debug)]
struct ThenKeyword {
    schema: Arc<Schema>,
}

impl Keyword for ThenKeyword {
    fn name(&self) -> &str {
        "then"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["if"]
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        // Without a sibling `if` outcome there is nothing to do.
        if node.annotation("if") != Some(&Value::Bool(true)) {
            return Ok(());
        }
        let child = ctx.apply(&self.schema, &["then"])?;
        if !child.valid() {
            node.invalidate();
        }
        node.add_child(child);
        Ok(())
    }
}

pub(crate) fn then(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let schema = args.compiler.compile_child(args.ctx, args.value, &["then"])?;
    Ok(Arc::new(ThenKeyword { schema }))
}

#[derive(Debug)]
struct ElseKeyword {
    schema: Arc<Schema>,
}

impl Keyword for ElseKeyword {
    fn name(&self) -> &str {
        "else"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["if"]
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        if node.annotation("if") != Some(&Value::Bool(false)) {
            return Ok(());
        }
        let child = ctx.apply(&self.schema, &["else"])?;
        if !child.valid() {
            node.invalidate();
        }
        node.add_child(child);
        Ok(())
    }
}

pub(crate) fn else_(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let schema = args.compiler.compile_child(args.ctx, args.value, &["else"])?;
    Ok(Arc::new(ElseKeyword { schema }))
}

/// `dependentSchemas`: each named subschema applies in place when the
/// object has the named property.
#[derive(Debug)]
struct DependentSchemasKeyword {
    schemas: Vec<(String, Arc<Schema>)>,
}

impl Keyword for DependentSchemasKeyword {
    fn name(&self) -> &str {
        "dependentSchemas"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let instance = ctx.instance();
        let Some(object) = instance.value().as_object() else {
            return Ok(());
        };
        let present: Vec<&(String, Arc<Schema>)> = self
            .schemas
            .iter()
            .filter(|(key, _)| object.contains_key(key))
            .collect();
        for (key, schema) in present {
            let child = ctx.apply(schema, &["dependentSchemas", key])?;
            if !child.valid() {
                node.invalidate();
            }
            node.add_child(child);
        }
        Ok(())
    }
}

pub(crate) fn dependent_schemas(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(map) = args.value.as_object() else {
        return Err(args
            .ctx
            .malformed("dependentSchemas must be an object of schemas"));
    };
    let mut schemas = Vec::with_capacity(map.len());
    for (key, sub) in map {
        schemas.push((
            key.clone(),
            args.compiler
                .compile_child(args.ctx, sub, &["dependentSchemas", key])?,
        ));
    }
    Ok(Arc::new(DependentSchemasKeyword { schemas }))
}

/// Draft 6/7 `dependencies`: each entry is either a list of property names
/// that must accompany the key (the later `dependentRequired`) or a schema
/// applied in place (the later `dependentSchemas`).
#[derive(Debug)]
struct DependenciesKeyword {
    requirements: Vec<(String, Vec<String>)>,
    schemas: Vec<(String, Arc<Schema>)>,
}

impl Keyword for DependenciesKeyword {
    fn name(&self) -> &str {
        "dependencies"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let instance = ctx.instance();
        let Some(object) = instance.value().as_object() else {
            return Ok(());
        };
        for (key, needed) in &self.requirements {
            if !object.contains_key(key) {
                continue;
            }
            let missing: Vec<&String> =
                needed.iter().filter(|name| !object.contains_key(*name)).collect();
            if !missing.is_empty() {
                node.fail(
                    Some("dependencies"),
                    format!("Properties {missing:?} are required when \"{key}\" is present"),
                );
            }
        }
        let present: Vec<(String, Arc<Schema>)> = self
            .schemas
            .iter()
            .filter(|(key, _)| object.contains_key(key))
            .cloned()
            .collect();
        for (key, schema) in present {
            let child = ctx.apply(&schema, &["dependencies", &key])?;
            if !child.valid() {
                node.invalidate();
            }
            node.add_child(child);
        }
        Ok(())
    }
}

pub(crate) fn dependencies(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(map) = args.value.as_object() else {
        return Err(args.ctx.malformed("dependencies must be an object"));
    };
    let mut requirements = Vec::new();
    let mut schemas = Vec::new();
    for (key, entry) in map {
        match entry {
            Value::Array(names) => {
                let names: Result<Vec<String>, _> = names
                    .iter()
                    .map(|n| {
                        n.as_str().map(str::to_string).ok_or_else(|| {
                            args.ctx
                                .malformed("dependencies arrays must contain property names")
                        })
                    })
                    .collect();
                requirements.push((key.clone(), names?));
            }
            _ => schemas.push((
                key.clone(),
                args.compiler
                    .compile_child(args.ctx, entry, &["dependencies", key])?,
            )),
        }
    }
    Ok(Arc::new(DependenciesKeyword {
        requirements,
        schemas,
    }))
}
