//! Object applicators and object-shape assertions.

use super::{priority, FactoryArgs, Keyword};
use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::result::ResultNode;
use crate::schema::Schema;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

/// `properties`: one subschema per named member.
#[derive(Debug)]
struct PropertiesKeyword {
    properties: Vec<(String, Arc<Schema>)>,
}

impl Keyword for PropertiesKeyword {
    fn name(&self) -> &str {
        "properties"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(object) = ctx.instance().as_borrowed().and_then(Value::as_object) else {
            return Ok(());
        };
        let mut applied = Vec::new();
        let mut all_valid = true;
        for (name, schema) in &self.properties {
            let Some(child_value) = object.get(name) else {
                continue;
            };
            let child = ctx.apply_to_child(schema, &["properties", name], child_value, name)?;
            all_valid &= child.valid();
            applied.push(Value::String(name.clone()));
            node.add_child(child);
            if !all_valid && ctx.apply_optimizations() {
                break;
            }
        }
        if all_valid {
            node.annotate("properties", Value::Array(applied));
        } else {
            node.invalidate();
        }
        Ok(())
    }
}

pub(crate) fn properties(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(map) = args.value.as_object() else {
        return Err(args.ctx.malformed("properties must be an object of schemas"));
    };
    let mut properties = Vec::with_capacity(map.len());
    for (name, sub) in map {
        properties.push((
            name.clone(),
            args.compiler
                .compile_child(args.ctx, sub, &["properties", name])?,
        ));
    }
    Ok(Arc::new(PropertiesKeyword { properties }))
}

/// `patternProperties`: each member whose name matches a pattern gets that
/// pattern's subschema.
#[derive(Debug)]
struct PatternPropertiesKeyword {
    patterns: Vec<(String, Regex, Arc<Schema>)>,
}

impl Keyword for PatternPropertiesKeyword {
    fn name(&self) -> &str {
        "patternProperties"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(object) = ctx.instance().as_borrowed().and_then(Value::as_object) else {
            return Ok(());
        };
        let mut matched = Vec::new();
        let mut all_valid = true;
        for (source, regex, schema) in &self.patterns {
            for (name, child_value) in object {
                if !regex.is_match(name) {
                    continue;
                }
                let child = ctx.apply_to_child(
                    schema,
                    &["patternProperties", source],
                    child_value,
                    name,
                )?;
                all_valid &= child.valid();
                let name_value = Value::String(name.clone());
                if !matched.contains(&name_value) {
                    matched.push(name_value);
                }
                node.add_child(child);
            }
        }
        if all_valid {
            node.annotate("patternProperties", Value::Array(matched));
        } else {
            node.invalidate();
        }
        Ok(())
    }
}

pub(crate) fn pattern_properties(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(map) = args.value.as_object() else {
        return Err(args
            .ctx
            .malformed("patternProperties must be an object of schemas"));
    };
    let mut patterns = Vec::with_capacity(map.len());
    for (source, sub) in map {
        let regex = Regex::new(source).map_err(|e| {
            args.ctx
                .malformed(format!("invalid patternProperties regex `{source}`: {e}"))
        })?;
        patterns.push((
            source.clone(),
            regex,
            args.compiler
                .compile_child(args.ctx, sub, &["patternProperties", source])?,
        ));
    }
    Ok(Arc::new(PatternPropertiesKeyword { patterns }))
}

/// `additionalProperties`: applies to members claimed by neither
/// `properties` nor `patternProperties`. The sibling names and patterns
/// are captured lexically at compile time, so this works identically in
/// every dialect.
#[derive(Debug)]
struct AdditionalPropertiesKeyword {
    schema: Arc<Schema>,
    sibling_names: Vec<String>,
    sibling_patterns: Vec<Regex>,
}

impl Keyword for AdditionalPropertiesKeyword {
    fn name(&self) -> &str {
        "additionalProperties"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn dependencies(&self) -> &'static [&'static str] {
        // Ordering only: run after the siblings so the result tree reads
        // in application order.
        &["properties", "patternProperties"]
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(object) = ctx.instance().as_borrowed().and_then(Value::as_object) else {
            return Ok(());
        };
        let mut applied = Vec::new();
        let mut all_valid = true;
        for (name, child_value) in object {
            if self.sibling_names.iter().any(|n| n == name)
                || self.sibling_patterns.iter().any(|p| p.is_match(name))
            {
                continue;
            }
            let child =
                ctx.apply_to_child(&self.schema, &["additionalProperties"], child_value, name)?;
            all_valid &= child.valid();
            applied.push(Value::String(name.clone()));
            node.add_child(child);
            if !all_valid && ctx.apply_optimizations() {
                break;
            }
        }
        if all_valid {
            node.annotate("additionalProperties", Value::Array(applied));
        } else {
            node.invalidate();
        }
        Ok(())
    }
}

pub(crate) fn additional_properties(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let schema = args
        .compiler
        .compile_child(args.ctx, args.value, &["additionalProperties"])?;
    let sibling_names = args
        .parent
        .get("properties")
        .and_then(Value::as_object)
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();
    let mut sibling_patterns = Vec::new();
    if let Some(patterns) = args.parent.get("patternProperties").and_then(Value::as_object) {
        for source in patterns.keys() {
            sibling_patterns.push(Regex::new(source).map_err(|e| {
                args.ctx
                    .malformed(format!("invalid patternProperties regex `{source}`: {e}"))
            })?);
        }
    }
    Ok(Arc::new(AdditionalPropertiesKeyword {
        schema,
        sibling_names,
        sibling_patterns,
    }))
}

/// `propertyNames`: the subschema applies to each member *name*, evaluated
/// as a transient string instance at the object's own location.
#[derive(Debug)]
struct PropertyNamesKeyword {
    schema: Arc<Schema>,
}

impl Keyword for PropertyNamesKeyword {
    fn name(&self) -> &str {
        "propertyNames"
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
        let names: Vec<String> = object.keys().cloned().collect();
        for name in names {
            let child =
                ctx.apply_synthetic(&self.schema, &["propertyNames"], Value::String(name))?;
            if !child.valid() {
                node.invalidate();
            }
            node.add_child(child);
        }
        Ok(())
    }
}

pub(crate) fn property_names(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let schema = args
        .compiler
        .compile_child(args.ctx, args.value, &["propertyNames"])?;
    Ok(Arc::new(PropertyNamesKeyword { schema }))
}

/// `required`: every listed member must be present.
#[derive(Debug)]
struct RequiredKeyword {
    required: Vec<String>,
}

impl Keyword for RequiredKeyword {
    fn name(&self) -> &str {
        "required"
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(object) = ctx.value().as_object() else {
            return Ok(());
        };
        let missing: Vec<&String> = self
            .required
            .iter()
            .filter(|name| !object.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            node.fail(
                Some("required"),
                format!("Required properties {missing:?} are missing"),
            );
        }
        Ok(())
    }
}

pub(crate) fn required(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let required = string_array(&args, "required")?;
    Ok(Arc::new(RequiredKeyword { required }))
}

/// `dependentRequired`: listed members must accompany their key.
#[derive(Debug)]
struct DependentRequiredKeyword {
    entries: Vec<(String, Vec<String>)>,
}

impl Keyword for DependentRequiredKeyword {
    fn name(&self) -> &str {
        "dependentRequired"
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(object) = ctx.value().as_object() else {
            return Ok(());
        };
        for (key, needed) in &self.entries {
            if !object.contains_key(key) {
                continue;
            }
            let missing: Vec<&String> =
                needed.iter().filter(|name| !object.contains_key(*name)).collect();
            if !missing.is_empty() {
                node.fail(
                    Some("dependentRequired"),
                    format!("Properties {missing:?} are required when \"{key}\" is present"),
                );
            }
        }
        Ok(())
    }
}

pub(crate) fn dependent_required(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(map) = args.value.as_object() else {
        return Err(args.ctx.malformed("dependentRequired must be an object"));
    };
    let mut entries = Vec::with_capacity(map.len());
    for (key, names) in map {
        let Some(names) = names.as_array() else {
            return Err(args
                .ctx
                .malformed("dependentRequired values must be arrays of property names"));
        };
        let names: Result<Vec<String>, EvaluationError> = names
            .iter()
            .map(|n| {
                n.as_str().map(str::to_string).ok_or_else(|| {
                    args.ctx
                        .malformed("dependentRequired values must be arrays of property names")
                })
            })
            .collect();
        entries.push((key.clone(), names?));
    }
    Ok(Arc::new(DependentRequiredKeyword { entries }))
}

/// `minProperties` / `maxProperties`.
#[derive(Debug)]
struct PropertyCountKeyword {
    name: &'static str,
    limit: u64,
    max: bool,
}

impl Keyword for PropertyCountKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(object) = ctx.value().as_object() else {
            return Ok(());
        };
        let count = object.len() as u64;
        if self.max && count > self.limit {
            node.fail(
                Some(self.name),
                format!("Object has more than {} properties", self.limit),
            );
        } else if !self.max && count < self.limit {
            node.fail(
                Some(self.name),
                format!("Object has fewer than {} properties", self.limit),
            );
        }
        Ok(())
    }
}

pub(crate) fn min_properties(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    Ok(Arc::new(PropertyCountKeyword {
        name: "minProperties",
        limit: non_negative_integer(&args)?,
        max: false,
    }))
}

pub(crate) fn max_properties(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    Ok(Arc::new(PropertyCountKeyword {
        name: "maxProperties",
        limit: non_negative_integer(&args)?,
        max: true,
    }))
}

pub(crate) fn non_negative_integer(args: &FactoryArgs<'_, '_>) -> Result<u64, EvaluationError> {
    args.value
        .as_u64()
        .ok_or_else(|| {
            args.ctx
                .malformed(format!("{} must be a non-negative integer", args.name))
        })
}

pub(crate) fn string_array(
    args: &FactoryArgs<'_, '_>,
    name: &str,
) -> Result<Vec<String>, EvaluationError> {
    let Some(items) = args.value.as_array() else {
        return Err(args
            .ctx
            .malformed(format!("{name} must be an array of strings")));
    };
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                args.ctx
                    .malformed(format!("{name} must be an array of strings"))
            })
        })
        .collect()
}
