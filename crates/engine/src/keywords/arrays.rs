//! Array applicators and array-shape assertions.
//!
//! The `items` keyword has two historical forms: from 2020-12 it is a
//! single schema for the elements after `prefixItems`; in earlier dialects
//! it is a hybrid (one schema for every element, or positional schemas
//! with `additionalItems` covering the rest). Evaluated-index bookkeeping
//! flows through annotations: a number is the largest index applied, `true`
//! means every element, and `contains` publishes its matched index list.

use super::{priority, FactoryArgs, Keyword};
use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::result::ResultNode;
use crate::schema::Schema;
use jsonschema_types::json_equal;
use serde_json::{json, Value};
use std::sync::Arc;

/// `prefixItems` (2020-12+): positional subschemas.
#[derive(Debug)]
struct PrefixItemsKeyword {
    schemas: Vec<Arc<Schema>>,
}

impl Keyword for PrefixItemsKeyword {
    fn name(&self) -> &str {
        "prefixItems"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(items) = ctx.instance().as_borrowed().and_then(Value::as_array) else {
            return Ok(());
        };
        let mut all_valid = true;
        let mut last_applied: Option<usize> = None;
        for (i, (schema, child_value)) in self.schemas.iter().zip(items).enumerate() {
            let index = i.to_string();
            let child =
                ctx.apply_to_child(schema, &["prefixItems", &index], child_value, &index)?;
            all_valid &= child.valid();
            last_applied = Some(i);
            node.add_child(child);
            if !all_valid && ctx.apply_optimizations() {
                break;
            }
        }
        if !all_valid {
            node.invalidate();
        } else if let Some(last) = last_applied {
            let annotation = if last + 1 == items.len() {
                json!(true)
            } else {
                json!(last)
            };
            node.annotate("prefixItems", annotation);
        }
        Ok(())
    }
}

pub(crate) fn prefix_items(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(items) = args.value.as_array() else {
        return Err(args.ctx.malformed("prefixItems must be an array of schemas"));
    };
    let schemas: Result<Vec<_>, _> = items
        .iter()
        .enumerate()
        .map(|(i, sub)| {
            args.compiler
                .compile_child(args.ctx, sub, &["prefixItems", &i.to_string()])
        })
        .collect();
    Ok(Arc::new(PrefixItemsKeyword { schemas: schemas? }))
}

/// `items` (2020-12+): one schema for the elements after `prefixItems`.
#[derive(Debug)]
struct ItemsKeyword {
    schema: Arc<Schema>,
}

impl Keyword for ItemsKeyword {
    fn name(&self) -> &str {
        "items"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["prefixItems"]
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(items) = ctx.instance().as_borrowed().and_then(Value::as_array) else {
            return Ok(());
        };
        let start = match node.annotation("prefixItems") {
            Some(Value::Bool(true)) => return Ok(()),
            Some(value) => value.as_u64().map_or(0, |n| n as usize + 1),
            None => 0,
        };
        let mut all_valid = true;
        let mut applied = false;
        for (i, child_value) in items.iter().enumerate().skip(start) {
            let index = i.to_string();
            let child = ctx.apply_to_child(&self.schema, &["items"], child_value, &index)?;
            all_valid &= child.valid();
            applied = true;
            node.add_child(child);
            if !all_valid && ctx.apply_optimizations() {
                break;
            }
        }
        if !all_valid {
            node.invalidate();
        } else if applied {
            node.annotate("items", json!(true));
        }
        Ok(())
    }
}

pub(crate) fn items(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    if args.value.is_array() {
        return Err(args
            .ctx
            .malformed("array-form items was replaced by prefixItems in this dialect"));
    }
    let schema = args.compiler.compile_child(args.ctx, args.value, &["items"])?;
    Ok(Arc::new(ItemsKeyword { schema }))
}

/// `items` in dialects up to 2019-09: hybrid schema/positional form.
#[derive(Debug)]
enum LegacyItemsForm {
    Single(Arc<Schema>),
    Positional(Vec<Arc<Schema>>),
}

#[derive(Debug)]
struct LegacyItemsKeyword {
    form: LegacyItemsForm,
}

impl Keyword for LegacyItemsKeyword {
    fn name(&self) -> &str {
        "items"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(items) = ctx.instance().as_borrowed().and_then(Value::as_array) else {
            return Ok(());
        };
        let mut all_valid = true;
        match &self.form {
            LegacyItemsForm::Single(schema) => {
                let mut applied = false;
                for (i, child_value) in items.iter().enumerate() {
                    let index = i.to_string();
                    let child = ctx.apply_to_child(schema, &["items"], child_value, &index)?;
                    all_valid &= child.valid();
                    applied = true;
                    node.add_child(child);
                    if !all_valid && ctx.apply_optimizations() {
                        break;
                    }
                }
                if !all_valid {
                    node.invalidate();
                } else if applied {
                    node.annotate("items", json!(true));
                }
            }
            LegacyItemsForm::Positional(schemas) => {
                let mut last_applied: Option<usize> = None;
                for (i, (schema, child_value)) in schemas.iter().zip(items).enumerate() {
                    let index = i.to_string();
                    let child =
                        ctx.apply_to_child(schema, &["items", &index], child_value, &index)?;
                    all_valid &= child.valid();
                    last_applied = Some(i);
                    node.add_child(child);
                    if !all_valid && ctx.apply_optimizations() {
                        break;
                    }
                }
                if !all_valid {
                    node.invalidate();
                } else if let Some(last) = last_applied {
                    let annotation = if last + 1 == items.len() {
                        json!(true)
                    } else {
                        json!(last)
                    };
                    node.annotate("items", annotation);
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn legacy_items(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let form = match args.value {
        Value::Array(subs) => {
            let schemas: Result<Vec<_>, _> = subs
                .iter()
                .enumerate()
                .map(|(i, sub)| {
                    args.compiler
                        .compile_child(args.ctx, sub, &["items", &i.to_string()])
                })
                .collect();
            LegacyItemsForm::Positional(schemas?)
        }
        _ => LegacyItemsForm::Single(
            args.compiler.compile_child(args.ctx, args.value, &["items"])?,
        ),
    };
    Ok(Arc::new(LegacyItemsKeyword { form }))
}

/// `additionalItems` (≤ 2019-09): elements beyond positional `items`.
#[derive(Debug)]
struct AdditionalItemsKeyword {
    schema: Arc<Schema>,
}

impl Keyword for AdditionalItemsKeyword {
    fn name(&self) -> &str {
        "additionalItems"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["items"]
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(items) = ctx.instance().as_borrowed().and_then(Value::as_array) else {
            return Ok(());
        };
        // Only meaningful after positional items left a numeric annotation.
        let Some(start) = node.annotation("items").and_then(Value::as_u64) else {
            return Ok(());
        };
        let mut all_valid = true;
        let mut applied = false;
        for (i, child_value) in items.iter().enumerate().skip(start as usize + 1) {
            let index = i.to_string();
            let child =
                ctx.apply_to_child(&self.schema, &["additionalItems"], child_value, &index)?;
            all_valid &= child.valid();
            applied = true;
            node.add_child(child);
            if !all_valid && ctx.apply_optimizations() {
                break;
            }
        }
        if !all_valid {
            node.invalidate();
        } else if applied {
            node.annotate("additionalItems", json!(true));
        }
        Ok(())
    }
}

pub(crate) fn additional_items(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let schema = args
        .compiler
        .compile_child(args.ctx, args.value, &["additionalItems"])?;
    Ok(Arc::new(AdditionalItemsKeyword { schema }))
}

/// `contains`, with the 2019-09 `minContains`/`maxContains` bounds read
/// from the parent object at compile time. Publishes the matched index
/// list as its annotation.
#[derive(Debug)]
struct ContainsKeyword {
    schema: Arc<Schema>,
    min: u64,
    max: Option<u64>,
}

impl Keyword for ContainsKeyword {
    fn name(&self) -> &str {
        "contains"
    }

    fn priority(&self) -> i32 {
        priority::APPLICATOR
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(items) = ctx.instance().as_borrowed().and_then(Value::as_array) else {
            return Ok(());
        };
        let mut matched = Vec::new();
        for (i, child_value) in items.iter().enumerate() {
            let index = i.to_string();
            let child = ctx.apply_to_child(&self.schema, &["contains"], child_value, &index)?;
            if child.valid() {
                matched.push(json!(i));
            }
            node.add_child(child);
        }
        let count = matched.len() as u64;
        if count < self.min {
            let message = if count == 0 {
                "No array items match the contains schema".to_string()
            } else {
                format!("Fewer than {} array items match the contains schema", self.min)
            };
            node.fail(Some("contains"), message);
        } else if self.max.is_some_and(|max| count > max) {
            node.fail(
                Some("contains"),
                format!(
                    "More than {} array items match the contains schema",
                    self.max.unwrap_or_default()
                ),
            );
        } else {
            node.annotate("contains", Value::Array(matched));
        }
        Ok(())
    }
}

pub(crate) fn contains(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let schema = args
        .compiler
        .compile_child(args.ctx, args.value, &["contains"])?;
    // The bound keywords only exist from 2019-09.
    let bounds_recognized = super::factory_for(args.ctx.dialect, "minContains").is_some();
    let min = if bounds_recognized {
        args.parent
            .get("minContains")
            .and_then(Value::as_u64)
            .unwrap_or(1)
    } else {
        1
    };
    let max = if bounds_recognized {
        args.parent.get("maxContains").and_then(Value::as_u64)
    } else {
        None
    };
    Ok(Arc::new(ContainsKeyword { schema, min, max }))
}

/// `minContains` / `maxContains` assert through `contains`; the keyword
/// instances exist so the members are recognized and ordered.
#[derive(Debug)]
struct ContainsBoundKeyword {
    name: &'static str,
}

impl Keyword for ContainsBoundKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["contains"]
    }

    fn evaluate(
        &self,
        _ctx: &mut EvaluationContext<'_>,
        _node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        Ok(())
    }
}

pub(crate) fn min_contains(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    super::objects::non_negative_integer(&args)?;
    Ok(Arc::new(ContainsBoundKeyword {
        name: "minContains",
    }))
}

pub(crate) fn max_contains(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    super::objects::non_negative_integer(&args)?;
    Ok(Arc::new(ContainsBoundKeyword {
        name: "maxContains",
    }))
}

/// `minItems` / `maxItems`.
#[derive(Debug)]
struct ItemCountKeyword {
    name: &'static str,
    limit: u64,
    max: bool,
}

impl Keyword for ItemCountKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(items) = ctx.value().as_array() else {
            return Ok(());
        };
        let count = items.len() as u64;
        if self.max && count > self.limit {
            node.fail(
                Some(self.name),
                format!("Array has more than {} items", self.limit),
            );
        } else if !self.max && count < self.limit {
            node.fail(
                Some(self.name),
                format!("Array has fewer than {} items", self.limit),
            );
        }
        Ok(())
    }
}

pub(crate) fn min_items(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    Ok(Arc::new(ItemCountKeyword {
        name: "minItems",
        limit: super::objects::non_negative_integer(&args)?,
        max: false,
    }))
}

pub(crate) fn max_items(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    Ok(Arc::new(ItemCountKeyword {
        name: "maxItems",
        limit: super::objects::non_negative_integer(&args)?,
        max: true,
    }))
}

/// `uniqueItems`: pairwise structural equality (mathematical numbers,
/// order-insensitive objects).
#[derive(Debug)]
struct UniqueItemsKeyword {
    enabled: bool,
}

impl Keyword for UniqueItemsKeyword {
    fn name(&self) -> &str {
        "uniqueItems"
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        if !self.enabled {
            return Ok(());
        }
        let Some(items) = ctx.value().as_array() else {
            return Ok(());
        };
        for (i, left) in items.iter().enumerate() {
            for right in items.iter().skip(i + 1) {
                if json_equal(left, right) {
                    node.fail(Some("uniqueItems"), "Array items are not unique");
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn unique_items(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(enabled) = args.value.as_bool() else {
        return Err(args.ctx.malformed("uniqueItems must be a boolean"));
    };
    Ok(Arc::new(UniqueItemsKeyword { enabled }))
}
