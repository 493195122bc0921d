//! Assertions over the local instance: `type`, `enum`, `const`, the
//! numeric bound family, and the string assertions. Pure functions of the
//! current value; no frame push.

use super::{FactoryArgs, Keyword};
use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::result::ResultNode;
use jsonschema_types::{json_equal, JsonNumber};
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// The seven instance type names, with `integer` meaning the mathematical
/// value (`1.0` is an integer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstanceType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    Integer,
    String,
}

impl InstanceType {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "object" => Self::Object,
            "array" => Self::Array,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "string" => Self::String,
            _ => return None,
        })
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Null => value.is_null(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Number => value.is_number(),
            Self::Integer => JsonNumber::from_value(value).is_some_and(|n| n.is_integer()),
            Self::String => value.is_string(),
        }
    }
}

fn actual_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug)]
struct TypeKeyword {
    types: Vec<InstanceType>,
}

impl Keyword for TypeKeyword {
    fn name(&self) -> &str {
        "type"
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let value = ctx.value();
        if self.types.iter().any(|t| t.matches(value)) {
            return Ok(());
        }
        let expected = if self.types.len() == 1 {
            format!("\"{}\"", self.types[0].name())
        } else {
            let names: Vec<String> = self
                .types
                .iter()
                .map(|t| format!("\"{}\"", t.name()))
                .collect();
            format!("one of [{}]", names.join(", "))
        };
        let message = format!(
            "Value is \"{}\" but should be {expected}",
            actual_type_name(value)
        );
        node.fail(Some("type"), message);
        Ok(())
    }
}

pub(crate) fn type_(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let parse_one = |v: &Value| {
        v.as_str()
            .and_then(InstanceType::from_name)
            .ok_or_else(|| args.ctx.malformed("type must name an instance type"))
    };
    let types = match args.value {
        Value::Array(names) => names.iter().map(parse_one).collect::<Result<Vec<_>, _>>()?,
        single => vec![parse_one(single)?],
    };
    Ok(Arc::new(TypeKeyword { types }))
}

#[derive(Debug)]
struct EnumKeyword {
    values: Vec<Value>,
}

impl Keyword for EnumKeyword {
    fn name(&self) -> &str {
        "enum"
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let value = ctx.value();
        if !self.values.iter().any(|allowed| json_equal(value, allowed)) {
            node.fail(Some("enum"), "Value does not match any enumerated value");
        }
        Ok(())
    }
}

pub(crate) fn enum_(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(values) = args.value.as_array() else {
        return Err(args.ctx.malformed("enum must be an array"));
    };
    Ok(Arc::new(EnumKeyword {
        values: values.clone(),
    }))
}

#[derive(Debug)]
struct ConstKeyword {
    value: Value,
}

impl Keyword for ConstKeyword {
    fn name(&self) -> &str {
        "const"
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        if !json_equal(ctx.value(), &self.value) {
            node.fail(Some("const"), "Value does not match the constant");
        }
        Ok(())
    }
}

pub(crate) fn const_(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    Ok(Arc::new(ConstKeyword {
        value: args.value.clone(),
    }))
}

#[derive(Debug)]
struct MultipleOfKeyword {
    divisor: JsonNumber,
    lexeme: String,
}

impl Keyword for MultipleOfKeyword {
    fn name(&self) -> &str {
        "multipleOf"
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(number) = JsonNumber::from_value(ctx.value()) else {
            return Ok(());
        };
        if !number.is_multiple_of(&self.divisor) {
            node.fail(
                Some("multipleOf"),
                format!("Value is not a multiple of {}", self.lexeme),
            );
        }
        Ok(())
    }
}

pub(crate) fn multiple_of(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(raw) = args.value.as_number() else {
        return Err(args.ctx.malformed("multipleOf must be a number"));
    };
    let divisor = JsonNumber::from_number(raw);
    let zero = JsonNumber::from_number(&serde_json::Number::from(0u64));
    if divisor.cmp(&zero) != Ordering::Greater {
        return Err(args.ctx.malformed("multipleOf must be greater than zero"));
    }
    Ok(Arc::new(MultipleOfKeyword {
        divisor,
        lexeme: raw.to_string(),
    }))
}

/// The four numeric bound keywords share one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Minimum,
    ExclusiveMinimum,
    Maximum,
    ExclusiveMaximum,
}

#[derive(Debug)]
struct BoundKeyword {
    bound: Bound,
    limit: JsonNumber,
    lexeme: String,
}

impl Keyword for BoundKeyword {
    fn name(&self) -> &str {
        match self.bound {
            Bound::Minimum => "minimum",
            Bound::ExclusiveMinimum => "exclusiveMinimum",
            Bound::Maximum => "maximum",
            Bound::ExclusiveMaximum => "exclusiveMaximum",
        }
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(number) = JsonNumber::from_value(ctx.value()) else {
            return Ok(());
        };
        let ordering = number.cmp(&self.limit);
        let (ok, message) = match self.bound {
            Bound::Minimum => (
                ordering != Ordering::Less,
                format!("Value is less than the minimum of {}", self.lexeme),
            ),
            Bound::ExclusiveMinimum => (
                ordering == Ordering::Greater,
                format!("Value is not strictly greater than {}", self.lexeme),
            ),
            Bound::Maximum => (
                ordering != Ordering::Greater,
                format!("Value is greater than the maximum of {}", self.lexeme),
            ),
            Bound::ExclusiveMaximum => (
                ordering == Ordering::Less,
                format!("Value is not strictly less than {}", self.lexeme),
            ),
        };
        if !ok {
            node.fail(Some(self.name()), message);
        }
        Ok(())
    }
}

fn bound(args: &FactoryArgs<'_, '_>, bound: Bound) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(raw) = args.value.as_number() else {
        return Err(args
            .ctx
            .malformed(format!("{} must be a number", args.name)));
    };
    Ok(Arc::new(BoundKeyword {
        bound,
        limit: JsonNumber::from_number(raw),
        lexeme: raw.to_string(),
    }))
}

pub(crate) fn minimum(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    bound(&args, Bound::Minimum)
}

pub(crate) fn exclusive_minimum(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    bound(&args, Bound::ExclusiveMinimum)
}

pub(crate) fn maximum(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    bound(&args, Bound::Maximum)
}

pub(crate) fn exclusive_maximum(
    args: FactoryArgs<'_, '_>,
) -> Result<Arc<dyn Keyword>, EvaluationError> {
    bound(&args, Bound::ExclusiveMaximum)
}

/// `minLength` / `maxLength` count Unicode scalar values, not bytes.
#[derive(Debug)]
struct LengthKeyword {
    name: &'static str,
    limit: u64,
    max: bool,
}

impl Keyword for LengthKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(s) = ctx.value().as_str() else {
            return Ok(());
        };
        let length = s.chars().count() as u64;
        if self.max && length > self.limit {
            node.fail(
                Some(self.name),
                format!("String is longer than {} characters", self.limit),
            );
        } else if !self.max && length < self.limit {
            node.fail(
                Some(self.name),
                format!("String is shorter than {} characters", self.limit),
            );
        }
        Ok(())
    }
}

pub(crate) fn min_length(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    Ok(Arc::new(LengthKeyword {
        name: "minLength",
        limit: super::objects::non_negative_integer(&args)?,
        max: false,
    }))
}

pub(crate) fn max_length(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    Ok(Arc::new(LengthKeyword {
        name: "maxLength",
        limit: super::objects::non_negative_integer(&args)?,
        max: true,
    }))
}

#[derive(Debug)]
struct PatternKeyword {
    regex: Regex,
    source: String,
}

impl Keyword for PatternKeyword {
    fn name(&self) -> &str {
        "pattern"
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(s) = ctx.value().as_str() else {
            return Ok(());
        };
        if !self.regex.is_match(s) {
            node.fail(
                Some("pattern"),
                format!("String does not match the pattern \"{}\"", self.source),
            );
        }
        Ok(())
    }
}

pub(crate) fn pattern(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(source) = args.value.as_str() else {
        return Err(args.ctx.malformed("pattern must be a string"));
    };
    let regex = Regex::new(source)
        .map_err(|e| args.ctx.malformed(format!("invalid pattern `{source}`: {e}")))?;
    Ok(Arc::new(PatternKeyword {
        regex,
        source: source.to_string(),
    }))
}
