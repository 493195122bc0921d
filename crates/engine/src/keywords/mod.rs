//! The keyword plugin surface.
//!
//! Every keyword is a leaf plugin behind the [`Keyword`] trait: a name, a
//! dispatch priority, declared annotation dependencies, and an evaluator.
//! Concrete keywords are built by per-dialect factories; the dispatcher
//! never special-cases individual keywords beyond this contract.

use crate::context::EvaluationContext;
use crate::dialect::Dialect;
use crate::error::EvaluationError;
use crate::result::ResultNode;
use crate::schema::{CompileCtx, Compiler};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

mod arrays;
mod assertions;
mod conditional;
mod core;
mod format;
mod logic;
mod metadata;
mod objects;
mod reference;
mod unevaluated;

/// Dispatch priorities; lower runs earlier. Within a dependency level ties
/// break by priority, then lexicographic name.
pub mod priority {
    /// Identifier keywords (`$id`, anchors, `$vocabulary`, `$comment`).
    pub const IDENTIFIER: i32 = -200;
    /// Definition containers (`$defs`, `definitions`).
    pub const DEFINITIONS: i32 = -100;
    /// Assertions and annotations over the local instance.
    pub const ASSERTION: i32 = 0;
    /// Applicators and reference keywords.
    pub const APPLICATOR: i32 = 10;
    /// The `unevaluated*` family, which must observe everything else.
    pub const UNEVALUATED: i32 = 1000;
}

/// A single schema keyword instance, carrying its parsed parameters.
pub trait Keyword: Send + Sync + std::fmt::Debug {
    /// The member name this keyword was parsed from.
    fn name(&self) -> &str;

    /// Dispatch priority; see [`priority`].
    fn priority(&self) -> i32 {
        priority::ASSERTION
    }

    /// Names of sibling keywords whose annotations must be collected before
    /// this keyword runs. Producers absent from the schema are ignored.
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    /// Evaluate against the current frame, recording errors, annotations,
    /// and child results on `node`. Structural failures abort through the
    /// `Err` channel; validation failures are data on `node`.
    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError>;
}

/// Arguments handed to a keyword factory at compile time.
pub(crate) struct FactoryArgs<'a, 'r> {
    /// The member name.
    pub name: &'a str,
    /// The whole schema object, for keywords that read siblings lexically.
    pub parent: &'a Map<String, Value>,
    /// The keyword's value.
    pub value: &'a Value,
    /// Compiler handle for building lexical subschemas.
    pub compiler: &'a mut Compiler<'r>,
    /// Compile-time location state.
    pub ctx: &'a CompileCtx,
}

pub(crate) type FactoryFn =
    fn(FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError>;

/// Look up the factory for `name` under `dialect`; `None` means the
/// dialect does not recognize the keyword.
pub(crate) fn factory_for(dialect: Dialect, name: &str) -> Option<FactoryFn> {
    use Dialect::{Draft201909, Draft202012, Draft6, Draft7, Next};
    let since_2019 = matches!(dialect, Draft201909 | Draft202012 | Next);
    let since_2020 = matches!(dialect, Draft202012 | Next);
    let since_7 = dialect >= Draft7;

    let factory: FactoryFn = match name {
        // Core
        "$schema" => core::meta_schema,
        "$id" => core::inert_identifier,
        "$vocabulary" if since_2019 => core::inert_identifier,
        "$comment" if since_7 => core::inert_identifier,
        "$anchor" if since_2019 => core::inert_identifier,
        "$dynamicAnchor" if since_2020 => core::inert_identifier,
        "$recursiveAnchor" if dialect == Draft201909 => core::inert_identifier,
        "$defs" if since_2019 => core::definitions,
        "definitions" if matches!(dialect, Draft6 | Draft7) => core::definitions,

        // References
        "$ref" => reference::ref_,
        "$recursiveRef" if dialect == Draft201909 => reference::recursive_ref,
        "$dynamicRef" if since_2020 => reference::dynamic_ref,

        // In-place applicators
        "allOf" => logic::all_of,
        "anyOf" => logic::any_of,
        "oneOf" => logic::one_of,
        "not" => logic::not,
        "if" if since_7 => conditional::if_,
        "then" if since_7 => conditional::then,
        "else" if since_7 => conditional::else_,
        "dependentSchemas" if since_2019 => conditional::dependent_schemas,
        "dependencies" if matches!(dialect, Draft6 | Draft7) => conditional::dependencies,

        // Object applicators and assertions
        "properties" => objects::properties,
        "patternProperties" => objects::pattern_properties,
        "additionalProperties" => objects::additional_properties,
        "propertyNames" => objects::property_names,
        "required" => objects::required,
        "dependentRequired" if since_2019 => objects::dependent_required,
        "minProperties" => objects::min_properties,
        "maxProperties" => objects::max_properties,

        // Array applicators and assertions
        "items" => {
            if since_2020 {
                arrays::items
            } else {
                arrays::legacy_items
            }
        }
        "prefixItems" if since_2020 => arrays::prefix_items,
        "additionalItems" if !since_2020 => arrays::additional_items,
        "contains" => arrays::contains,
        "minContains" if since_2019 => arrays::min_contains,
        "maxContains" if since_2019 => arrays::max_contains,
        "minItems" => arrays::min_items,
        "maxItems" => arrays::max_items,
        "uniqueItems" => arrays::unique_items,

        // Unevaluated
        "unevaluatedItems" if since_2019 => unevaluated::unevaluated_items,
        "unevaluatedProperties" if since_2019 => unevaluated::unevaluated_properties,

        // Assertions over the local instance
        "type" => assertions::type_,
        "enum" => assertions::enum_,
        "const" => assertions::const_,
        "multipleOf" => assertions::multiple_of,
        "maximum" => assertions::maximum,
        "exclusiveMaximum" => assertions::exclusive_maximum,
        "minimum" => assertions::minimum,
        "exclusiveMinimum" => assertions::exclusive_minimum,
        "maxLength" => assertions::max_length,
        "minLength" => assertions::min_length,
        "pattern" => assertions::pattern,
        "format" => format::format,

        // Annotations
        "title" | "description" | "default" | "examples" => metadata::annotation,
        "readOnly" | "writeOnly" if since_7 => metadata::annotation,
        "deprecated" if since_2019 => metadata::annotation,
        "contentEncoding" | "contentMediaType" if since_7 => metadata::annotation,
        "contentSchema" if since_2019 => metadata::annotation,

        _ => return None,
    };
    Some(factory)
}

/// Order keywords for dispatch: Kahn levels over declared dependencies
/// among the keywords actually present, then priority, then name.
pub(crate) fn order_keywords(keywords: &mut [Arc<dyn Keyword>]) {
    let present: HashMap<String, usize> = keywords
        .iter()
        .enumerate()
        .map(|(i, k)| (k.name().to_string(), i))
        .collect();

    fn level_of(
        index: usize,
        keywords: &[Arc<dyn Keyword>],
        present: &HashMap<String, usize>,
        memo: &mut [Option<u32>],
    ) -> u32 {
        if let Some(level) = memo[index] {
            return level;
        }
        // Guard against self-dependency while computing.
        memo[index] = Some(0);
        let mut level = 0;
        for dep in keywords[index].dependencies() {
            if let Some(&dep_index) = present.get(*dep) {
                if dep_index != index {
                    level = level.max(1 + level_of(dep_index, keywords, present, memo));
                }
            }
        }
        memo[index] = Some(level);
        level
    }

    let mut memo = vec![None; keywords.len()];
    let mut keyed: Vec<(u32, i32, String, Arc<dyn Keyword>)> = keywords
        .iter()
        .enumerate()
        .map(|(i, k)| {
            (
                level_of(i, keywords, &present, &mut memo),
                k.priority(),
                k.name().to_string(),
                k.clone(),
            )
        })
        .collect();
    keyed.sort_by(|a, b| (a.0, a.1, &a.2).cmp(&(b.0, b.1, &b.2)));
    for (slot, (_, _, _, keyword)) in keywords.iter_mut().zip(keyed) {
        *slot = keyword;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Named {
        name: &'static str,
        priority: i32,
        deps: &'static [&'static str],
    }

    impl Keyword for Named {
        fn name(&self) -> &str {
            self.name
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn dependencies(&self) -> &'static [&'static str] {
            self.deps
        }
        fn evaluate(
            &self,
            _ctx: &mut EvaluationContext<'_>,
            _node: &mut ResultNode,
        ) -> Result<(), EvaluationError> {
            Ok(())
        }
    }

    fn named(name: &'static str, priority: i32, deps: &'static [&'static str]) -> Arc<dyn Keyword> {
        Arc::new(Named {
            name,
            priority,
            deps,
        })
    }

    #[test]
    fn test_order_by_priority_then_name() {
        let mut keywords = vec![
            named("zeta", 0, &[]),
            named("alpha", 0, &[]),
            named("ref", 10, &[]),
            named("id", -200, &[]),
        ];
        order_keywords(&mut keywords);
        let names: Vec<_> = keywords.iter().map(|k| k.name().to_string()).collect();
        assert_eq!(names, ["id", "alpha", "zeta", "ref"]);
    }

    #[test]
    fn test_dependencies_override_priority() {
        // "reader" has a lower priority but depends on "producer".
        let mut keywords = vec![named("reader", -50, &["producer"]), named("producer", 10, &[])];
        order_keywords(&mut keywords);
        let names: Vec<_> = keywords.iter().map(|k| k.name().to_string()).collect();
        assert_eq!(names, ["producer", "reader"]);
    }

    #[test]
    fn test_absent_dependencies_ignored() {
        let mut keywords = vec![named("reader", 0, &["missing"]), named("alpha", 0, &[])];
        order_keywords(&mut keywords);
        let names: Vec<_> = keywords.iter().map(|k| k.name().to_string()).collect();
        assert_eq!(names, ["alpha", "reader"]);
    }

    #[test]
    fn test_dialect_membership() {
        assert!(factory_for(Dialect::Draft7, "if").is_some());
        assert!(factory_for(Dialect::Draft6, "if").is_none());
        assert!(factory_for(Dialect::Draft202012, "prefixItems").is_some());
        assert!(factory_for(Dialect::Draft201909, "prefixItems").is_none());
        assert!(factory_for(Dialect::Draft201909, "additionalItems").is_some());
        assert!(factory_for(Dialect::Draft202012, "additionalItems").is_none());
        assert!(factory_for(Dialect::Draft202012, "$dynamicRef").is_some());
        assert!(factory_for(Dialect::Draft201909, "$dynamicRef").is_none());
        assert!(factory_for(Dialect::Draft201909, "$recursiveRef").is_some());
        assert!(factory_for(Dialect::Draft202012, "$recursiveRef").is_none());
        assert!(factory_for(Dialect::Draft202012, "madeUpKeyword").is_none());
    }
}
