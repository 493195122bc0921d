//! A JSON Schema evaluation engine.
//!
//! Given a schema document and an instance, [`evaluate`] decides whether
//! the instance conforms and produces a structured report of results and
//! annotations. Dialects (draft 6 through "next") are selected per schema
//! via `$schema`; references (`$ref`, `$dynamicRef`, `$recursiveRef`,
//! anchors) resolve through a shared [`SchemaRegistry`]; output projects
//! into four shapes (flag, basic, detailed, verbose).
//!
//! ```rust,ignore
//! use jsonschema_engine::{evaluate, EvaluationOptions, OutputFormat};
//! use serde_json::json;
//!
//! let schema = json!({"type": "object", "required": ["name"]});
//! let instance = json!({"name": "widget"});
//! let options = EvaluationOptions::default().with_output_format(OutputFormat::Basic);
//! let output = evaluate(&schema, &instance, &options)?;
//! assert!(output.valid());
//! # Ok::<(), jsonschema_engine::EvaluationError>(())
//! ```

mod context;
mod dialect;
mod error;
mod evaluator;
mod keywords;
mod options;
mod output;
mod registry;
mod resolver;
mod result;
mod schema;
mod vocabulary;

pub use context::EvaluationContext;
pub use dialect::Dialect;
pub use error::EvaluationError;
pub use keywords::{priority, Keyword};
pub use options::{EvaluationOptions, OutputFormat, DEFAULT_BASE_URI};
pub use output::EvaluationOutput;
pub use registry::{CustomKeywordFactory, FileLoader, SchemaLoader, SchemaRegistry};
pub use result::{ErrorEntry, ResultNode};
pub use schema::Schema;
pub use vocabulary::VocabularyRegistry;

use serde_json::Value;
use std::sync::Arc;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use jsonschema_engine::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        evaluate, Dialect, EvaluationError, EvaluationOptions, EvaluationOutput, OutputFormat,
        SchemaRegistry,
    };
}

/// Evaluate `instance` against `schema`.
///
/// The schema is registered (idempotently) in the options' registry — or a
/// fresh private one — under its `$id`, falling back to the options'
/// default base URI. Validation failures are data in the returned output;
/// the `Err` channel carries only structural errors (unresolvable or
/// cyclic references, malformed schemas, strict-format violations,
/// cancellation).
pub fn evaluate(
    schema: &Value,
    instance: &Value,
    options: &EvaluationOptions,
) -> Result<EvaluationOutput, EvaluationError> {
    let registry = options
        .registry
        .clone()
        .unwrap_or_else(|| Arc::new(SchemaRegistry::new()));

    let root = registry.register_root(
        options.default_base_uri.clone(),
        schema,
        options.evaluate_as,
        &options.vocabulary_registry,
    )?;

    tracing::debug!(
        schema = %root.absolute_uri(),
        dialect = %root.dialect(),
        format = ?options.output_format,
        "starting evaluation"
    );

    let mut ctx = EvaluationContext::new(registry, options, instance, root);
    let node = ctx.eval_root()?;
    Ok(EvaluationOutput::new(node, options.output_format))
}
