//! The keyword dispatcher.
//!
//! One subschema application = one frame push, one result node, one pass
//! over the schema's keywords in their compiled order. Keywords push
//! further frames through the `apply_*` methods here.

use crate::context::{EvaluationContext, Frame, InstanceRef};
use crate::error::EvaluationError;
use crate::result::ResultNode;
use crate::schema::{Schema, SchemaKind};
use crate::vocabulary;
use jsonschema_types::JsonPointer;
use serde_json::Value;
use std::sync::Arc;

impl<'i> EvaluationContext<'i> {
    /// Evaluate the root frame.
    pub(crate) fn eval_root(&mut self) -> Result<ResultNode, EvaluationError> {
        self.eval_current()
    }

    /// Evaluate the current frame's subschema against its instance.
    fn eval_current(&mut self) -> Result<ResultNode, EvaluationError> {
        self.check_cancelled()?;

        let frame = self.current();
        let schema = frame.schema.clone();
        let via_ref = frame.via_ref;
        let mut node = ResultNode::new(
            frame.evaluation_path.clone(),
            schema.absolute_uri(),
            frame.instance_location.clone(),
        );

        match schema.kind() {
            SchemaKind::Boolean(true) => {}
            SchemaKind::Boolean(false) => {
                node.fail(None, "All values fail against the false schema");
            }
            SchemaKind::Object(object) => {
                tracing::trace!(
                    schema = %node.schema_location(),
                    instance = %node.instance_location(),
                    via_ref,
                    "evaluating subschema"
                );
                for keyword in &object.keywords {
                    if !keyword_active(&schema, keyword.name(), self) {
                        continue;
                    }
                    keyword.evaluate(self, &mut node)?;
                    if self.apply_optimizations() && !node.valid() {
                        // Flag output: the boolean cannot recover and no
                        // annotation in scope is needed.
                        break;
                    }
                }
                if self.options().process_custom_keywords {
                    for (name, raw) in &object.unknowns {
                        node.annotate(name, raw.clone());
                    }
                }
            }
        }

        Ok(node)
    }

    /// Apply a subschema in place (same instance, same location).
    pub(crate) fn apply(
        &mut self,
        schema: &Arc<Schema>,
        path: &[&str],
    ) -> Result<ResultNode, EvaluationError> {
        let frame = self.child_frame(schema, path, None, false);
        self.run(frame)
    }

    /// Apply a subschema to a child of the current instance.
    pub(crate) fn apply_to_child(
        &mut self,
        schema: &Arc<Schema>,
        path: &[&str],
        child: &'i Value,
        segment: &str,
    ) -> Result<ResultNode, EvaluationError> {
        let frame = self.child_frame(
            schema,
            path,
            Some((InstanceRef::Borrowed(child), segment)),
            false,
        );
        self.run(frame)
    }

    /// Apply a subschema to a synthesized transient instance
    /// (`propertyNames`); the instance location stays the parent's.
    pub(crate) fn apply_synthetic(
        &mut self,
        schema: &Arc<Schema>,
        path: &[&str],
        value: Value,
    ) -> Result<ResultNode, EvaluationError> {
        let current = self.current();
        let frame = Frame {
            schema: schema.clone(),
            instance: InstanceRef::Synthetic(Arc::new(value)),
            instance_location: current.instance_location.clone(),
            evaluation_path: extend(&current.evaluation_path, path),
            new_dynamic_scope: schema.base_uri() != current.schema.base_uri(),
            via_ref: false,
        };
        self.run(frame)
    }

    /// Apply a reference target in place, maintaining the cycle guard.
    ///
    /// Re-entering the same (schema URI, instance location) pair without
    /// any instance descent means the reference graph loops without
    /// consuming input: an error, not an infinite loop.
    pub(crate) fn apply_ref(
        &mut self,
        schema: &Arc<Schema>,
        path: &[&str],
    ) -> Result<ResultNode, EvaluationError> {
        let guard_key = (
            schema.absolute_uri().to_string(),
            self.current().instance_location.to_string(),
        );
        if !self.ref_guard.insert(guard_key.clone()) {
            return Err(EvaluationError::ReferenceCycle {
                schema_uri: schema.absolute_uri(),
                instance_location: self.current().instance_location.clone(),
            });
        }
        let frame = self.child_frame(schema, path, None, true);
        let result = self.run(frame);
        self.ref_guard.remove(&guard_key);
        result
    }

    fn child_frame(
        &self,
        schema: &Arc<Schema>,
        path: &[&str],
        instance: Option<(InstanceRef<'i>, &str)>,
        via_ref: bool,
    ) -> Frame<'i> {
        let current = self.current();
        let (instance, instance_location) = match instance {
            Some((instance, segment)) => (instance, current.instance_location.push(segment)),
            None => (current.instance.clone(), current.instance_location.clone()),
        };
        Frame {
            schema: schema.clone(),
            instance,
            instance_location,
            evaluation_path: extend(&current.evaluation_path, path),
            new_dynamic_scope: schema.base_uri() != current.schema.base_uri(),
            via_ref,
        }
    }

    fn run(&mut self, frame: Frame<'i>) -> Result<ResultNode, EvaluationError> {
        self.frames.push(frame);
        let result = self.eval_current();
        self.frames.pop();
        result
    }
}

fn extend(base: &JsonPointer, path: &[&str]) -> JsonPointer {
    let mut pointer = base.clone();
    for segment in path {
        pointer = pointer.push(*segment);
    }
    pointer
}

/// Vocabulary filter: a keyword is skipped only when the frame carries an
/// active vocabulary set and the keyword's vocabulary is known but not in
/// it.
fn keyword_active(schema: &Schema, keyword: &str, ctx: &EvaluationContext<'_>) -> bool {
    let Some(active) = schema.vocabularies() else {
        return true;
    };
    let vocabulary = vocabulary::vocabulary_of(keyword, schema.dialect()).or_else(|| {
        ctx.options()
            .vocabulary_registry
            .keyword_vocabulary(keyword)
            .map(str::to_string)
    });
    match vocabulary {
        Some(uri) => active.contains(&uri),
        None => true,
    }
}
