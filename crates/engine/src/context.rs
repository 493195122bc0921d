//! The evaluation context: the dynamic frame stack.
//!
//! Every subschema application pushes a frame carrying the subschema, the
//! instance value and location, the evaluation path, and the two dynamic
//! flags (`via_ref`, `new_dynamic_scope`). The frame stack *is* the dynamic
//! state: dynamic scopes for `$dynamicRef` fall out of the frames that
//! opened a new base URI, and the `$ref` cycle guard keys off (schema URI,
//! instance location) pairs held here.

use crate::error::EvaluationError;
use crate::options::{EvaluationOptions, OutputFormat};
use crate::registry::SchemaRegistry;
use crate::schema::Schema;
use jsonschema_types::JsonPointer;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use url::Url;

/// The instance value a frame evaluates.
///
/// Almost always a borrow into the caller's document; `propertyNames`
/// synthesizes transient string instances, which are owned.
#[derive(Debug, Clone)]
pub(crate) enum InstanceRef<'i> {
    Borrowed(&'i Value),
    Synthetic(Arc<Value>),
}

impl<'i> InstanceRef<'i> {
    /// The instance value.
    pub(crate) fn value(&self) -> &Value {
        match self {
            Self::Borrowed(value) => value,
            Self::Synthetic(value) => value,
        }
    }

    /// The borrow with the full instance lifetime, when this is not a
    /// synthetic value. Applicators use this to descend into children.
    pub(crate) fn as_borrowed(&self) -> Option<&'i Value> {
        match self {
            Self::Borrowed(value) => Some(*value),
            Self::Synthetic(_) => None,
        }
    }
}

/// One dynamic-stack entry.
#[derive(Debug, Clone)]
pub(crate) struct Frame<'i> {
    pub schema: Arc<Schema>,
    pub instance: InstanceRef<'i>,
    pub instance_location: JsonPointer,
    pub evaluation_path: JsonPointer,
    /// This frame entered a resource with a different base URI.
    pub new_dynamic_scope: bool,
    /// This frame was entered through a reference keyword.
    pub via_ref: bool,
}

/// Per-evaluation dynamic state. Created by [`crate::evaluate`]; exposed to
/// keyword implementations so they can read the current frame and push
/// subschema applications.
pub struct EvaluationContext<'i> {
    registry: Arc<SchemaRegistry>,
    options: &'i EvaluationOptions,
    pub(crate) frames: Vec<Frame<'i>>,
    /// (schema URI, instance location) pairs currently entered via
    /// references; re-entry without instance descent is a cycle.
    pub(crate) ref_guard: HashSet<(String, String)>,
}

impl<'i> EvaluationContext<'i> {
    pub(crate) fn new(
        registry: Arc<SchemaRegistry>,
        options: &'i EvaluationOptions,
        instance: &'i Value,
        root: Arc<Schema>,
    ) -> Self {
        let root_frame = Frame {
            schema: root,
            instance: InstanceRef::Borrowed(instance),
            instance_location: JsonPointer::empty(),
            evaluation_path: JsonPointer::empty(),
            new_dynamic_scope: true,
            via_ref: false,
        };
        Self {
            registry,
            options,
            frames: vec![root_frame],
            ref_guard: HashSet::new(),
        }
    }

    pub(crate) fn current(&self) -> &Frame<'i> {
        self.frames.last().expect("context always has a frame")
    }

    /// The options this evaluation runs under.
    #[must_use]
    pub fn options(&self) -> &EvaluationOptions {
        self.options
    }

    /// The instance value of the current frame.
    #[must_use]
    pub fn value(&self) -> &Value {
        self.current().instance.value()
    }

    /// The current frame's instance, cloneable out of the context borrow.
    pub(crate) fn instance(&self) -> InstanceRef<'i> {
        self.current().instance.clone()
    }

    /// JSON Pointer from the instance root to the current value.
    #[must_use]
    pub fn instance_location(&self) -> &JsonPointer {
        &self.current().instance_location
    }

    /// The current frame's subschema.
    pub(crate) fn schema(&self) -> Arc<Schema> {
        self.current().schema.clone()
    }

    /// Base URI of the current resource.
    pub(crate) fn base_uri(&self) -> &Url {
        self.current().schema.base_uri()
    }

    pub(crate) fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Base URIs of the dynamic scopes on the stack, outermost first.
    pub(crate) fn dynamic_scopes(&self) -> Vec<Url> {
        self.frames
            .iter()
            .filter(|frame| frame.new_dynamic_scope)
            .map(|frame| frame.schema.base_uri().clone())
            .collect()
    }

    /// Flag output permits short-circuiting: no annotation in scope can
    /// change the overall boolean once a frame is invalid.
    pub(crate) fn apply_optimizations(&self) -> bool {
        self.options.output_format == OutputFormat::Flag
    }

    /// Honour the caller's cancellation handle; checked at every subschema
    /// boundary and before reference fetches.
    pub(crate) fn check_cancelled(&self) -> Result<(), EvaluationError> {
        match &self.options.cancellation {
            Some(handle) if handle.load(Ordering::Relaxed) => Err(EvaluationError::Cancelled),
            _ => Ok(()),
        }
    }
}
