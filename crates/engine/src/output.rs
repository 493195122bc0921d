//! Output formatting: pure projections of the result tree.
//!
//! Four shapes, all derived from the single traversal, never re-evaluating:
//! `flag` (one boolean), `basic` (pre-order flat list), `detailed` (tree
//! with contentless passing nodes collapsed), `verbose` (full tree).
//!
//! Node member order is fixed for golden-file comparisons: `valid`,
//! `evaluationPath`, `schemaLocation`, `instanceLocation`, `errors`,
//! `annotations`, `details`.

use crate::options::OutputFormat;
use crate::result::ResultNode;
use serde_json::{json, Map, Value};

/// The outcome of an evaluation: the result tree plus the requested
/// projection.
#[derive(Debug, Clone)]
pub struct EvaluationOutput {
    root: ResultNode,
    format: OutputFormat,
}

impl EvaluationOutput {
    pub(crate) fn new(root: ResultNode, format: OutputFormat) -> Self {
        Self { root, format }
    }

    /// Overall validity.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.root.valid()
    }

    /// The untransformed root result node.
    #[must_use]
    pub fn root(&self) -> &ResultNode {
        &self.root
    }

    /// The format this output projects to.
    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Project into the requested shape.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self.format {
            OutputFormat::Flag => json!({ "valid": self.root.valid() }),
            OutputFormat::Basic => {
                let mut units = Vec::new();
                flatten(&self.root, &mut units);
                let mut out = Map::new();
                out.insert("valid".into(), Value::Bool(self.root.valid()));
                if !units.is_empty() {
                    out.insert("details".into(), Value::Array(units));
                }
                Value::Object(out)
            }
            OutputFormat::Detailed => node_value(&self.root, condense_children(&self.root)),
            OutputFormat::Verbose => verbose(&self.root),
        }
    }
}

impl serde::Serialize for EvaluationOutput {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Serialize one node with pre-built `details`, in the fixed member order.
fn node_value(node: &ResultNode, details: Vec<Value>) -> Value {
    let mut out = Map::new();
    out.insert("valid".into(), Value::Bool(node.valid()));
    out.insert(
        "evaluationPath".into(),
        Value::String(node.evaluation_path().to_string()),
    );
    out.insert(
        "schemaLocation".into(),
        Value::String(node.schema_location().to_string()),
    );
    out.insert(
        "instanceLocation".into(),
        Value::String(node.instance_location().to_string()),
    );
    if !node.errors().is_empty() {
        out.insert(
            "errors".into(),
            Value::Array(node.errors().iter().map(error_value).collect()),
        );
    }
    if !node.annotations().is_empty() {
        out.insert(
            "annotations".into(),
            Value::Object(node.annotations().clone()),
        );
    }
    if !details.is_empty() {
        out.insert("details".into(), Value::Array(details));
    }
    Value::Object(out)
}

fn error_value(entry: &crate::result::ErrorEntry) -> Value {
    let mut out = Map::new();
    if let Some(keyword) = &entry.keyword {
        out.insert("keyword".into(), Value::String(keyword.clone()));
    }
    out.insert("message".into(), Value::String(entry.message.clone()));
    Value::Object(out)
}

/// Verbose: the full tree.
fn verbose(node: &ResultNode) -> Value {
    node_value(node, node.children().iter().map(verbose).collect())
}

/// Basic: pre-order flat list of the nodes carrying errors or annotations.
fn flatten(node: &ResultNode, out: &mut Vec<Value>) {
    if !node.errors().is_empty() || !node.annotations().is_empty() {
        out.push(node_value(node, Vec::new()));
    }
    for child in node.children() {
        flatten(child, out);
    }
}

/// Detailed: a node with no errors and no annotations whose children are
/// all valid is replaced by its (condensed) children. The root is never
/// spliced away; invalid and annotated nodes always survive.
fn condense_children(node: &ResultNode) -> Vec<Value> {
    let mut out = Vec::new();
    for child in node.children() {
        let grandchildren = condense_children(child);
        let splice = child.valid()
            && child.errors().is_empty()
            && child.annotations().is_empty()
            && child.children().iter().all(ResultNode::valid);
        if splice {
            out.extend(grandchildren);
        } else {
            out.push(node_value(child, grandchildren));
        }
    }
    out
}
