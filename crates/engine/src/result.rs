//! The evaluation result tree.
//!
//! One node per subschema application, mirroring the traversal. Nodes carry
//! validity, keyword errors, keyword annotations, and child results;
//! keywords decide validity themselves — the engine never auto-aggregates
//! child validities into the parent.

use jsonschema_types::JsonPointer;
use serde_json::{Map, Value};
use url::Url;

/// A single keyword failure attached to a result node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    /// The keyword that failed; `None` for a `false` boolean schema.
    pub keyword: Option<String>,
    /// Fixed, deterministic message.
    pub message: String,
}

/// One node of the result tree.
#[derive(Debug, Clone)]
pub struct ResultNode {
    valid: bool,
    evaluation_path: JsonPointer,
    schema_location: Url,
    instance_location: JsonPointer,
    errors: Vec<ErrorEntry>,
    annotations: Map<String, Value>,
    children: Vec<ResultNode>,
}

impl ResultNode {
    pub(crate) fn new(
        evaluation_path: JsonPointer,
        schema_location: Url,
        instance_location: JsonPointer,
    ) -> Self {
        Self {
            valid: true,
            evaluation_path,
            schema_location,
            instance_location,
            errors: Vec::new(),
            annotations: Map::new(),
            children: Vec::new(),
        }
    }

    /// Overall validity of this node.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// JSON Pointer from the root schema through applicator descent.
    #[must_use]
    pub fn evaluation_path(&self) -> &JsonPointer {
        &self.evaluation_path
    }

    /// Absolute URI of the subschema, including its pointer fragment.
    #[must_use]
    pub fn schema_location(&self) -> &Url {
        &self.schema_location
    }

    /// JSON Pointer from the instance root to the evaluated value.
    #[must_use]
    pub fn instance_location(&self) -> &JsonPointer {
        &self.instance_location
    }

    /// Keyword failures recorded on this node, in evaluation order.
    #[must_use]
    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    /// Annotations published by this node's keywords, in evaluation order.
    #[must_use]
    pub fn annotations(&self) -> &Map<String, Value> {
        &self.annotations
    }

    /// Nested child results, in deterministic traversal order.
    #[must_use]
    pub fn children(&self) -> &[ResultNode] {
        &self.children
    }

    /// Record an assertion failure with its message.
    pub fn fail(&mut self, keyword: Option<&str>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ErrorEntry {
            keyword: keyword.map(str::to_string),
            message: message.into(),
        });
    }

    /// Mark invalid without a message (applicators whose children carry
    /// the detail).
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Publish an annotation under the producing keyword's name.
    pub fn annotate(&mut self, keyword: &str, value: Value) {
        self.annotations.insert(keyword.to_string(), value);
    }

    /// Read a sibling keyword's annotation on this node.
    ///
    /// Only annotations published earlier in the dispatch order are
    /// visible, which is exactly the dependency protocol: a reader
    /// declares the producer in `dependencies()` and is sorted after it.
    #[must_use]
    pub fn annotation(&self, keyword: &str) -> Option<&Value> {
        self.annotations.get(keyword)
    }

    /// Attach a completed child result.
    pub(crate) fn add_child(&mut self, child: ResultNode) {
        self.children.push(child);
    }

    /// Collect annotations named `keyword` published at `instance_location`
    /// by this node and by valid descendants reached through in-place
    /// applicators (`$ref`, `allOf`, `if`, ...).
    ///
    /// Annotations below an invalid node are not collected: a failed
    /// subschema contributes nothing. This is the propagation walk of the
    /// `unevaluated*` family.
    pub(crate) fn collect_annotations<'a>(
        &'a self,
        keyword: &str,
        instance_location: &JsonPointer,
        out: &mut Vec<&'a Value>,
    ) {
        if self.instance_location == *instance_location {
            if let Some(value) = self.annotations.get(keyword) {
                out.push(value);
            }
            for child in &self.children {
                if child.valid && child.instance_location == *instance_location {
                    child.collect_annotations(keyword, instance_location, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(path: &str, instance: &str) -> ResultNode {
        ResultNode::new(
            JsonPointer::parse(path).unwrap(),
            Url::parse("json-schema:///#").unwrap(),
            JsonPointer::parse(instance).unwrap(),
        )
    }

    #[test]
    fn test_fail_and_invalidate() {
        let mut n = node("", "");
        assert!(n.valid());
        n.fail(Some("type"), "wrong type");
        assert!(!n.valid());
        assert_eq!(n.errors().len(), 1);
        assert_eq!(n.errors()[0].keyword.as_deref(), Some("type"));

        let mut m = node("", "");
        m.invalidate();
        assert!(!m.valid());
        assert!(m.errors().is_empty());
    }

    #[test]
    fn test_annotations_visible_in_order() {
        let mut n = node("", "");
        assert!(n.annotation("properties").is_none());
        n.annotate("properties", json!(["a"]));
        assert_eq!(n.annotation("properties"), Some(&json!(["a"])));
    }

    #[test]
    fn test_collect_skips_invalid_branches() {
        let root_loc = JsonPointer::empty();
        let mut parent = node("", "");

        let mut passing = node("/allOf/0", "");
        passing.annotate("properties", json!(["a"]));
        parent.add_child(passing);

        let mut failing = node("/allOf/1", "");
        failing.annotate("properties", json!(["b"]));
        failing.invalidate();
        parent.add_child(failing);

        // A child applied to a deeper instance location is out of scope.
        let mut deeper = node("/properties/a", "/a");
        deeper.annotate("properties", json!(["x"]));
        parent.add_child(deeper);

        let mut collected = Vec::new();
        parent.collect_annotations("properties", &root_loc, &mut collected);
        assert_eq!(collected, vec![&json!(["a"])]);
    }
}
