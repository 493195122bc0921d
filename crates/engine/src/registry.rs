//! The schema registry: an arena of compiled schemas interned by URI.
//!
//! The registry owns every compiled resource, its anchors and dynamic
//! anchors, and the pluggable loader used for URIs that have not been
//! registered. It is read-mostly after warmup and may be shared across
//! concurrent evaluations; each evaluation brings its own context.

use crate::dialect::Dialect;
use crate::error::EvaluationError;
use crate::keywords::Keyword;
use crate::schema::{CompileCtx, Compiler, Schema};
use crate::vocabulary::VocabularyRegistry;
use jsonschema_types::JsonPointer;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use url::Url;

/// Loads schema documents for URIs the registry has not seen.
///
/// The loader is the registry's only I/O. The default [`FileLoader`] reads
/// `file` URIs from disk and refuses network schemes with a descriptive
/// error; hosts that want network resolution install their own loader.
pub trait SchemaLoader: Send + Sync {
    /// Produce the document for `uri`.
    fn load(&self, uri: &Url) -> Result<Value, Box<dyn std::error::Error + Send + Sync>>;
}

/// Default loader: `file` URIs only.
#[derive(Debug, Default)]
pub struct FileLoader;

impl SchemaLoader for FileLoader {
    fn load(&self, uri: &Url) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        match uri.scheme() {
            "file" => {
                let path = uri
                    .to_file_path()
                    .map_err(|()| format!("`{uri}` is not a usable file path"))?;
                let text = std::fs::read_to_string(&path)?;
                Ok(serde_json::from_str(&text)?)
            }
            "http" | "https" => Err(format!(
                "refusing to fetch `{uri}`: network resolution requires a custom SchemaLoader"
            )
            .into()),
            other => Err(format!("unsupported URI scheme `{other}` for `{uri}`").into()),
        }
    }
}

/// Factory for caller-registered keywords, invoked with the member name
/// and raw value during compilation.
pub type CustomKeywordFactory =
    Arc<dyn Fn(&str, &Value) -> Result<Arc<dyn Keyword>, EvaluationError> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct Resource {
    pub raw: Arc<Value>,
    pub root: Arc<Schema>,
    pub dialect: Dialect,
    pub vocabularies: Option<Arc<HashSet<String>>>,
}

#[derive(Default)]
pub(crate) struct RegistryInner {
    pub resources: HashMap<Url, Resource>,
    pub arena: HashMap<(Url, JsonPointer), Arc<Schema>>,
    pub anchors: HashMap<(Url, String), Arc<Schema>>,
    pub dynamic_anchors: HashMap<(Url, String), Arc<Schema>>,
    pub recursive_roots: HashSet<Url>,
    pub custom_keywords: HashMap<String, CustomKeywordFactory>,
    /// Counter for anonymous documents that collide at the default URI.
    pub anonymous_counter: u64,
}

/// Interns schemas by absolute URI and resolves references against them.
pub struct SchemaRegistry {
    inner: RwLock<RegistryInner>,
    loader: Box<dyn SchemaLoader>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        f.debug_struct("SchemaRegistry")
            .field("resources", &inner.resources.len())
            .field("arena", &inner.arena.len())
            .finish()
    }
}

impl SchemaRegistry {
    /// A registry with the default file-only loader.
    #[must_use]
    pub fn new() -> Self {
        Self::with_loader(Box::new(FileLoader))
    }

    /// A registry with a caller-supplied loader.
    #[must_use]
    pub fn with_loader(loader: Box<dyn SchemaLoader>) -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            loader,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().expect("registry lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().expect("registry lock poisoned")
    }

    /// Register a schema document under `uri` and compile it.
    ///
    /// Idempotent for structurally equal documents; a conflicting document
    /// at the same URI is a [`EvaluationError::MalformedSchema`].
    pub fn register(&self, uri: Url, document: &Value) -> Result<(), EvaluationError> {
        let vocab = VocabularyRegistry::default();
        let mut inner = self.write();
        let mut compiler = Compiler {
            inner: &mut inner,
            loader: &*self.loader,
            vocab: &vocab,
        };
        compiler.register_resource(uri, document, None, Dialect::default(), true)?;
        Ok(())
    }

    /// Register a custom keyword factory, consulted before the built-in
    /// dialect tables. Must happen before the schemas using it compile.
    pub fn register_keyword(&self, name: impl Into<String>, factory: CustomKeywordFactory) {
        self.write().custom_keywords.insert(name.into(), factory);
    }

    /// Entry-point registration: apply the dialect override and the
    /// caller's vocabulary registry, and fall back to a fresh anonymous
    /// URI when an unrelated document already owns `uri`.
    pub(crate) fn register_root(
        &self,
        uri: Url,
        document: &Value,
        dialect_override: Option<Dialect>,
        vocab: &VocabularyRegistry,
    ) -> Result<Arc<Schema>, EvaluationError> {
        let mut inner = self.write();
        let has_id = document
            .as_object()
            .and_then(|m| m.get("$id"))
            .and_then(Value::as_str)
            .is_some();
        let mut compiler = Compiler {
            inner: &mut inner,
            loader: &*self.loader,
            vocab,
        };
        match compiler.register_resource(
            uri.clone(),
            document,
            dialect_override,
            Dialect::default(),
            !has_id,
        )
        {
            Err(EvaluationError::MalformedSchema { .. }) if !has_id => {
                // A different anonymous document already owns the default
                // URI in this shared registry; give this one its own slot.
                inner.anonymous_counter += 1;
                let fresh = Url::parse(&format!("{uri}anonymous/{}", inner.anonymous_counter))
                    .map_err(|e| EvaluationError::malformed(&uri, e.to_string()))?;
                let mut compiler = Compiler {
                    inner: &mut inner,
                    loader: &*self.loader,
                    vocab,
                };
                compiler.register_resource(fresh, document, dialect_override, Dialect::default(), false)
            }
            other => other,
        }
    }

    /// Resolve an absolute URI (with optional anchor or pointer fragment)
    /// to a compiled schema, fetching unregistered documents through the
    /// loader.
    pub(crate) fn resolve(&self, uri: &Url) -> Result<Arc<Schema>, EvaluationError> {
        let mut doc_uri = uri.clone();
        doc_uri.set_fragment(None);
        let fragment = uri.fragment().unwrap_or("").to_string();

        self.ensure_resource(&doc_uri)?;

        if fragment.is_empty() {
            let inner = self.read();
            return Ok(inner
                .resources
                .get(&doc_uri)
                .expect("resource ensured above")
                .root
                .clone());
        }

        if fragment.starts_with('/') {
            let pointer =
                JsonPointer::parse(&fragment).map_err(|e| EvaluationError::ReferenceResolution {
                    uri: uri.to_string(),
                    reason: e.to_string(),
                })?;
            return self.resolve_pointer(uri, &doc_uri, &pointer);
        }

        let inner = self.read();
        inner
            .anchors
            .get(&(doc_uri.clone(), fragment.clone()))
            .cloned()
            .ok_or_else(|| EvaluationError::ReferenceResolution {
                uri: uri.to_string(),
                reason: format!("no anchor named `{fragment}` in `{doc_uri}`"),
            })
    }

    /// Look up a dynamic anchor in one resource.
    pub(crate) fn dynamic_anchor(&self, resource: &Url, name: &str) -> Option<Arc<Schema>> {
        self.read()
            .dynamic_anchors
            .get(&(resource.clone(), name.to_string()))
            .cloned()
    }

    /// Whether the resource root carries `$recursiveAnchor: true`.
    pub(crate) fn is_recursive_root(&self, resource: &Url) -> bool {
        self.read().recursive_roots.contains(resource)
    }

    fn ensure_resource(&self, doc_uri: &Url) -> Result<(), EvaluationError> {
        if self.read().resources.contains_key(doc_uri) {
            return Ok(());
        }
        // Fetch outside any lock; the loader may be slow.
        let document = self
            .loader
            .load(doc_uri)
            .map_err(|source| EvaluationError::Loader {
                uri: doc_uri.to_string(),
                source,
            })?;
        let vocab = VocabularyRegistry::default();
        let mut inner = self.write();
        if inner.resources.contains_key(doc_uri) {
            return Ok(());
        }
        let mut compiler = Compiler {
            inner: &mut inner,
            loader: &*self.loader,
            vocab: &vocab,
        };
        compiler.register_resource(doc_uri.clone(), &document, None, Dialect::default(), true)?;
        Ok(())
    }

    fn resolve_pointer(
        &self,
        full_uri: &Url,
        doc_uri: &Url,
        pointer: &JsonPointer,
    ) -> Result<Arc<Schema>, EvaluationError> {
        if let Some(found) = self
            .read()
            .arena
            .get(&(doc_uri.clone(), pointer.clone()))
            .cloned()
        {
            return Ok(found);
        }

        // The pointer lands outside the eagerly compiled schema positions
        // (e.g. through a member the dialect does not recognize). Compile
        // it on demand from the raw document.
        let mut inner = self.write();
        let resource = inner
            .resources
            .get(doc_uri)
            .ok_or_else(|| EvaluationError::ReferenceResolution {
                uri: full_uri.to_string(),
                reason: format!("unknown resource `{doc_uri}`"),
            })?
            .clone();
        let Some(target) = pointer.resolve(&resource.raw) else {
            return Err(EvaluationError::ReferenceResolution {
                uri: full_uri.to_string(),
                reason: format!("no value at `{pointer}` in `{doc_uri}`"),
            });
        };
        let target = target.clone();
        let vocab = VocabularyRegistry::default();
        let ctx = CompileCtx {
            base_uri: doc_uri.clone(),
            location: pointer.clone(),
            dialect: resource.dialect,
            vocabularies: resource.vocabularies.clone(),
        };
        let mut compiler = Compiler {
            inner: &mut inner,
            loader: &*self.loader,
            vocab: &vocab,
        };
        compiler.compile_schema(&ctx, &target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_is_idempotent() {
        let registry = SchemaRegistry::new();
        let uri = Url::parse("https://example.com/schema").unwrap();
        let doc = json!({"type": "object"});
        registry.register(uri.clone(), &doc).unwrap();
        // Same document, member order irrelevant: a no-op.
        registry.register(uri.clone(), &doc).unwrap();
        // A different document at the same URI conflicts.
        let err = registry.register(uri, &json!({"type": "array"})).unwrap_err();
        assert!(matches!(err, EvaluationError::MalformedSchema { .. }));
    }

    #[test]
    fn test_resolve_pointer_and_anchor() {
        let registry = SchemaRegistry::new();
        let uri = Url::parse("https://example.com/schema").unwrap();
        let doc = json!({
            "$defs": {
                "named": {"$anchor": "it", "type": "string"}
            }
        });
        registry.register(uri.clone(), &doc).unwrap();

        let by_pointer = registry
            .resolve(&Url::parse("https://example.com/schema#/$defs/named").unwrap())
            .unwrap();
        assert_eq!(by_pointer.location().to_string(), "/$defs/named");

        let by_anchor = registry
            .resolve(&Url::parse("https://example.com/schema#it").unwrap())
            .unwrap();
        assert!(Arc::ptr_eq(&by_pointer, &by_anchor));
    }

    #[test]
    fn test_unknown_anchor_is_resolution_error() {
        let registry = SchemaRegistry::new();
        let uri = Url::parse("https://example.com/schema").unwrap();
        registry.register(uri, &json!({})).unwrap();
        let err = registry
            .resolve(&Url::parse("https://example.com/schema#nope").unwrap())
            .unwrap_err();
        assert!(matches!(err, EvaluationError::ReferenceResolution { .. }));
    }

    #[test]
    fn test_loader_refuses_network() {
        let registry = SchemaRegistry::new();
        let err = registry
            .resolve(&Url::parse("https://example.com/unfetched").unwrap())
            .unwrap_err();
        assert!(matches!(err, EvaluationError::Loader { .. }));
    }
}
