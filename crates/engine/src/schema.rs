//! The in-memory schema model and the compiler that builds it.
//!
//! A schema document compiles into an arena of [`Schema`] nodes interned in
//! the registry by (resource URI, pointer) so that references are indices
//! into the arena rather than ownership edges — cyclic `$ref` graphs are
//! representable and cycles are detected dynamically during evaluation.
//!
//! Lexical subschemas (the value of `items`, each member of `properties`,
//! ...) are compiled eagerly by the keyword factories and held directly by
//! their parent keyword. A nested `$id` starts a new resource: the subtree
//! is registered under the joined URI with its own base, anchors, and
//! (possibly) its own dialect.

use crate::dialect::Dialect;
use crate::error::EvaluationError;
use crate::keywords::{self, FactoryArgs, Keyword};
use crate::registry::{RegistryInner, Resource, SchemaLoader};
use crate::vocabulary::VocabularyRegistry;
use jsonschema_types::{json_equal, JsonPointer};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// A compiled schema: a boolean or an ordered keyword set, carrying its
/// resource URI, location, dialect, and active vocabulary set.
#[derive(Debug)]
pub struct Schema {
    base_uri: Url,
    location: JsonPointer,
    dialect: Dialect,
    vocabularies: Option<Arc<HashSet<String>>>,
    kind: SchemaKind,
}

#[derive(Debug)]
pub(crate) enum SchemaKind {
    Boolean(bool),
    Object(ObjectSchema),
}

#[derive(Debug)]
pub(crate) struct ObjectSchema {
    /// Keyword instances in dispatch order (dependency level, priority,
    /// name).
    pub keywords: Vec<Arc<dyn Keyword>>,
    /// Members the dialect does not recognize, in insertion order.
    pub unknowns: Vec<(String, Value)>,
}

impl Schema {
    /// URI of the enclosing resource (no fragment).
    #[must_use]
    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    /// Pointer from the resource root to this subschema.
    #[must_use]
    pub fn location(&self) -> &JsonPointer {
        &self.location
    }

    /// The dialect this schema was compiled under.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Active vocabulary URIs; `None` means unfiltered.
    #[must_use]
    pub fn vocabularies(&self) -> Option<&Arc<HashSet<String>>> {
        self.vocabularies.as_ref()
    }

    /// Canonical absolute URI: resource URI plus pointer fragment.
    #[must_use]
    pub fn absolute_uri(&self) -> Url {
        let mut uri = self.base_uri.clone();
        uri.set_fragment(Some(&self.location.to_string()));
        uri
    }

    pub(crate) fn kind(&self) -> &SchemaKind {
        &self.kind
    }
}

/// Compile-time location state, threaded through the factory recursion.
#[derive(Debug, Clone)]
pub(crate) struct CompileCtx {
    pub base_uri: Url,
    pub location: JsonPointer,
    pub dialect: Dialect,
    pub vocabularies: Option<Arc<HashSet<String>>>,
}

impl CompileCtx {
    pub(crate) fn descend(&self, rel: &[&str]) -> Self {
        let mut ctx = self.clone();
        for seg in rel {
            ctx.location = ctx.location.push(*seg);
        }
        ctx
    }

    /// Human-readable schema location for error reporting.
    pub(crate) fn display_location(&self) -> String {
        format!("{}#{}", self.base_uri, self.location)
    }

    pub(crate) fn malformed(&self, reason: impl Into<String>) -> EvaluationError {
        EvaluationError::malformed(self.display_location(), reason)
    }
}

/// Borrow bundle for one compilation pass over the registry internals.
pub(crate) struct Compiler<'r> {
    pub inner: &'r mut RegistryInner,
    pub loader: &'r dyn SchemaLoader,
    pub vocab: &'r VocabularyRegistry,
}

impl Compiler<'_> {
    /// Register a document as a resource under `uri` and compile it. When
    /// the document's `$id` re-bases it, `alias_uri` controls whether the
    /// registration URI also resolves to the resource (wanted for explicit
    /// registrations, not for anonymous entry-point slots).
    ///
    /// Idempotent: re-registering a structurally equal document returns the
    /// existing root; a conflicting document is a [`EvaluationError::MalformedSchema`].
    pub(crate) fn register_resource(
        &mut self,
        uri: Url,
        document: &Value,
        dialect_override: Option<Dialect>,
        default_dialect: Dialect,
        alias_uri: bool,
    ) -> Result<Arc<Schema>, EvaluationError> {
        let mut uri = uri;
        uri.set_fragment(None);

        if let Some(existing) = self.inner.resources.get(&uri) {
            return if json_equal(&existing.raw, document) {
                Ok(existing.root.clone())
            } else {
                Err(EvaluationError::malformed(
                    &uri,
                    "conflicting re-registration of schema resource",
                ))
            };
        }

        let (dialect, vocabularies) = self.resolve_dialect(&uri, document, dialect_override, default_dialect)?;

        // A root `$id` re-bases the resource.
        let mut resource_uri = uri.clone();
        if let Some(map) = document.as_object() {
            if let Some(id) = map.get("$id").and_then(Value::as_str) {
                if !(dialect.ref_overrides_siblings() && id.starts_with('#')) {
                    resource_uri = join_id(&uri, id)
                        .map_err(|reason| EvaluationError::malformed(&uri, reason))?;
                    if let Some(existing) = self.inner.resources.get(&resource_uri) {
                        return if json_equal(&existing.raw, document) {
                            Ok(existing.root.clone())
                        } else {
                            Err(EvaluationError::malformed(
                                &resource_uri,
                                "conflicting re-registration of schema resource",
                            ))
                        };
                    }
                }
            }
        }

        let ctx = CompileCtx {
            base_uri: resource_uri.clone(),
            location: JsonPointer::empty(),
            dialect,
            vocabularies: vocabularies.clone(),
        };
        let root = self.compile_schema(&ctx, document)?;

        let resource = Resource {
            raw: Arc::new(document.clone()),
            root: root.clone(),
            dialect,
            vocabularies,
        };
        self.inner.resources.insert(resource_uri.clone(), resource.clone());
        if alias_uri && resource_uri != uri {
            self.inner.resources.insert(uri, resource);
        }
        Ok(root)
    }

    /// Compile a subschema value at an explicit location; used by keyword
    /// factories for their lexical subschemas.
    pub(crate) fn compile_child(
        &mut self,
        ctx: &CompileCtx,
        value: &Value,
        rel: &[&str],
    ) -> Result<Arc<Schema>, EvaluationError> {
        let child_ctx = ctx.descend(rel);
        if let Some(map) = value.as_object() {
            if let Some(id) = map.get("$id").and_then(Value::as_str) {
                if !(child_ctx.dialect.ref_overrides_siblings() && id.starts_with('#')) {
                    // Embedded resource: compile it under its own URI, then
                    // alias the arena slot at the lexical location so
                    // pointer references through the parent still resolve.
                    let new_uri = join_id(&child_ctx.base_uri, id)
                        .map_err(|reason| child_ctx.malformed(reason))?;
                    let root =
                        self.register_resource(new_uri, value, None, child_ctx.dialect, false)?;
                    self.inner.arena.insert(
                        (child_ctx.base_uri.clone(), child_ctx.location.clone()),
                        root.clone(),
                    );
                    return Ok(root);
                }
            }
        }
        self.compile_schema(&child_ctx, value)
    }

    /// Compile a boolean or object schema at `ctx` (no `$id` re-dispatch).
    pub(crate) fn compile_schema(
        &mut self,
        ctx: &CompileCtx,
        value: &Value,
    ) -> Result<Arc<Schema>, EvaluationError> {
        match value {
            Value::Bool(accept) => Ok(self.intern(ctx, SchemaKind::Boolean(*accept))),
            Value::Object(map) => self.compile_object(ctx, map),
            _ => Err(ctx.malformed("schema must be a boolean or an object")),
        }
    }

    fn compile_object(
        &mut self,
        ctx: &CompileCtx,
        map: &Map<String, Value>,
    ) -> Result<Arc<Schema>, EvaluationError> {
        let ref_override = ctx.dialect.ref_overrides_siblings() && map.contains_key("$ref");
        let mut compiled: Vec<Arc<dyn Keyword>> = Vec::with_capacity(map.len());
        let mut unknowns: Vec<(String, Value)> = Vec::new();

        for (name, value) in map {
            if ref_override && name != "$ref" {
                // Draft 6/7: siblings of `$ref` do not evaluate, but their
                // definitions must still be compiled so pointer targets and
                // anchors inside them resolve.
                if name == "definitions" || name == "$defs" {
                    if let Some(defs) = value.as_object() {
                        for (key, sub) in defs {
                            self.compile_child(ctx, sub, &[name, key])?;
                        }
                    }
                }
                continue;
            }

            if let Some(factory) = self.inner.custom_keywords.get(name.as_str()).cloned() {
                compiled.push(factory(name, value)?);
                continue;
            }
            match keywords::factory_for(ctx.dialect, name) {
                Some(factory) => compiled.push(factory(FactoryArgs {
                    name: name.as_str(),
                    parent: map,
                    value,
                    compiler: self,
                    ctx,
                })?),
                None => unknowns.push((name.clone(), value.clone())),
            }
        }

        keywords::order_keywords(&mut compiled);
        let node = self.intern(
            ctx,
            SchemaKind::Object(ObjectSchema {
                keywords: compiled,
                unknowns,
            }),
        );
        self.register_anchors(ctx, map, &node);
        Ok(node)
    }

    fn intern(&mut self, ctx: &CompileCtx, kind: SchemaKind) -> Arc<Schema> {
        let node = Arc::new(Schema {
            base_uri: ctx.base_uri.clone(),
            location: ctx.location.clone(),
            dialect: ctx.dialect,
            vocabularies: ctx.vocabularies.clone(),
            kind,
        });
        self.inner
            .arena
            .insert((ctx.base_uri.clone(), ctx.location.clone()), node.clone());
        node
    }

    fn register_anchors(&mut self, ctx: &CompileCtx, map: &Map<String, Value>, node: &Arc<Schema>) {
        if ctx.dialect.ref_overrides_siblings() {
            // Draft 6/7 spell location-independent anchors as `$id: "#name"`.
            if let Some(id) = map.get("$id").and_then(Value::as_str) {
                if let Some(name) = id.strip_prefix('#') {
                    if !name.is_empty() && !name.starts_with('/') {
                        self.inner.anchors.insert(
                            (ctx.base_uri.clone(), name.to_string()),
                            node.clone(),
                        );
                    }
                }
            }
            return;
        }

        if let Some(name) = map.get("$anchor").and_then(Value::as_str) {
            self.inner
                .anchors
                .insert((ctx.base_uri.clone(), name.to_string()), node.clone());
        }
        if matches!(ctx.dialect, Dialect::Draft202012 | Dialect::Next) {
            if let Some(name) = map.get("$dynamicAnchor").and_then(Value::as_str) {
                self.inner
                    .anchors
                    .insert((ctx.base_uri.clone(), name.to_string()), node.clone());
                self.inner
                    .dynamic_anchors
                    .insert((ctx.base_uri.clone(), name.to_string()), node.clone());
            }
        }
        if ctx.dialect == Dialect::Draft201909
            && ctx.location.is_empty()
            && map.get("$recursiveAnchor") == Some(&Value::Bool(true))
        {
            self.inner.recursive_roots.insert(ctx.base_uri.clone());
        }
    }

    /// Dialect detection: explicit override, then a recognized `$schema`,
    /// then a custom meta-schema fetched for its `$vocabulary`, then the
    /// context default.
    fn resolve_dialect(
        &mut self,
        uri: &Url,
        document: &Value,
        dialect_override: Option<Dialect>,
        default_dialect: Dialect,
    ) -> Result<(Dialect, Option<Arc<HashSet<String>>>), EvaluationError> {
        if let Some(dialect) = dialect_override {
            return Ok((dialect, self.vocab.default_active_set(dialect)));
        }
        let Some(declared) = Dialect::declared_meta_schema(document) else {
            return Ok((default_dialect, self.vocab.default_active_set(default_dialect)));
        };
        if let Some(dialect) = Dialect::from_meta_schema_uri(declared) {
            return Ok((dialect, self.vocab.default_active_set(dialect)));
        }
        self.custom_meta_schema(uri, declared)
    }

    /// Handle an unrecognized `$schema` URI by fetching the meta-schema and
    /// reading its `$vocabulary`.
    fn custom_meta_schema(
        &mut self,
        base: &Url,
        declared: &str,
    ) -> Result<(Dialect, Option<Arc<HashSet<String>>>), EvaluationError> {
        let meta_uri = Url::options()
            .base_url(Some(base))
            .parse(declared)
            .map_err(|e| EvaluationError::malformed(base, format!("invalid $schema URI: {e}")))?;
        let mut doc_uri = meta_uri.clone();
        doc_uri.set_fragment(None);

        let meta = match self.inner.resources.get(&doc_uri) {
            Some(resource) => resource.raw.clone(),
            None => Arc::new(self.loader.load(&doc_uri).map_err(|source| {
                EvaluationError::Loader {
                    uri: doc_uri.to_string(),
                    source,
                }
            })?),
        };

        // Semantics of the custom dialect come from the meta-schema's own
        // `$schema` when recognized, falling back to the latest stable.
        let dialect = Dialect::declared_meta_schema(&meta)
            .and_then(Dialect::from_meta_schema_uri)
            .unwrap_or(Dialect::Draft202012);

        let Some(declared_vocabularies) =
            meta.as_object().and_then(|m| m.get("$vocabulary")).and_then(Value::as_object)
        else {
            return Ok((dialect, self.vocab.default_active_set(dialect)));
        };

        let mut active = HashSet::new();
        for (vocab_uri, required) in declared_vocabularies {
            if self.vocab.is_known(vocab_uri) {
                active.insert(vocab_uri.clone());
            } else if required == &Value::Bool(true) {
                return Err(EvaluationError::UnknownVocabulary {
                    uri: vocab_uri.clone(),
                });
            }
        }
        Ok((dialect, Some(Arc::new(active))))
    }
}

/// Join an `$id` against the current base, rejecting non-empty fragments.
fn join_id(base: &Url, id: &str) -> Result<Url, String> {
    let mut joined = Url::options()
        .base_url(Some(base))
        .parse(id)
        .map_err(|e| format!("invalid $id `{id}`: {e}"))?;
    match joined.fragment() {
        Some("") | None => {
            joined.set_fragment(None);
            Ok(joined)
        }
        Some(_) => Err(format!("$id `{id}` must not contain a fragment")),
    }
}
