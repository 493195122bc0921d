//! Reference resolution against the registry and the dynamic scope.

use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::schema::Schema;
use std::sync::Arc;
use url::Url;

/// Resolve a `$ref` value against the current base URI.
pub(crate) fn resolve_ref(
    ctx: &EvaluationContext<'_>,
    reference: &str,
) -> Result<Arc<Schema>, EvaluationError> {
    let target = join(ctx.base_uri(), reference)?;
    ctx.registry().resolve(&target)
}

/// Resolve a `$dynamicRef` value.
///
/// When the fragment is a plain anchor name and any dynamic scope defines a
/// dynamic anchor of that name, the *outermost* such scope wins; otherwise
/// the reference behaves exactly like `$ref`.
pub(crate) fn resolve_dynamic_ref(
    ctx: &EvaluationContext<'_>,
    reference: &str,
) -> Result<Arc<Schema>, EvaluationError> {
    let target = join(ctx.base_uri(), reference)?;
    if let Some(name) = plain_anchor(&target) {
        for scope in ctx.dynamic_scopes() {
            if let Some(found) = ctx.registry().dynamic_anchor(&scope, &name) {
                return Ok(found);
            }
        }
    }
    ctx.registry().resolve(&target)
}

/// Resolve a `$recursiveRef "#"`: the outermost dynamic scope whose
/// resource root carries `$recursiveAnchor: true`, else the current
/// resource root.
pub(crate) fn resolve_recursive_ref(
    ctx: &EvaluationContext<'_>,
) -> Result<Arc<Schema>, EvaluationError> {
    for scope in ctx.dynamic_scopes() {
        if ctx.registry().is_recursive_root(&scope) {
            return ctx.registry().resolve(&scope);
        }
    }
    ctx.registry().resolve(ctx.base_uri())
}

fn join(base: &Url, reference: &str) -> Result<Url, EvaluationError> {
    Url::options()
        .base_url(Some(base))
        .parse(reference)
        .map_err(|e| EvaluationError::ReferenceResolution {
            uri: reference.to_string(),
            reason: format!("cannot resolve against `{base}`: {e}"),
        })
}

/// The fragment as an anchor name, when it is one (non-empty, not a
/// pointer).
fn plain_anchor(uri: &Url) -> Option<String> {
    match uri.fragment() {
        Some(fragment) if !fragment.is_empty() && !fragment.starts_with('/') => {
            Some(fragment.to_string())
        }
        _ => None,
    }
}
