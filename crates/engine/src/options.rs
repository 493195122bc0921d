//! Evaluation options.

use crate::dialect::Dialect;
use crate::registry::SchemaRegistry;
use crate::vocabulary::VocabularyRegistry;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use url::Url;

/// The shape of the projected output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// A single boolean; all detail omitted. Permits short-circuiting.
    #[default]
    Flag,
    /// A flat, pre-order list of the nodes carrying errors or annotations.
    Basic,
    /// The result tree with contentless passing nodes collapsed away.
    Detailed,
    /// The full result tree, including passing nodes.
    Verbose,
}

/// Options for a single evaluation.
///
/// Build with [`EvaluationOptions::default`] and the `with_*` methods:
///
/// ```rust,ignore
/// let options = EvaluationOptions::default()
///     .with_output_format(OutputFormat::Verbose)
///     .with_dialect(Dialect::Draft201909);
/// ```
#[derive(Debug, Clone)]
pub struct EvaluationOptions {
    /// Requested output shape.
    pub output_format: OutputFormat,
    /// Explicit dialect override; `None` auto-detects from `$schema`.
    pub evaluate_as: Option<Dialect>,
    /// Base URI assigned to schemas registered without an `$id`.
    pub default_base_uri: Url,
    /// Shared schema registry; a fresh private one when `None`.
    pub registry: Option<Arc<SchemaRegistry>>,
    /// Vocabulary URIs the engine should recognize beyond the standard set.
    pub vocabulary_registry: VocabularyRegistry,
    /// When `true`, unknown schema members surface as opaque annotations;
    /// when `false` they are ignored entirely.
    pub process_custom_keywords: bool,
    /// Force `format` to assert in every dialect.
    pub require_format_validation: bool,
    /// Treat an unrecognized `format` name as a structural error.
    pub only_known_formats: bool,
    /// Cooperative cancellation handle, honoured at subschema boundaries
    /// and before loader fetches.
    pub cancellation: Option<Arc<AtomicBool>>,
}

/// The default base URI for schemas registered without an `$id`.
pub const DEFAULT_BASE_URI: &str = "json-schema:///";

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            evaluate_as: None,
            default_base_uri: Url::parse(DEFAULT_BASE_URI).expect("default base URI is valid"),
            registry: None,
            vocabulary_registry: VocabularyRegistry::default(),
            process_custom_keywords: false,
            require_format_validation: false,
            only_known_formats: false,
            cancellation: None,
        }
    }
}

impl EvaluationOptions {
    /// Select the output shape.
    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Evaluate under a fixed dialect regardless of `$schema`.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.evaluate_as = Some(dialect);
        self
    }

    /// Base URI for schemas that carry no `$id`.
    #[must_use]
    pub fn with_default_base_uri(mut self, uri: Url) -> Self {
        self.default_base_uri = uri;
        self
    }

    /// Share a registry across evaluations (pre-registered documents,
    /// custom keywords, a custom loader).
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Surface unknown schema members as opaque annotations.
    #[must_use]
    pub fn with_custom_keywords(mut self, process: bool) -> Self {
        self.process_custom_keywords = process;
        self
    }

    /// Force `format` to assert.
    #[must_use]
    pub fn with_format_validation(mut self, require: bool) -> Self {
        self.require_format_validation = require;
        self
    }

    /// Error on `format` names the engine does not know.
    #[must_use]
    pub fn with_only_known_formats(mut self, strict: bool) -> Self {
        self.only_known_formats = strict;
        self
    }

    /// Install a cancellation handle.
    #[must_use]
    pub fn with_cancellation(mut self, handle: Arc<AtomicBool>) -> Self {
        self.cancellation = Some(handle);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = EvaluationOptions::default();
        assert_eq!(options.output_format, OutputFormat::Flag);
        assert_eq!(options.evaluate_as, None);
        assert_eq!(options.default_base_uri.as_str(), DEFAULT_BASE_URI);
        assert!(!options.process_custom_keywords);
    }

    #[test]
    fn test_builder_chain() {
        let options = EvaluationOptions::default()
            .with_output_format(OutputFormat::Verbose)
            .with_dialect(Dialect::Draft7)
            .with_custom_keywords(true)
            .with_format_validation(true);
        assert_eq!(options.output_format, OutputFormat::Verbose);
        assert_eq!(options.evaluate_as, Some(Dialect::Draft7));
        assert!(options.process_custom_keywords);
        assert!(options.require_format_validation);
    }
}
