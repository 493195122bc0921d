//! Structural errors that abort an evaluation.
//!
//! Validation failures (a `type` mismatch, a missing `required` property)
//! are data in the result tree and never surface here. This taxonomy covers
//! the conditions under which no result tree can be produced at all.

use jsonschema_types::JsonPointer;
use thiserror::Error;
use url::Url;

/// A condition that aborts the whole evaluation.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// A reference could not be resolved to a schema.
    #[error("failed to resolve reference `{uri}`: {reason}")]
    ReferenceResolution { uri: String, reason: String },

    /// A reference chain re-entered the same schema at the same instance
    /// location without consuming any instance structure.
    #[error("reference cycle at `{schema_uri}` over instance location `{instance_location}`")]
    ReferenceCycle {
        schema_uri: Url,
        instance_location: JsonPointer,
    },

    /// The schema document is not a valid schema (wrong shape, bad regex,
    /// conflicting re-registration, unrecognized dialect).
    #[error("malformed schema at {location}: {reason}")]
    MalformedSchema { location: String, reason: String },

    /// A meta-schema requires a vocabulary the engine does not know.
    #[error("meta-schema requires unknown vocabulary `{uri}`")]
    UnknownVocabulary { uri: String },

    /// An unrecognized `format` name under strict format options.
    #[error("unknown format `{name}`")]
    UnknownFormat { name: String },

    /// The schema loader failed to produce a document.
    #[error("loader failed for `{uri}`: {source}")]
    Loader {
        uri: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The caller's cancellation handle was triggered.
    #[error("evaluation cancelled")]
    Cancelled,
}

impl EvaluationError {
    /// Shorthand for a [`EvaluationError::MalformedSchema`] at a known
    /// schema location.
    pub(crate) fn malformed(location: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self::MalformedSchema {
            location: location.to_string(),
            reason: reason.into(),
        }
    }
}
