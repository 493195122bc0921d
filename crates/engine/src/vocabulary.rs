//! Vocabularies: named keyword sets declared by meta-schemas.
//!
//! From 2019-09 onward a meta-schema's `$vocabulary` member lists the
//! vocabularies in force, each marked required or optional. The dispatcher
//! filters a frame's keywords by the active vocabulary set; a required
//! vocabulary the engine does not know is a structural error.

use crate::dialect::Dialect;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Keyword categories used to assign each keyword its vocabulary URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Core,
    Applicator,
    Validation,
    MetaData,
    FormatAnnotation,
    FormatAssertion,
    Content,
    Unevaluated,
}

fn category_of(keyword: &str) -> Option<Category> {
    Some(match keyword {
        "$schema" | "$id" | "$anchor" | "$dynamicAnchor" | "$dynamicRef" | "$recursiveAnchor"
        | "$recursiveRef" | "$ref" | "$defs" | "definitions" | "$comment" | "$vocabulary" => {
            Category::Core
        }
        "allOf" | "anyOf" | "oneOf" | "not" | "if" | "then" | "else" | "dependentSchemas"
        | "dependencies" | "properties" | "patternProperties" | "additionalProperties"
        | "propertyNames" | "items" | "prefixItems" | "additionalItems" | "contains" => {
            Category::Applicator
        }
        "unevaluatedItems" | "unevaluatedProperties" => Category::Unevaluated,
        "type" | "enum" | "const" | "multipleOf" | "maximum" | "exclusiveMaximum" | "minimum"
        | "exclusiveMinimum" | "maxLength" | "minLength" | "pattern" | "maxItems" | "minItems"
        | "uniqueItems" | "maxContains" | "minContains" | "maxProperties" | "minProperties"
        | "required" | "dependentRequired" => Category::Validation,
        "title" | "description" | "default" | "deprecated" | "readOnly" | "writeOnly"
        | "examples" => Category::MetaData,
        "format" => Category::FormatAnnotation,
        "contentEncoding" | "contentMediaType" | "contentSchema" => Category::Content,
        _ => return None,
    })
}

const VOCAB_2019: &str = "https://json-schema.org/draft/2019-09/vocab";
const VOCAB_2020: &str = "https://json-schema.org/draft/2020-12/vocab";
const VOCAB_NEXT: &str = "https://json-schema.org/draft/next/vocab";

/// The vocabulary URI a keyword belongs to under a dialect. `None` for
/// pre-vocabulary dialects and for keywords outside every vocabulary
/// (custom keywords): those are never filtered out.
#[must_use]
pub fn vocabulary_of(keyword: &str, dialect: Dialect) -> Option<String> {
    if !dialect.has_vocabularies() {
        return None;
    }
    let base = match dialect {
        Dialect::Draft201909 => VOCAB_2019,
        Dialect::Draft202012 => VOCAB_2020,
        Dialect::Next => VOCAB_NEXT,
        Dialect::Draft6 | Dialect::Draft7 => unreachable!("filtered above"),
    };
    let suffix = match category_of(keyword)? {
        Category::Core => "core",
        Category::Applicator => "applicator",
        // 2019-09 folds the unevaluated keywords into the applicator
        // vocabulary; 2020-12 splits them out.
        Category::Unevaluated => {
            if dialect == Dialect::Draft201909 {
                "applicator"
            } else {
                "unevaluated"
            }
        }
        Category::Validation => "validation",
        Category::MetaData => "meta-data",
        Category::FormatAnnotation => {
            if dialect == Dialect::Draft201909 {
                "format"
            } else {
                "format-annotation"
            }
        }
        Category::FormatAssertion => "format-assertion",
        Category::Content => "content",
    };
    Some(format!("{base}/{suffix}"))
}

/// The format-assertion vocabulary URI for a dialect, when one exists.
#[must_use]
pub fn format_assertion_uri(dialect: Dialect) -> Option<&'static str> {
    match dialect {
        Dialect::Draft202012 => Some("https://json-schema.org/draft/2020-12/vocab/format-assertion"),
        Dialect::Next => Some("https://json-schema.org/draft/next/vocab/format-assertion"),
        _ => None,
    }
}

fn standard_vocabularies(dialect: Dialect) -> Vec<String> {
    let base = match dialect {
        Dialect::Draft201909 => VOCAB_2019,
        Dialect::Draft202012 => VOCAB_2020,
        Dialect::Next => VOCAB_NEXT,
        Dialect::Draft6 | Dialect::Draft7 => return Vec::new(),
    };
    let mut suffixes = vec!["core", "applicator", "validation", "meta-data", "content"];
    if dialect == Dialect::Draft201909 {
        suffixes.push("format");
    } else {
        suffixes.extend(["unevaluated", "format-annotation", "format-assertion"]);
    }
    suffixes.iter().map(|s| format!("{base}/{s}")).collect()
}

/// Registry of vocabulary URIs the engine knows about.
///
/// The standard vocabularies of every supported dialect are built in; the
/// caller may register additional vocabulary URIs together with the custom
/// keywords they govern.
#[derive(Debug, Clone)]
pub struct VocabularyRegistry {
    known: HashSet<String>,
    /// Custom keyword name → vocabulary URI.
    keyword_map: HashMap<String, String>,
}

impl Default for VocabularyRegistry {
    fn default() -> Self {
        let mut known = HashSet::new();
        for dialect in [Dialect::Draft201909, Dialect::Draft202012, Dialect::Next] {
            known.extend(standard_vocabularies(dialect));
        }
        Self {
            known,
            keyword_map: HashMap::new(),
        }
    }
}

impl VocabularyRegistry {
    /// Register a custom vocabulary and the keyword names it governs.
    pub fn register(&mut self, uri: impl Into<String>, keywords: impl IntoIterator<Item = String>) {
        let uri = uri.into();
        for keyword in keywords {
            self.keyword_map.insert(keyword, uri.clone());
        }
        self.known.insert(uri);
    }

    /// Whether the engine recognizes the vocabulary URI.
    #[must_use]
    pub fn is_known(&self, uri: &str) -> bool {
        self.known.contains(uri)
    }

    /// The vocabulary a custom keyword was registered under.
    #[must_use]
    pub fn keyword_vocabulary(&self, keyword: &str) -> Option<&str> {
        self.keyword_map.get(keyword).map(String::as_str)
    }

    /// The full active set for a dialect's own meta-schema.
    #[must_use]
    pub fn default_active_set(&self, dialect: Dialect) -> Option<Arc<HashSet<String>>> {
        if !dialect.has_vocabularies() {
            return None;
        }
        let mut set: HashSet<String> = standard_vocabularies(dialect).into_iter().collect();
        // The default meta-schemas do not require format assertion.
        if let Some(assertion) = format_assertion_uri(dialect) {
            set.remove(assertion);
        }
        Some(Arc::new(set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_of_known_keywords() {
        assert_eq!(
            vocabulary_of("properties", Dialect::Draft202012).as_deref(),
            Some("https://json-schema.org/draft/2020-12/vocab/applicator")
        );
        assert_eq!(
            vocabulary_of("unevaluatedItems", Dialect::Draft201909).as_deref(),
            Some("https://json-schema.org/draft/2019-09/vocab/applicator")
        );
        assert_eq!(
            vocabulary_of("unevaluatedItems", Dialect::Draft202012).as_deref(),
            Some("https://json-schema.org/draft/2020-12/vocab/unevaluated")
        );
        assert_eq!(vocabulary_of("type", Dialect::Draft7), None);
        assert_eq!(vocabulary_of("my-custom", Dialect::Draft202012), None);
    }

    #[test]
    fn test_default_registry_knows_standard_vocabularies() {
        let registry = VocabularyRegistry::default();
        assert!(registry.is_known("https://json-schema.org/draft/2020-12/vocab/core"));
        assert!(registry.is_known("https://json-schema.org/draft/2019-09/vocab/format"));
        assert!(!registry.is_known("https://example.com/vocab/custom"));
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = VocabularyRegistry::default();
        registry.register(
            "https://example.com/vocab/custom",
            vec!["widgetCount".to_string()],
        );
        assert!(registry.is_known("https://example.com/vocab/custom"));
        assert_eq!(
            registry.keyword_vocabulary("widgetCount"),
            Some("https://example.com/vocab/custom")
        );
    }

    #[test]
    fn test_default_active_set_excludes_format_assertion() {
        let registry = VocabularyRegistry::default();
        let set = registry.default_active_set(Dialect::Draft202012).unwrap();
        assert!(set.contains("https://json-schema.org/draft/2020-12/vocab/validation"));
        assert!(!set.contains("https://json-schema.org/draft/2020-12/vocab/format-assertion"));
        assert!(registry.default_active_set(Dialect::Draft7).is_none());
    }
}
