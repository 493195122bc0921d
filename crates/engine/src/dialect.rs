//! Schema dialects and `$schema` detection.

use serde_json::Value;

/// JSON Schema dialect versions understood by the engine.
///
/// The dialect decides which keywords a schema object recognizes and how a
/// few of them behave (`$ref` sibling handling, the `items` hybrid form,
/// which anchor keywords exist).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Dialect {
    /// Draft 6
    Draft6,
    /// Draft 7
    Draft7,
    /// Draft 2019-09
    Draft201909,
    /// Draft 2020-12
    #[default]
    Draft202012,
    /// The in-progress "next" dialect; currently shares the 2020-12
    /// keyword set and exists so a `$schema` naming it selects distinct
    /// semantics once they diverge.
    Next,
}

impl Dialect {
    /// Map a `$schema` URI to a dialect; `None` for unrecognized URIs.
    ///
    /// A trailing `#` (common in older meta-schema URIs) is ignored.
    #[must_use]
    pub fn from_meta_schema_uri(uri: &str) -> Option<Self> {
        match uri.trim_end_matches('#') {
            "http://json-schema.org/draft-06/schema" => Some(Self::Draft6),
            "http://json-schema.org/draft-07/schema" => Some(Self::Draft7),
            "https://json-schema.org/draft/2019-09/schema" => Some(Self::Draft201909),
            "https://json-schema.org/draft/2020-12/schema" => Some(Self::Draft202012),
            "https://json-schema.org/draft/next/schema" => Some(Self::Next),
            _ => None,
        }
    }

    /// The canonical meta-schema URI.
    #[must_use]
    pub const fn meta_schema_uri(self) -> &'static str {
        match self {
            Self::Draft6 => "http://json-schema.org/draft-06/schema#",
            Self::Draft7 => "http://json-schema.org/draft-07/schema#",
            Self::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
            Self::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
            Self::Next => "https://json-schema.org/draft/next/schema",
        }
    }

    /// In draft 6/7 a schema object containing `$ref` is evaluated as the
    /// reference alone; siblings are ignored.
    #[must_use]
    pub const fn ref_overrides_siblings(self) -> bool {
        matches!(self, Self::Draft6 | Self::Draft7)
    }

    /// Whether the dialect has the vocabulary system (`$vocabulary`).
    #[must_use]
    pub const fn has_vocabularies(self) -> bool {
        matches!(self, Self::Draft201909 | Self::Draft202012 | Self::Next)
    }

    /// Whether `format` asserts by default in this dialect. Later dialects
    /// make it an annotation unless the format-assertion vocabulary or an
    /// option turns assertion on.
    #[must_use]
    pub const fn format_asserts_by_default(self) -> bool {
        matches!(self, Self::Draft6 | Self::Draft7)
    }

    /// Read the `$schema` member of a document, if it is a string.
    #[must_use]
    pub fn declared_meta_schema(document: &Value) -> Option<&str> {
        document.as_object()?.get("$schema")?.as_str()
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft6 => write!(f, "draft-06"),
            Self::Draft7 => write!(f, "draft-07"),
            Self::Draft201909 => write!(f, "draft 2019-09"),
            Self::Draft202012 => write!(f, "draft 2020-12"),
            Self::Next => write!(f, "draft next"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_schema_round_trip() {
        for dialect in [
            Dialect::Draft6,
            Dialect::Draft7,
            Dialect::Draft201909,
            Dialect::Draft202012,
            Dialect::Next,
        ] {
            assert_eq!(
                Dialect::from_meta_schema_uri(dialect.meta_schema_uri()),
                Some(dialect)
            );
        }
    }

    #[test]
    fn test_trailing_hash_tolerated() {
        assert_eq!(
            Dialect::from_meta_schema_uri("http://json-schema.org/draft-07/schema#"),
            Some(Dialect::Draft7)
        );
        assert_eq!(
            Dialect::from_meta_schema_uri("https://json-schema.org/draft/2020-12/schema#"),
            Some(Dialect::Draft202012)
        );
    }

    #[test]
    fn test_unknown_uri() {
        assert_eq!(Dialect::from_meta_schema_uri("https://example.com/my-meta"), None);
    }
}
