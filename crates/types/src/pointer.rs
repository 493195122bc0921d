//! JSON Pointer (RFC 6901) with `serde_json` resolution.

use serde_json::Value;

/// An immutable JSON Pointer: an ordered sequence of reference tokens.
///
/// Segments are stored unescaped; escaping (`~0` for `~`, `~1` for `/`) is
/// applied only when rendering to or parsing from the string form. The empty
/// pointer addresses the document root.
///
/// Resolution returns `Option<&Value>`: `None` is the engine's "absent"
/// sentinel (no such location), which is distinct from a present JSON null
/// (`Some(Value::Null)`). The two never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonPointer {
    segments: Vec<String>,
}

/// Error produced when parsing a malformed pointer string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerParseError {
    /// The offending input.
    pub input: String,
    /// What went wrong.
    pub reason: &'static str,
}

impl std::fmt::Display for PointerParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid JSON pointer `{}`: {}", self.input, self.reason)
    }
}

impl std::error::Error for PointerParseError {}

impl JsonPointer {
    /// The empty pointer (document root).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Build a pointer from unescaped segments.
    #[must_use]
    pub fn of<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse the string form. Must be empty or start with `/`.
    pub fn parse(input: &str) -> Result<Self, PointerParseError> {
        if input.is_empty() {
            return Ok(Self::empty());
        }
        if !input.starts_with('/') {
            return Err(PointerParseError {
                input: input.to_string(),
                reason: "must be empty or start with '/'",
            });
        }
        let mut segments = Vec::new();
        for raw in input[1..].split('/') {
            segments.push(unescape(raw).ok_or_else(|| PointerParseError {
                input: input.to_string(),
                reason: "'~' must be followed by '0' or '1'",
            })?);
        }
        Ok(Self { segments })
    }

    /// Returns the unescaped segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns `true` for the root pointer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Concatenate two pointers.
    #[must_use]
    pub fn combine(&self, other: &JsonPointer) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Append a single (unescaped) segment.
    #[must_use]
    pub fn push(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Append an array index segment.
    #[must_use]
    pub fn push_index(&self, index: usize) -> Self {
        self.push(index.to_string())
    }

    /// The pointer with the final segment removed; `None` at the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The final segment, if any.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Resolve against an instance document.
    ///
    /// `None` means the location does not exist (the absent sentinel).
    /// Numeric-looking segments are not implicitly indices: against an
    /// object they are member names, against an array they must parse as a
    /// canonical index (no leading zeros except `"0"`); the literal `"-"`
    /// end marker resolves to absent.
    #[must_use]
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            match current {
                Value::Object(map) => current = map.get(segment)?,
                Value::Array(items) => current = items.get(parse_index(segment)?)?,
                _ => return None,
            }
        }
        Some(current)
    }
}

/// Parse an array index token: canonical base-10, no leading zeros.
fn parse_index(segment: &str) -> Option<usize> {
    if segment == "-" {
        return None;
    }
    if segment.len() > 1 && segment.starts_with('0') {
        return None;
    }
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Escape a reference token for the string form.
#[must_use]
pub(crate) fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Unescape a reference token; `None` for a dangling or invalid `~`.
pub(crate) fn unescape(raw: &str) -> Option<String> {
    if !raw.contains('~') {
        return Some(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return None,
        }
    }
    Some(out)
}

impl std::fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", escape(segment))?;
        }
        Ok(())
    }
}

impl std::str::FromStr for JsonPointer {
    type Err = PointerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for JsonPointer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_round_trip() {
        for input in ["", "/a", "/a/0/b", "/a~1b/c~0d", "/"] {
            let pointer = JsonPointer::parse(input).unwrap();
            assert_eq!(pointer.to_string(), input);
        }
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(JsonPointer::parse("a/b").is_err());
        assert!(JsonPointer::parse("/a~2b").is_err());
        assert!(JsonPointer::parse("/a~").is_err());
    }

    #[test]
    fn test_empty_segment_is_a_name() {
        let pointer = JsonPointer::parse("/").unwrap();
        assert_eq!(pointer.len(), 1);
        let doc = json!({"": 1});
        assert_eq!(pointer.resolve(&doc), Some(&json!(1)));
    }

    #[test]
    fn test_resolve_object_and_array() {
        let doc = json!({"a": [10, {"b": null}]});
        assert_eq!(
            JsonPointer::parse("/a/0").unwrap().resolve(&doc),
            Some(&json!(10))
        );
        assert_eq!(
            JsonPointer::parse("/a/1/b").unwrap().resolve(&doc),
            Some(&serde_json::Value::Null)
        );
        assert_eq!(JsonPointer::parse("/a/2").unwrap().resolve(&doc), None);
        assert_eq!(JsonPointer::parse("/missing").unwrap().resolve(&doc), None);
    }

    #[test]
    fn test_absent_is_not_null() {
        // A property present with JSON null resolves to Some(Null); a
        // missing property resolves to None. They must never be conflated.
        let doc = json!({"a": null});
        let present = JsonPointer::parse("/a").unwrap().resolve(&doc);
        let absent = JsonPointer::parse("/b").unwrap().resolve(&doc);
        assert_eq!(present, Some(&serde_json::Value::Null));
        assert_eq!(absent, None);
        assert_ne!(present, absent);
    }

    #[test]
    fn test_array_index_rules() {
        let doc = json!([1, 2, 3]);
        assert_eq!(JsonPointer::parse("/0").unwrap().resolve(&doc), Some(&json!(1)));
        // Leading zeros are not canonical indices.
        assert_eq!(JsonPointer::parse("/01").unwrap().resolve(&doc), None);
        // The "-" end marker addresses the nonexistent element after the end.
        assert_eq!(JsonPointer::parse("/-").unwrap().resolve(&doc), None);
        // Numeric segments still work as object member names.
        let obj = json!({"0": "zero", "01": "oh-one"});
        assert_eq!(JsonPointer::parse("/01").unwrap().resolve(&obj), Some(&json!("oh-one")));
    }

    #[test]
    fn test_combine_push_parent() {
        let base = JsonPointer::parse("/a").unwrap();
        let combined = base.combine(&JsonPointer::parse("/b/c").unwrap());
        assert_eq!(combined.to_string(), "/a/b/c");
        assert_eq!(base.push("x").to_string(), "/a/x");
        assert_eq!(base.push_index(3).to_string(), "/a/3");
        assert_eq!(combined.parent().unwrap().to_string(), "/a/b");
        assert_eq!(JsonPointer::empty().parent(), None);
    }
}
