//! Relative JSON Pointer: an up-count, an optional array-index offset, and
//! either a pointer suffix or a trailing `#` name-of flag.

use crate::pointer::JsonPointer;
use serde_json::Value;

/// A parsed relative JSON Pointer such as `2/foo/0`, `0-1`, or `1#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeJsonPointer {
    /// How many levels to walk up from the starting location.
    up: u64,
    /// Adjustment applied to the final segment when the parent is an array.
    index_offset: i64,
    /// What to produce once positioned.
    target: Target,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// Descend by this pointer and yield the value.
    Pointer(JsonPointer),
    /// Yield the name (or index) of the current location itself.
    Name,
}

/// The outcome of evaluating a relative pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<'a> {
    /// The addressed value.
    Value(&'a Value),
    /// The member name or array index, as a string (the `#` form).
    Name(String),
}

/// Error produced when parsing a malformed relative pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativePointerParseError {
    pub input: String,
    pub reason: &'static str,
}

impl std::fmt::Display for RelativePointerParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid relative JSON pointer `{}`: {}",
            self.input, self.reason
        )
    }
}

impl std::error::Error for RelativePointerParseError {}

impl RelativeJsonPointer {
    /// Parse the string form: a non-negative integer, an optional `+N`/`-N`
    /// index adjustment, then either `#` or a JSON Pointer.
    pub fn parse(input: &str) -> Result<Self, RelativePointerParseError> {
        let err = |reason| RelativePointerParseError {
            input: input.to_string(),
            reason,
        };

        let digits = input.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(err("must start with a non-negative integer"));
        }
        if digits > 1 && input.starts_with('0') {
            return Err(err("up-count must not have leading zeros"));
        }
        let up: u64 = input[..digits].parse().map_err(|_| err("up-count overflow"))?;

        let mut rest = &input[digits..];
        let mut index_offset = 0i64;
        if rest.starts_with('+') || rest.starts_with('-') {
            let sign = if rest.starts_with('-') { -1 } else { 1 };
            let body = &rest[1..];
            let offset_digits = body.bytes().take_while(u8::is_ascii_digit).count();
            if offset_digits == 0 {
                return Err(err("index adjustment requires digits"));
            }
            let magnitude: i64 = body[..offset_digits]
                .parse()
                .map_err(|_| err("index adjustment overflow"))?;
            index_offset = sign * magnitude;
            rest = &body[offset_digits..];
        }

        let target = if rest == "#" {
            Target::Name
        } else {
            Target::Pointer(JsonPointer::parse(rest).map_err(|_| err("invalid pointer suffix"))?)
        };

        Ok(Self {
            up,
            index_offset,
            target,
        })
    }

    /// Evaluate from `location` within `root`.
    ///
    /// `None` when the walk leaves the document (up-count past the root, an
    /// index adjustment out of range, a name-of request at the root) or the
    /// final location is absent.
    #[must_use]
    pub fn evaluate<'a>(&self, root: &'a Value, location: &JsonPointer) -> Option<Resolved<'a>> {
        if self.up as usize > location.len() {
            return None;
        }
        let mut segments: Vec<String> =
            location.segments()[..location.len() - self.up as usize].to_vec();

        if self.index_offset != 0 {
            let last = segments.pop()?;
            let index: i64 = last.parse().ok()?;
            let adjusted = index.checked_add(self.index_offset)?;
            if adjusted < 0 {
                return None;
            }
            // The adjustment is only meaningful inside an array parent.
            let parent = JsonPointer::of(segments.clone()).resolve(root)?;
            if !parent.is_array() {
                return None;
            }
            segments.push(adjusted.to_string());
        }

        let position = JsonPointer::of(segments);
        match &self.target {
            Target::Name => position.last().map(|s| Resolved::Name(s.to_string())),
            Target::Pointer(suffix) => {
                let full = position.combine(suffix);
                full.resolve(root).map(Resolved::Value)
            }
        }
    }
}

impl std::fmt::Display for RelativeJsonPointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.up)?;
        if self.index_offset != 0 {
            write!(f, "{:+}", self.index_offset)?;
        }
        match &self.target {
            Target::Name => write!(f, "#"),
            Target::Pointer(pointer) => write!(f, "{pointer}"),
        }
    }
}

impl std::str::FromStr for RelativeJsonPointer {
    type Err = RelativePointerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "foo": ["bar", "baz"],
            "highly": {"nested": {"objects": true}}
        })
    }

    #[test]
    fn test_up_and_descend() {
        let doc = doc();
        let from = JsonPointer::parse("/foo/1").unwrap();

        let rel = RelativeJsonPointer::parse("0").unwrap();
        assert_eq!(rel.evaluate(&doc, &from), Some(Resolved::Value(&json!("baz"))));

        let rel = RelativeJsonPointer::parse("1/0").unwrap();
        assert_eq!(rel.evaluate(&doc, &from), Some(Resolved::Value(&json!("bar"))));

        let rel = RelativeJsonPointer::parse("2/highly/nested/objects").unwrap();
        assert_eq!(rel.evaluate(&doc, &from), Some(Resolved::Value(&json!(true))));
    }

    #[test]
    fn test_index_adjustment() {
        let doc = doc();
        let from = JsonPointer::parse("/foo/1").unwrap();

        let rel = RelativeJsonPointer::parse("0-1").unwrap();
        assert_eq!(rel.evaluate(&doc, &from), Some(Resolved::Value(&json!("bar"))));

        // Out of range after adjustment.
        let rel = RelativeJsonPointer::parse("0+5").unwrap();
        assert_eq!(rel.evaluate(&doc, &from), None);
    }

    #[test]
    fn test_name_of() {
        let doc = doc();
        let from = JsonPointer::parse("/foo/1").unwrap();

        let rel = RelativeJsonPointer::parse("0#").unwrap();
        assert_eq!(rel.evaluate(&doc, &from), Some(Resolved::Name("1".into())));

        let rel = RelativeJsonPointer::parse("1#").unwrap();
        assert_eq!(rel.evaluate(&doc, &from), Some(Resolved::Name("foo".into())));

        // Name-of the document root does not exist.
        let rel = RelativeJsonPointer::parse("2#").unwrap();
        assert_eq!(rel.evaluate(&doc, &from), None);
    }

    #[test]
    fn test_up_count_past_root() {
        let doc = doc();
        let from = JsonPointer::parse("/foo").unwrap();
        let rel = RelativeJsonPointer::parse("2").unwrap();
        assert_eq!(rel.evaluate(&doc, &from), None);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(RelativeJsonPointer::parse("").is_err());
        assert!(RelativeJsonPointer::parse("-1/a").is_err());
        assert!(RelativeJsonPointer::parse("01/a").is_err());
        assert!(RelativeJsonPointer::parse("1+").is_err());
        assert!(RelativeJsonPointer::parse("x/a").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for input in ["0", "1/foo", "0-1", "2+3/bar", "1#", "0#"] {
            let rel = RelativeJsonPointer::parse(input).unwrap();
            assert_eq!(rel.to_string(), input);
        }
    }
}
