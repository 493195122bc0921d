//! The `format` keyword.
//!
//! Annotative by default from 2019-09 (the default meta-schemas carry the
//! format-annotation vocabulary only); assertive in draft 6/7, when the
//! active vocabulary set includes the format-assertion vocabulary, or when
//! the caller sets `require_format_validation`. Unknown format names are
//! annotations unless `only_known_formats` makes them structural errors.

use super::{FactoryArgs, Keyword};
use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::result::ResultNode;
use crate::vocabulary;
use chrono::{DateTime, NaiveDate, NaiveTime};
use jsonschema_types::{JsonPointer, RelativeJsonPointer};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, LazyLock};
use url::Url;
use uuid::Uuid;

type FormatCheck = fn(&str) -> bool;

static CHECKERS: LazyLock<HashMap<&'static str, FormatCheck>> = LazyLock::new(|| {
    let mut map: HashMap<&'static str, FormatCheck> = HashMap::new();
    map.insert("date-time", check_date_time);
    map.insert("date", check_date);
    map.insert("time", check_time);
    map.insert("duration", check_duration);
    map.insert("email", check_email);
    map.insert("idn-email", check_email);
    map.insert("hostname", check_hostname);
    map.insert("idn-hostname", check_hostname);
    map.insert("ipv4", |s| s.parse::<Ipv4Addr>().is_ok());
    map.insert("ipv6", |s| s.parse::<Ipv6Addr>().is_ok());
    map.insert("uuid", |s| Uuid::parse_str(s).is_ok());
    map.insert("uri", check_uri);
    map.insert("uri-reference", check_uri_reference);
    map.insert("iri", check_uri);
    map.insert("iri-reference", check_uri_reference);
    map.insert("uri-template", check_uri_template);
    map.insert("json-pointer", |s| JsonPointer::parse(s).is_ok());
    map.insert("relative-json-pointer", |s| {
        RelativeJsonPointer::parse(s).is_ok()
    });
    map.insert("regex", |s| Regex::new(s).is_ok());
    map
});

#[derive(Debug)]
struct FormatKeyword {
    format: String,
}

impl Keyword for FormatKeyword {
    fn name(&self) -> &str {
        "format"
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        node: &mut ResultNode,
    ) -> Result<(), EvaluationError> {
        let Some(checker) = CHECKERS.get(self.format.as_str()).copied() else {
            if ctx.options().only_known_formats {
                return Err(EvaluationError::UnknownFormat {
                    name: self.format.clone(),
                });
            }
            node.annotate("format", Value::String(self.format.clone()));
            return Ok(());
        };

        let conforms = match ctx.value().as_str() {
            // Formats only constrain strings.
            None => true,
            Some(s) => checker(s),
        };

        if conforms {
            node.annotate("format", Value::String(self.format.clone()));
        } else if is_assertive(ctx) {
            node.fail(
                Some("format"),
                format!("Value does not conform to the \"{}\" format", self.format),
            );
        } else {
            tracing::debug!(format = %self.format, "format mismatch reported as annotation");
            node.annotate("format", Value::String(self.format.clone()));
        }
        Ok(())
    }
}

fn is_assertive(ctx: &EvaluationContext<'_>) -> bool {
    if ctx.options().require_format_validation {
        return true;
    }
    let schema = ctx.schema();
    if schema.dialect().format_asserts_by_default() {
        return true;
    }
    match (schema.vocabularies(), vocabulary::format_assertion_uri(schema.dialect())) {
        (Some(active), Some(assertion)) => active.contains(assertion),
        _ => false,
    }
}

pub(crate) fn format(args: FactoryArgs<'_, '_>) -> Result<Arc<dyn Keyword>, EvaluationError> {
    let Some(name) = args.value.as_str() else {
        return Err(args.ctx.malformed("format must be a string"));
    };
    Ok(Arc::new(FormatKeyword {
        format: name.to_string(),
    }))
}

fn check_date_time(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
}

fn check_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() && s.len() == 10
}

fn check_time(s: &str) -> bool {
    // full-time: partial-time plus a mandatory offset.
    let (body, offset_ok) = if let Some(stripped) =
        s.strip_suffix('Z').or_else(|| s.strip_suffix('z'))
    {
        (stripped, true)
    } else if let Some(position) = s.rfind(|c| c == '+' || c == '-') {
        let offset = &s[position + 1..];
        let valid_offset = offset.len() == 5
            && offset.as_bytes()[2] == b':'
            && NaiveTime::parse_from_str(&format!("{}:00", &offset[..5]), "%H:%M:%S").is_ok();
        (&s[..position], valid_offset)
    } else {
        return false;
    };
    offset_ok && NaiveTime::parse_from_str(body, "%H:%M:%S%.f").is_ok()
}

/// ISO 8601 duration, hand-parsed (the grammar needs lookahead a regex
/// engine without it cannot express).
fn check_duration(s: &str) -> bool {
    let Some(rest) = s.strip_prefix('P') else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }

    fn take_fields<'a>(
        mut input: &'a str,
        designators: &[char],
        fractions: bool,
    ) -> Option<(usize, &'a str)> {
        let mut count = 0;
        for &designator in designators {
            let digits = input.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                continue;
            }
            let mut end = digits;
            if fractions && input[digits..].starts_with('.') {
                let frac = input[digits + 1..]
                    .bytes()
                    .take_while(u8::is_ascii_digit)
                    .count();
                if frac == 0 {
                    return None;
                }
                end = digits + 1 + frac;
            }
            if input[end..].starts_with(designator) {
                input = &input[end + 1..];
                count += 1;
            }
        }
        Some((count, input))
    }

    // Weeks stand alone.
    if let Some((1, "")) = take_fields(rest, &['W'], false) {
        return true;
    }

    let Some((date_fields, after_date)) = take_fields(rest, &['Y', 'M', 'D'], false) else {
        return false;
    };
    match after_date.strip_prefix('T') {
        None => date_fields > 0 && after_date.is_empty(),
        Some(time_part) => {
            if time_part.is_empty() {
                return false;
            }
            matches!(
                take_fields(time_part, &['H', 'M', 'S'], true),
                Some((time_fields, "")) if time_fields > 0
            )
        }
    }
}

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("email regex is valid"));

fn check_email(s: &str) -> bool {
    EMAIL.is_match(s)
}

static HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
        .expect("hostname regex is valid")
});

fn check_hostname(s: &str) -> bool {
    s.len() <= 253 && HOSTNAME.is_match(s)
}

fn check_uri(s: &str) -> bool {
    Url::parse(s).is_ok()
}

static URI_REFERENCE_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("thismessage:/").expect("base URI is valid"));

fn check_uri_reference(s: &str) -> bool {
    Url::options()
        .base_url(Some(&URI_REFERENCE_BASE))
        .parse(s)
        .is_ok()
}

static URI_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\x00-\x20{}<>\x7f]|\{[^{}]+\})*$").expect("uri-template regex is valid")
});

fn check_uri_template(s: &str) -> bool {
    URI_TEMPLATE.is_match(s)
}
