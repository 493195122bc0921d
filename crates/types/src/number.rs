//! Mathematical-value view of a JSON number.
//!
//! JSON has one number type; `1`, `1.0`, and `1e0` are the same number.
//! Keywords that compare numbers (`type: "integer"`, the `minimum` family,
//! `multipleOf`, `enum`/`const`/`uniqueItems` equality) must use the
//! mathematical value, not the lexeme and not f64 rounding: `0.3` is a
//! multiple of `0.1` under decimal semantics even though it is not under
//! binary floating point.
//!
//! [`JsonNumber`] parses the numeric lexeme (preserved by `serde_json`'s
//! `arbitrary_precision` feature) into an exact decimal `mantissa * 10^exp`
//! form. Lexemes whose mantissa does not fit 128 bits fall back to f64
//! comparison, with `num_cmp` covering the mixed integer/float cases
//! exactly.

use num_cmp::NumCmp;
use std::cmp::Ordering;

/// A JSON number normalized for mathematical comparison.
#[derive(Debug, Clone, Copy)]
pub enum JsonNumber {
    /// `(-1)^neg * mantissa * 10^exponent`, mantissa trailing-zero free.
    Exact {
        neg: bool,
        mantissa: u128,
        exponent: i32,
    },
    /// Out-of-range fallback.
    Approx(f64),
}

impl JsonNumber {
    /// Parse from a `serde_json` number, preserving the original lexeme.
    #[must_use]
    pub fn from_number(number: &serde_json::Number) -> Self {
        let lexeme = number.to_string();
        parse_lexeme(&lexeme)
            .unwrap_or_else(|| Self::Approx(lexeme.parse::<f64>().unwrap_or(f64::NAN)))
    }

    /// Parse from a value; `None` unless it is a number.
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        value.as_number().map(Self::from_number)
    }

    /// Whether the mathematical value is an integer (`1.0` is).
    #[must_use]
    pub fn is_integer(&self) -> bool {
        match *self {
            Self::Exact {
                mantissa, exponent, ..
            } => mantissa == 0 || exponent >= 0,
            Self::Approx(f) => f.is_finite() && f.fract() == 0.0,
        }
    }

    /// Whether `self / divisor` is an integer, under decimal semantics
    /// where both sides are exact.
    #[must_use]
    pub fn is_multiple_of(&self, divisor: &JsonNumber) -> bool {
        if let (
            Self::Exact {
                mantissa: ma,
                exponent: ea,
                ..
            },
            Self::Exact {
                mantissa: mb,
                exponent: eb,
                ..
            },
        ) = (self, divisor)
        {
            if *mb == 0 {
                return false;
            }
            if *ma == 0 {
                return true;
            }
            let shift = ea - eb;
            let scaled = if shift >= 0 {
                pow10_checked(*ma, shift.unsigned_abs()).map(|scaled| scaled % mb)
            } else {
                pow10_checked(*mb, shift.unsigned_abs()).map(|scaled| ma % scaled)
            };
            if let Some(remainder) = scaled {
                return remainder == 0;
            }
            // Scaling overflowed; fall through to the float path.
        }
        let quotient = self.as_f64() / divisor.as_f64();
        if !quotient.is_finite() {
            return false;
        }
        (quotient - quotient.round()).abs() <= f64::EPSILON * quotient.abs().max(1.0)
    }

    /// Closest f64 (used for fallback comparison only).
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Exact {
                neg,
                mantissa,
                exponent,
            } => {
                let magnitude = mantissa as f64 * 10f64.powi(exponent);
                if neg {
                    -magnitude
                } else {
                    magnitude
                }
            }
            Self::Approx(f) => f,
        }
    }

    fn sign(&self) -> i8 {
        match *self {
            Self::Exact { mantissa: 0, .. } => 0,
            Self::Exact { neg: true, .. } => -1,
            Self::Exact { neg: false, .. } => 1,
            Self::Approx(f) => {
                if f == 0.0 {
                    0
                } else if f < 0.0 {
                    -1
                } else {
                    1
                }
            }
        }
    }
}

impl PartialEq for JsonNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for JsonNumber {}

impl PartialOrd for JsonNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JsonNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.sign().cmp(&other.sign()) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
        if self.sign() == 0 {
            return Ordering::Equal;
        }

        if let (
            Self::Exact {
                neg,
                mantissa: ma,
                exponent: ea,
            },
            Self::Exact {
                mantissa: mb,
                exponent: eb,
                ..
            },
        ) = (self, other)
        {
            if let Some(magnitude) = cmp_magnitudes(*ma, *ea, *mb, *eb) {
                return if *neg { magnitude.reverse() } else { magnitude };
            }
        }

        cmp_via_float(self, other)
    }
}

/// Compare `ma * 10^ea` with `mb * 10^eb`; `None` when scaling overflows.
fn cmp_magnitudes(ma: u128, ea: i32, mb: u128, eb: i32) -> Option<Ordering> {
    let shift = ea - eb;
    if shift >= 0 {
        pow10_checked(ma, shift.unsigned_abs()).map(|scaled| scaled.cmp(&mb))
    } else {
        pow10_checked(mb, shift.unsigned_abs()).map(|scaled| ma.cmp(&scaled))
    }
}

fn cmp_via_float(a: &JsonNumber, b: &JsonNumber) -> Ordering {
    // When one side is an in-range integer, num_cmp compares it against the
    // float side without rounding loss.
    if let (Some(int), JsonNumber::Approx(f)) = (as_i64(a), b) {
        return if NumCmp::num_lt(int, *f) {
            Ordering::Less
        } else if NumCmp::num_gt(int, *f) {
            Ordering::Greater
        } else {
            Ordering::Equal
        };
    }
    if let (JsonNumber::Approx(f), Some(int)) = (a, as_i64(b)) {
        return if NumCmp::num_lt(*f, int) {
            Ordering::Less
        } else if NumCmp::num_gt(*f, int) {
            Ordering::Greater
        } else {
            Ordering::Equal
        };
    }
    a.as_f64()
        .partial_cmp(&b.as_f64())
        .unwrap_or(Ordering::Equal)
}

fn as_i64(number: &JsonNumber) -> Option<i64> {
    match *number {
        JsonNumber::Exact {
            neg,
            mantissa,
            exponent,
        } if (0..=18).contains(&exponent) => {
            let scaled = pow10_checked(mantissa, exponent.unsigned_abs())?;
            let magnitude = i64::try_from(scaled).ok()?;
            Some(if neg { -magnitude } else { magnitude })
        }
        _ => None,
    }
}

fn pow10_checked(value: u128, power: u32) -> Option<u128> {
    let factor = 10u128.checked_pow(power)?;
    value.checked_mul(factor)
}

/// Parse a JSON numeric lexeme into exact form; `None` on overflow.
fn parse_lexeme(lexeme: &str) -> Option<JsonNumber> {
    let bytes = lexeme.as_bytes();
    let mut pos = 0;

    let neg = bytes.first() == Some(&b'-');
    if neg {
        pos += 1;
    }

    let mut digits: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut exponent: i64 = 0;

    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        digits.push(bytes[pos] - b'0');
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            digits.push(bytes[pos] - b'0');
            exponent -= 1;
            pos += 1;
        }
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        pos += 1;
        let exp_neg = match bytes.get(pos) {
            Some(b'-') => {
                pos += 1;
                true
            }
            Some(b'+') => {
                pos += 1;
                false
            }
            _ => false,
        };
        let mut exp: i64 = 0;
        let exp_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            exp = exp.checked_mul(10)?.checked_add(i64::from(bytes[pos] - b'0'))?;
            pos += 1;
        }
        if pos == exp_start {
            return None;
        }
        exponent += if exp_neg { -exp } else { exp };
    }
    if pos != bytes.len() || digits.is_empty() {
        return None;
    }

    // Accumulate significant digits into the mantissa.
    let mut mantissa: u128 = 0;
    let mut seen_nonzero = false;
    for &digit in &digits {
        if !seen_nonzero && digit == 0 {
            continue;
        }
        seen_nonzero = true;
        mantissa = mantissa.checked_mul(10)?.checked_add(u128::from(digit))?;
    }
    if !seen_nonzero {
        return Some(JsonNumber::Exact {
            neg: false,
            mantissa: 0,
            exponent: 0,
        });
    }

    // Normalize: strip trailing zeros into the exponent.
    while mantissa % 10 == 0 {
        mantissa /= 10;
        exponent += 1;
    }

    Some(JsonNumber::Exact {
        neg,
        mantissa,
        exponent: i32::try_from(exponent).ok()?,
    })
}

impl std::fmt::Display for JsonNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Exact {
                neg,
                mantissa,
                exponent,
            } => {
                if neg {
                    write!(f, "-")?;
                }
                if exponent >= 0 {
                    write!(f, "{mantissa}")?;
                    for _ in 0..exponent {
                        write!(f, "0")?;
                    }
                    Ok(())
                } else {
                    write!(f, "{mantissa}e{exponent}")
                }
            }
            Self::Approx(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn num(value: serde_json::Value) -> JsonNumber {
        JsonNumber::from_value(&value).unwrap()
    }

    #[test]
    fn test_integer_detection() {
        assert!(num(json!(1)).is_integer());
        assert!(num(json!(1.0)).is_integer());
        assert!(num(json!(-3e2)).is_integer());
        assert!(num(json!(0.0)).is_integer());
        assert!(!num(json!(1.5)).is_integer());
    }

    #[test]
    fn test_mathematical_equality() {
        assert_eq!(num(json!(1)), num(json!(1.0)));
        assert_eq!(num(json!(100)), num(json!(1e2)));
        assert_eq!(num(json!(0)), num(json!(-0.0)));
        assert_ne!(num(json!(1)), num(json!(1.0000001)));
    }

    #[test]
    fn test_ordering() {
        assert!(num(json!(-1)) < num(json!(0.5)));
        assert!(num(json!(0.1)) < num(json!(0.2)));
        assert!(num(json!(10)) > num(json!(9.999)));
        assert_eq!(num(json!(2.50)).cmp(&num(json!(2.5))), Ordering::Equal);
    }

    #[test]
    fn test_multiple_of_decimal_semantics() {
        // The classic float trap: 0.3 / 0.1 is not an integer in f64.
        assert!(num(json!(0.3)).is_multiple_of(&num(json!(0.1))));
        assert!(num(json!(0.0075)).is_multiple_of(&num(json!(0.0001))));
        assert!(num(json!(9)).is_multiple_of(&num(json!(3))));
        assert!(num(json!(0)).is_multiple_of(&num(json!(3))));
        assert!(!num(json!(0.31)).is_multiple_of(&num(json!(0.1))));
        assert!(!num(json!(7)).is_multiple_of(&num(json!(3))));
    }

    #[test]
    fn test_large_lexeme_falls_back() {
        let huge: serde_json::Value =
            serde_json::from_str("123456789123456789123456789123456789123456789").unwrap();
        let n = JsonNumber::from_value(&huge).unwrap();
        assert!(n.is_integer());
        assert!(n > num(json!(1)));
    }
}
