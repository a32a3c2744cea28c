//! Runtime value types

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Runtime value type
///
/// The fixed value domain of MiniSpec. Source text never spells a value's
/// kind explicitly; [`Value::parse_literal`] decides it from the token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Value {
    #[default]
    Absent,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Parse a literal token into a value
    ///
    /// - digit-only tokens (with an optional leading `-`) become `Int`,
    ///   or `Float` when they contain a single `.`
    /// - `True` / `False` become `Bool`
    /// - `None` and the empty token become `Absent`
    /// - anything else is a string with surrounding quotes removed
    pub fn parse_literal(token: &str) -> Value {
        let digits = token.strip_prefix('-').unwrap_or(token);

        if is_digits(digits) {
            if let Ok(i) = token.parse::<i64>() {
                return Value::Int(i);
            }
            // Too large for i64, keep the magnitude as a float
            if let Ok(f) = token.parse::<f64>() {
                return Value::Float(f);
            }
        }

        if let Some((whole, frac)) = digits.split_once('.') {
            if (is_digits(whole) || whole.is_empty())
                && (is_digits(frac) || frac.is_empty())
                && !(whole.is_empty() && frac.is_empty())
            {
                if let Ok(f) = token.parse::<f64>() {
                    return Value::Float(f);
                }
            }
        }

        match token {
            "True" => Value::Bool(true),
            "False" => Value::Bool(false),
            "None" | "" => Value::Absent,
            _ => Value::Str(unquote(token).to_string()),
        }
    }

    /// Name of the value's kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
        }
    }

    /// Only `Bool(true)` counts as a satisfied condition
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    /// Whether two values can be compared with `<` / `>` / `==`
    ///
    /// Int and Float are one numeric kind; every other kind only matches itself.
    pub fn same_kind(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => true,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }

    /// Ordering between two values of the same kind
    ///
    /// Returns `None` for mismatched kinds, for `Absent`, and for NaN floats.
    pub fn ordering(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Equality that treats Int and Float as one numeric kind
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Absent, Value::Absent) => true,
            _ => self.ordering(other) == Some(Ordering::Equal),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "None"),
            Value::Int(i) => write!(f, "{}", i),
            // Never exponent notation, so the text parses back as a Float
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{}.0", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/* ===================== Return Value ===================== */

/// Result of evaluating a statement, program, or skill
///
/// `replan` is a value, not an error: whoever receives a `ReturnValue` with
/// `replan == true` stops evaluating the rest of its program and hands the
/// same value to its own caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnValue {
    pub value: Value,
    pub replan: bool,
}

impl ReturnValue {
    pub fn new(value: impl Into<Value>, replan: bool) -> Self {
        Self {
            value: value.into(),
            replan,
        }
    }

    /// A plain value that does not request a replan
    pub fn value(value: impl Into<Value>) -> Self {
        Self::new(value, false)
    }

    /// A replan request carrying a diagnostic message
    pub fn replan(message: impl Into<String>) -> Self {
        Self::new(Value::Str(message.into()), true)
    }
}

impl From<(Value, bool)> for ReturnValue {
    fn from((value, replan): (Value, bool)) -> Self {
        Self { value, replan }
    }
}

impl fmt::Display for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value={}, replan={}", self.value, self.replan)
    }
}

/* ===================== Helpers ===================== */

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Strip any run of single or double quotes from both ends
pub(crate) fn unquote(s: &str) -> &str {
    s.trim_matches(|c| c == '\'' || c == '"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integers_and_floats() {
        assert_eq!(Value::parse_literal("42"), Value::Int(42));
        assert_eq!(Value::parse_literal("-7"), Value::Int(-7));
        assert_eq!(Value::parse_literal("2.5"), Value::Float(2.5));
        assert_eq!(Value::parse_literal("5."), Value::Float(5.0));
        assert_eq!(Value::parse_literal(".5"), Value::Float(0.5));
    }

    #[test]
    fn test_parse_words() {
        assert_eq!(Value::parse_literal("True"), Value::Bool(true));
        assert_eq!(Value::parse_literal("False"), Value::Bool(false));
        assert_eq!(Value::parse_literal("None"), Value::Absent);
        assert_eq!(Value::parse_literal(""), Value::Absent);
        assert_eq!(Value::parse_literal("'five'"), Value::Str("five".into()));
        assert_eq!(Value::parse_literal("\"apple\""), Value::Str("apple".into()));
        assert_eq!(Value::parse_literal("1.2.3"), Value::Str("1.2.3".into()));
        assert_eq!(Value::parse_literal("."), Value::Str(".".into()));
    }

    #[test]
    fn test_display_round_trips_through_literal() {
        for v in [
            Value::Int(3),
            Value::Float(7.5),
            Value::Bool(true),
            Value::Absent,
        ] {
            assert_eq!(Value::parse_literal(&v.to_string()), v);
        }
        assert_eq!(Value::Float(7.0).to_string(), "7.0");
    }

    #[test]
    fn test_extreme_floats_round_trip_through_literal() {
        for x in [1e-7, 1e21, -2.5e-12, 123456789.125, -0.0] {
            let text = Value::Float(x).to_string();
            assert!(!text.contains('e'), "{}", text);
            assert_eq!(Value::parse_literal(&text), Value::Float(x));
        }
        assert_eq!(Value::Float(1e21).to_string(), "1000000000000000000000.0");
        assert_eq!(Value::Float(1e-7).to_string(), "0.0000001");
    }

    #[test]
    fn test_numeric_kinds_compare_with_each_other() {
        assert!(Value::Int(5).same_kind(&Value::Float(2.0)));
        assert_eq!(
            Value::Int(5).ordering(&Value::Float(2.0)),
            Some(Ordering::Greater)
        );
        assert!(Value::Int(2).loose_eq(&Value::Float(2.0)));
        assert!(!Value::Int(5).same_kind(&Value::Str("five".into())));
        assert_eq!(Value::Absent.ordering(&Value::Absent), None);
    }
}
