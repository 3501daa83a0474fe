//! Attribute values: kind classification, validation and formatting
//!
//! A raw token is classified exactly once, when the attribute is created.
//! Afterwards the kind is fixed and every assignment is validated against it.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::error::{DomainError, DomainResult};

static ENUM_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z_]+$").unwrap());

static FLOAT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?[0-9]+\.[0-9]+(?:[eE][-+]?[0-9]+)?$").unwrap());

/// The closed set of attribute kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Enum,
    Int,
    Float,
    String,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Bool => "Bool",
            Kind::Enum => "Enum",
            Kind::Int => "Int",
            Kind::Float => "Float",
            Kind::String => "String",
        };
        f.write_str(name)
    }
}

/// Input accepted when creating or assigning an attribute value.
///
/// Text is what the scanner produces; the native variants let callers build
/// documents without formatting numbers themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Bool(bool),
    Int(i128),
    Float(f64),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(text) => f.write_str(text),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Int(i) => write!(f, "{i}"),
            RawValue::Float(v) => f.write_str(&format_float(*v)),
        }
    }
}

impl From<&str> for RawValue {
    fn from(text: &str) -> Self {
        RawValue::Text(text.to_string())
    }
}

impl From<String> for RawValue {
    fn from(text: String) -> Self {
        RawValue::Text(text)
    }
}

impl From<&String> for RawValue {
    fn from(text: &String) -> Self {
        RawValue::Text(text.clone())
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl From<i128> for RawValue {
    fn from(i: i128) -> Self {
        RawValue::Int(i)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Int(i128::from(i))
    }
}

impl From<u64> for RawValue {
    fn from(i: u64) -> Self {
        RawValue::Int(i128::from(i))
    }
}

impl From<i32> for RawValue {
    fn from(i: i32) -> Self {
        RawValue::Int(i128::from(i))
    }
}

impl From<u32> for RawValue {
    fn from(i: u32) -> Self {
        RawValue::Int(i128::from(i))
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

/// A typed attribute value.
///
/// `Float` keeps the lexical form it is written with so that parsed numbers
/// round-trip; `Int` is wide enough for both signed and unsigned 64-bit
/// fields; `String` keeps its surrounding quotes (and any continuation
/// lines) for the same reason.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Enum(String),
    Int(i128),
    Float { value: f64, text: String },
    String(String),
}

impl Value {
    /// Classify a raw token. First match wins: bool, enum, float, int, string.
    ///
    /// Never fails: empty or unparseable text becomes a String.
    pub fn classify(raw: impl Into<RawValue>) -> Value {
        match raw.into() {
            RawValue::Bool(b) => Value::Bool(b),
            RawValue::Int(i) => Value::Int(i),
            RawValue::Float(v) => Value::from_f64(v),
            RawValue::Text(text) => classify_text(text),
        }
    }

    /// Build a value of a fixed kind, rejecting input that violates the kind.
    pub fn with_kind(kind: Kind, raw: impl Into<RawValue>) -> DomainResult<Value> {
        let raw = raw.into();
        let rejected = || DomainError::Value {
            kind,
            value: raw.to_string(),
        };

        match kind {
            Kind::Bool => match &raw {
                RawValue::Bool(b) => Ok(Value::Bool(*b)),
                RawValue::Int(1) => Ok(Value::Bool(true)),
                RawValue::Int(0) => Ok(Value::Bool(false)),
                RawValue::Text(text) => match text.as_str() {
                    "true" | "True" | "1" => Ok(Value::Bool(true)),
                    "false" | "False" | "0" => Ok(Value::Bool(false)),
                    _ => Err(rejected()),
                },
                _ => Err(rejected()),
            },
            Kind::Enum => match &raw {
                RawValue::Text(text) if ENUM_REGEX.is_match(text) => Ok(Value::Enum(text.clone())),
                _ => Err(rejected()),
            },
            Kind::Int => match &raw {
                RawValue::Int(i) => Ok(Value::Int(*i)),
                RawValue::Float(v) if v.fract() == 0.0 && in_int_range(*v) => {
                    Ok(Value::Int(*v as i128))
                }
                RawValue::Text(text) => text
                    .trim()
                    .parse::<i128>()
                    .map(Value::Int)
                    .map_err(|_| rejected()),
                _ => Err(rejected()),
            },
            Kind::Float => match &raw {
                RawValue::Float(v) => Ok(Value::from_f64(*v)),
                RawValue::Int(i) => Ok(Value::from_f64(*i as f64)),
                RawValue::Text(text) => {
                    let text = text.trim();
                    if let Some(value) = parse_float_token(text) {
                        Ok(value)
                    } else {
                        text.parse::<f64>()
                            .map(Value::from_f64)
                            .map_err(|_| rejected())
                    }
                }
                RawValue::Bool(_) => Err(rejected()),
            },
            Kind::String => match &raw {
                RawValue::Text(text) => Ok(Value::String(quote_string(text))),
                _ => Err(rejected()),
            },
        }
    }

    /// A float formatted in the format's own convention.
    pub fn from_f64(value: f64) -> Value {
        Value::Float {
            value,
            text: format_float(value),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Enum(_) => Kind::Enum,
            Value::Int(_) => Kind::Int,
            Value::Float { .. } => Kind::Float,
            Value::String(_) => Kind::String,
        }
    }

    /// Replace the value, keeping the kind.
    pub fn assign(&mut self, raw: impl Into<RawValue>) -> DomainResult<()> {
        *self = Value::with_kind(self.kind(), raw)?;
        Ok(())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value when it fits an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|i| i64::try_from(i).ok())
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of Float and Int values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float { value, .. } => Some(*value),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Logical text of String (without the outer quotes) and Enum values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(raw) => Some(unquote_string(raw)),
            Value::Enum(token) => Some(token),
            _ => None,
        }
    }

    /// Whether this value equals `raw` under the kind's own comparison.
    pub fn matches(&self, raw: &RawValue) -> bool {
        match (self, raw) {
            (Value::Bool(b), RawValue::Bool(other)) => b == other,
            (Value::Bool(b), RawValue::Text(text)) => text == (if *b { "true" } else { "false" }),
            (Value::Int(i), RawValue::Int(other)) => i == other,
            (Value::Int(i), RawValue::Float(other)) => *i as f64 == *other,
            (Value::Int(i), RawValue::Text(text)) => text.trim().parse::<i128>() == Ok(*i),
            (Value::Float { value, .. }, RawValue::Float(other)) => value == other,
            (Value::Float { value, .. }, RawValue::Int(other)) => *value == *other as f64,
            (Value::Float { value, text }, RawValue::Text(other)) => {
                text == other || other.trim().parse::<f64>().map_or(false, |v| v == *value)
            }
            (Value::Enum(token), RawValue::Text(text)) => token == text,
            (Value::String(_), RawValue::Text(text)) => self.as_str() == Some(text.as_str()),
            _ => false,
        }
    }
}

/// The serialized form of the value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => f.write_str("true"),
            Value::Bool(false) => f.write_str("false"),
            Value::Enum(token) => f.write_str(token),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float { text, .. } => f.write_str(text),
            Value::String(raw) => f.write_str(raw),
        }
    }
}

fn classify_text(text: String) -> Value {
    match text.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if ENUM_REGEX.is_match(&text) {
        return Value::Enum(text);
    }
    if let Some(value) = parse_float_token(&text) {
        return value;
    }
    if let Ok(i) = text.parse::<i128>() {
        return Value::Int(i);
    }
    Value::String(quote_string(&text))
}

/// Whether `v` converts to an `Int` without saturating.
fn in_int_range(v: f64) -> bool {
    // i128::MAX as f64 rounds up to 2^127, which is itself out of range
    v >= i128::MIN as f64 && v < i128::MAX as f64
}

/// A float written in decimal-point form; keeps the lexical form with an
/// upper-case exponent marker.
fn parse_float_token(text: &str) -> Option<Value> {
    if !FLOAT_REGEX.is_match(text) {
        return None;
    }
    let value = text.parse::<f64>().ok()?;
    Some(Value::Float {
        value,
        text: text.replace('e', "E"),
    })
}

/// Format a float the way Defold writes them: plain decimal with a fractional
/// digit inside `[1e-3, 1e7)`, scientific with an upper-case `E` outside.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let text = value.to_string();
        if text.contains('.') {
            text
        } else {
            format!("{text}.0")
        }
    } else {
        let text = format!("{value:E}");
        match text.split_once('E') {
            Some((mantissa, exponent)) if !mantissa.contains('.') => {
                format!("{mantissa}.0E{exponent}")
            }
            _ => text,
        }
    }
}

fn is_quoted(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('"') && text.ends_with('"')
}

fn quote_string(text: &str) -> String {
    if is_quoted(text) {
        text.to_string()
    } else {
        format!("\"{text}\"")
    }
}

fn unquote_string(raw: &str) -> &str {
    if is_quoted(raw) {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("true", Kind::Bool)]
    #[case("false", Kind::Bool)]
    #[case("MY_ENUM", Kind::Enum)]
    #[case("BLEND_MODE_ALPHA", Kind::Enum)]
    #[case("4.1751063E-15", Kind::Float)]
    #[case("-0.5", Kind::Float)]
    #[case("4", Kind::Int)]
    #[case("-1280", Kind::Int)]
    #[case("hello", Kind::String)]
    #[case("\"/main/main.atlas\"", Kind::String)]
    #[case("", Kind::String)]
    #[case("True", Kind::String)]
    #[case("nOT_AN_ENUM", Kind::String)]
    #[case("KEY_1", Kind::String)]
    fn test_classify_kind(#[case] token: &str, #[case] expected: Kind) {
        assert_eq!(Value::classify(token).kind(), expected, "token {token:?}");
    }

    #[test]
    fn test_classify_values() {
        assert_eq!(Value::classify("true"), Value::Bool(true));
        assert_eq!(Value::classify("MY_ENUM"), Value::Enum("MY_ENUM".into()));
        assert_eq!(Value::classify("4"), Value::Int(4));
        assert_eq!(Value::classify("hello").as_str(), Some("hello"));
        assert_eq!(Value::classify("hello").to_string(), "\"hello\"");
        assert_eq!(Value::classify("").to_string(), "\"\"");
    }

    #[test]
    fn test_classify_native_values() {
        assert_eq!(Value::classify(true), Value::Bool(true));
        assert_eq!(Value::classify(7), Value::Int(7));
        assert_eq!(Value::classify(0.5).kind(), Kind::Float);
    }

    #[test]
    fn test_float_keeps_lexical_form_with_upper_exponent() {
        assert_eq!(Value::classify("4.6049512E-4").to_string(), "4.6049512E-4");
        assert_eq!(Value::classify("4.6049512e-4").to_string(), "4.6049512E-4");
        assert_eq!(Value::classify("1.0").to_string(), "1.0");
        assert_eq!(Value::classify("4.6049512E-4").as_f64(), Some(4.6049512e-4));
    }

    #[rstest]
    #[case(0.0, "0.0")]
    #[case(1.0, "1.0")]
    #[case(-2.5, "-2.5")]
    #[case(1280.0, "1280.0")]
    #[case(4.6049512e-4, "4.6049512E-4")]
    #[case(1e-15, "1.0E-15")]
    #[case(1.5e7, "1.5E7")]
    fn test_format_float(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_float(value), expected);
    }

    #[test]
    fn test_enum_assignment_validates() {
        let mut value = Value::classify("MY_ENUM");
        let err = value.assign("nOT_AN_ENUM").unwrap_err();
        assert!(matches!(err, DomainError::Value { kind: Kind::Enum, .. }));
        assert_eq!(value, Value::Enum("MY_ENUM".into()));

        value.assign("OTHER_ENUM").unwrap();
        assert_eq!(value, Value::Enum("OTHER_ENUM".into()));
    }

    #[rstest]
    #[case(RawValue::from("true"), true)]
    #[case(RawValue::from("True"), true)]
    #[case(RawValue::from("1"), true)]
    #[case(RawValue::from(1), true)]
    #[case(RawValue::from("False"), false)]
    #[case(RawValue::from("0"), false)]
    #[case(RawValue::from(false), false)]
    fn test_bool_assignment_accepts_equivalents(#[case] raw: RawValue, #[case] expected: bool) {
        let mut value = Value::Bool(!expected);
        value.assign(raw).unwrap();
        assert_eq!(value.as_bool(), Some(expected));
    }

    #[test]
    fn test_bool_assignment_rejects_other_text() {
        let mut value = Value::Bool(true);
        assert!(value.assign("yes").is_err());
        assert!(value.assign(2).is_err());
    }

    #[test]
    fn test_string_assignment_requires_text() {
        let mut value = Value::classify("\"name\"");
        assert!(value.assign(3).is_err());

        value.assign("other").unwrap();
        assert_eq!(value.to_string(), "\"other\"");

        value.assign("\"already quoted\"").unwrap();
        assert_eq!(value.to_string(), "\"already quoted\"");
        assert_eq!(value.as_str(), Some("already quoted"));
    }

    #[test]
    fn test_numeric_assignment_keeps_kind() {
        let mut int = Value::classify("2");
        int.assign(99).unwrap();
        assert_eq!(int.to_string(), "99");
        assert!(int.assign("2.5").is_err());

        let mut float = Value::classify("1.0");
        float.assign(10).unwrap();
        assert_eq!(float.to_string(), "10.0");
        float.assign("3.5e-8").unwrap();
        assert_eq!(float.to_string(), "3.5E-8");
    }

    #[test]
    fn test_int_beyond_i64_keeps_kind_and_text() {
        let value = Value::classify("18446744073709551615");
        assert_eq!(value.kind(), Kind::Int);
        assert_eq!(value.to_string(), "18446744073709551615");
        assert_eq!(value.as_i64(), None);
        assert_eq!(value.as_i128(), Some(i128::from(u64::MAX)));
    }

    #[test]
    fn test_int_assignment_rejects_unrepresentable_float() {
        let mut int = Value::classify("2");
        let err = int.assign(1e300).unwrap_err();
        assert!(matches!(err, DomainError::Value { kind: Kind::Int, .. }));
        assert!(int.assign(f64::INFINITY).is_err());
        assert!(int.assign(f64::NAN).is_err());
        assert_eq!(int, Value::Int(2));

        int.assign(1e20).unwrap();
        assert_eq!(int.to_string(), "100000000000000000000");
    }

    #[test]
    fn test_matches_compares_logical_values() {
        assert!(Value::classify("\"value\"").matches(&RawValue::from("value")));
        assert!(Value::classify("4").matches(&RawValue::from(4)));
        assert!(Value::classify("4").matches(&RawValue::from("4")));
        assert!(Value::classify("true").matches(&RawValue::from(true)));
        assert!(Value::classify("0.5").matches(&RawValue::from(0.5)));
        assert!(!Value::classify("MY_ENUM").matches(&RawValue::from("OTHER")));
    }
}
