/// Tolerant decoding for fields the server types inconsistently.
///
/// Pagination counters, monetary amounts and timestamps arrive sometimes as JSON
/// numbers and sometimes as numeric strings, and some records arrive as
/// positional arrays instead of objects. The helpers here coerce those shapes
/// into fixed Rust types. They are opt-in per field; everything else decodes
/// strictly through serde.
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::errors::BitkubError;

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Round half away from zero.
fn round_to_i64(f: f64, field: &str) -> Result<i64, BitkubError> {
    if !f.is_finite() {
        return Err(BitkubError::decode(field, format!("non-finite number {f}")));
    }
    let rounded = if f >= 0.0 { (f + 0.5).trunc() } else { (f - 0.5).trunc() };
    if rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return Err(BitkubError::decode(field, format!("{f} out of range for i64")));
    }
    Ok(rounded as i64)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// Coerce a number, numeric string, null or missing value into an `i64`.
pub fn coerce_i64(value: Option<&Value>, field: &str) -> Result<i64, BitkubError> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if n.is_u64() {
                Err(BitkubError::decode(field, format!("{n} out of range for i64")))
            } else {
                round_to_i64(n.as_f64().unwrap_or(f64::NAN), field)
            }
        }
        Some(Value::String(s)) => s
            .parse::<i64>()
            .map_err(|e| BitkubError::decode(field, format!("invalid integer {s:?}: {e}"))),
        Some(other) => Err(BitkubError::decode(
            field,
            format!("expected number or numeric string, found {}", kind(other)),
        )),
    }
}

/// Coerce a number, numeric string, null or missing value into a [`Decimal`].
///
/// Numbers are converted from their JSON text, so `0.1` stays exactly `0.1`.
pub fn coerce_decimal(value: Option<&Value>, field: &str) -> Result<Decimal, BitkubError> {
    match value {
        None | Some(Value::Null) => Ok(Decimal::ZERO),
        Some(Value::Number(n)) => {
            let text = n.to_string();
            parse_decimal(&text)
                .ok_or_else(|| BitkubError::decode(field, format!("{text} is not a decimal")))
        }
        Some(Value::String(s)) => parse_decimal(s)
            .ok_or_else(|| BitkubError::decode(field, format!("invalid decimal {s:?}"))),
        Some(other) => Err(BitkubError::decode(
            field,
            format!("expected number or numeric string, found {}", kind(other)),
        )),
    }
}

/// Coerce a string, number, null or missing value into a `String`.
pub fn coerce_string(value: Option<&Value>, field: &str) -> Result<String, BitkubError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(BitkubError::decode(
            field,
            format!("expected string, found {}", kind(other)),
        )),
    }
}

/// Borrow the elements of a positional record, checking its arity.
pub fn positional<'a>(
    value: &'a Value,
    arity: usize,
    shape: &str,
) -> Result<&'a [Value], BitkubError> {
    match value {
        Value::Array(items) if items.len() == arity => Ok(items),
        Value::Array(items) => Err(BitkubError::decode(
            shape,
            format!("expected {arity} elements, found {}", items.len()),
        )),
        other => Err(BitkubError::decode(
            shape,
            format!("expected array, found {}", kind(other)),
        )),
    }
}

/// Serde adapters applying the coercion rules to individual fields.
///
/// Pair each with `#[serde(default)]` so a missing field decodes to zero:
///
/// ```
/// use rust_decimal::Decimal;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Balance {
///     #[serde(default, deserialize_with = "bitkub_sdk::decode::lenient::decimal")]
///     available: Decimal,
/// }
///
/// let b: Balance = serde_json::from_str(r#"{"available":"1.25"}"#).unwrap();
/// assert_eq!(b.available.to_string(), "1.25");
/// ```
pub mod lenient {
    use rust_decimal::Decimal;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        super::coerce_i64(value.as_ref(), "integer field").map_err(D::Error::custom)
    }

    pub fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        super::coerce_decimal(value.as_ref(), "decimal field").map_err(D::Error::custom)
    }
}
