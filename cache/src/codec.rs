//! String form of cached values.
//!
//! Every value is stored as a string so any string keyed, string valued
//! backend can hold it. Numbers are written as plain decimal text (which is
//! also their JSON form), everything else as JSON.

use serde::{Serialize, de::DeserializeOwned};

use crate::Value;

pub fn encode<T>(value: &T) -> Result<String, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    serde_json::to_string(value)
}

pub fn decode<T>(stored: &str) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned,
{
    serde_json::from_str(stored)
}

/// Whether the whole string is a finite base-10 integer or float literal.
pub fn is_numeric(stored: &str) -> bool {
    stored.bytes().any(|b| b.is_ascii_digit())
        && stored
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
        && stored.parse::<f64>().is_ok_and(f64::is_finite)
}

pub fn number(stored: &str) -> Option<Value> {
    if !is_numeric(stored) {
        return None;
    }

    match stored.parse::<i64>() {
        Ok(int) => Some(Value::Int(int)),
        Err(_) => stored.parse::<f64>().ok().map(normalize),
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("`{0}` has no 64-bit integer truncation")]
pub struct OutOfRange(pub f64);

/// Truncated integer reading of a stored string. `None` when it is not
/// numeric at all.
pub fn truncated(stored: &str) -> Option<Result<i64, OutOfRange>> {
    match number(stored)? {
        Value::Int(int) => Some(Ok(int)),
        Value::Float(float) if in_i64_range(float.trunc()) => Some(Ok(float as i64)),
        Value::Float(float) => Some(Err(OutOfRange(float))),
        _ => None,
    }
}

pub(crate) fn normalize(float: f64) -> Value {
    match float.fract() == 0.0 && in_i64_range(float) {
        true => Value::Int(float as i64),
        false => Value::Float(float),
    }
}

fn in_i64_range(float: f64) -> bool {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
    float >= i64::MIN as f64 && float < i64::MAX as f64
}
