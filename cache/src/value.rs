use std::fmt;

use serde::{Serialize, Serializer};

use crate::codec;

/// A value read back from a [`Store`](crate::Store).
///
/// Numbers come back normalized: `Int` when the stored number has no
/// fractional part, `Float` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Structured(serde_json::Value),
}

impl Value {
    pub fn from_stored(stored: &str) -> Result<Self, serde_json::Error> {
        match codec::number(stored) {
            Some(number) => Ok(number),
            None => serde_json::from_str::<serde_json::Value>(stored).map(Value::from),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(int) => Some(*int),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(int) => Some(*int as f64),
            Value::Float(float) => Some(*float),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Structured(json) => Some(json),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Int(int) => serializer.serialize_i64(*int),
            Value::Float(float) if !float.is_finite() => Err(serde::ser::Error::custom(format!(
                "non-finite number `{}` has no stored form",
                float
            ))),
            Value::Float(float) => serializer.serialize_f64(*float),
            Value::Text(text) => serializer.serialize_str(text),
            Value::Structured(json) => json.serialize(serializer),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(int) => write!(f, "{}", int),
            Value::Float(float) => write!(f, "{}", float),
            Value::Text(text) => write!(f, "{}", text),
            Value::Structured(json) => write!(f, "{}", json),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::String(text) => Value::Text(text),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(int) => Value::Int(int),
                None => number
                    .as_f64()
                    .map(codec::normalize)
                    .unwrap_or(Value::Structured(serde_json::Value::Number(number))),
            },
            other => Value::Structured(other),
        }
    }
}

impl From<i64> for Value {
    fn from(int: i64) -> Self {
        Value::Int(int)
    }
}

impl From<i32> for Value {
    fn from(int: i32) -> Self {
        Value::Int(int.into())
    }
}

impl From<f64> for Value {
    fn from(float: f64) -> Self {
        codec::normalize(float)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}
