//! Query and path parameter values.
//!
//! Parameters accept a narrow set of value kinds: strings, numbers, booleans,
//! and arrays of those scalars. Bulk setters additionally accept any
//! `Serialize` value whose fields project to key/value pairs; unsupported
//! shapes are rejected at the builder call, never at dispatch.

use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;

/// A single query or path parameter value.
///
/// Scalars render to their query-string text via [`render`](Self::render);
/// lists expand to repeated `key=value` query pairs in insertion order.
/// Path parameters must be scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A string value, used verbatim (percent-encoding happens at assembly).
    Str(String),
    /// An integer value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
    /// A boolean value, rendered as `true`/`false`.
    Bool(bool),
    /// An array of scalar values. Nested lists are rejected at construction
    /// from bags and unrepresentable through the `From` conversions.
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Returns `true` for array-valued parameters.
    pub fn is_list(&self) -> bool {
        matches!(self, ParamValue::List(_))
    }

    /// Renders a scalar to its query-string text.
    ///
    /// Lists render as a comma-joined fallback, but callers expand them to
    /// repeated pairs before rendering; path parameters reject lists earlier.
    pub fn render(&self) -> String {
        match self {
            ParamValue::Str(s) => s.clone(),
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Float(f) => f.to_string(),
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::List(items) => items
                .iter()
                .map(ParamValue::render)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Converts a JSON value into a parameter value.
    ///
    /// `Null` is not a parameter (bag projection drops null fields before
    /// calling this); objects and arrays-of-arrays are unsupported shapes.
    fn from_json(key: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(ParamValue::Str(s.clone())),
            Value::Bool(b) => Ok(ParamValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ParamValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(ParamValue::Float(f))
                } else {
                    Err(Error::Configuration(format!(
                        "parameter \"{key}\" has an unrepresentable numeric value: {n}"
                    )))
                }
            }
            Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    let element = Self::from_json(key, item)?;
                    if element.is_list() {
                        return Err(Error::Configuration(format!(
                            "parameter \"{key}\" contains a nested array, which is not supported"
                        )));
                    }
                    list.push(element);
                }
                Ok(ParamValue::List(list))
            }
            Value::Null | Value::Object(_) => Err(Error::Configuration(format!(
                "parameter \"{key}\" has an unsupported shape: expected a scalar or an array of scalars"
            ))),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Projects a `Serialize` value into ordered key/value parameter pairs.
///
/// The value must serialize to a JSON object. Null fields are dropped rather
/// than serialized as `"null"`. Nested objects and nested arrays are
/// configuration errors.
pub(crate) fn project_bag<B: Serialize>(bag: &B) -> Result<Vec<(String, ParamValue)>> {
    let value = serde_json::to_value(bag)
        .map_err(|e| Error::Configuration(format!("failed to serialize parameter bag: {e}")))?;
    let Value::Object(fields) = value else {
        return Err(Error::Configuration(
            "parameter bag must serialize to an object of key/value pairs".to_string(),
        ));
    };

    let mut pairs = Vec::with_capacity(fields.len());
    for (key, field) in &fields {
        if field.is_null() {
            continue;
        }
        pairs.push((key.clone(), ParamValue::from_json(key, field)?));
    }
    Ok(pairs)
}
