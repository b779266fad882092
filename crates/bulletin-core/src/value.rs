//! Typed parameter values and the per-service-date [`ParameterSet`].
//!
//! Stored parameter records are loosely shaped JSON objects. Every value is
//! narrowed into one of three shapes on load so callers ask for the shape they
//! expect and get a typed error when the record disagrees.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The shape of a stored parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Scalar,
    List,
    Map,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueShape::Scalar => "scalar",
            ValueShape::List => "list",
            ValueShape::Map => "map",
        };
        f.write_str(label)
    }
}

/// Errors raised while reading or narrowing parameter values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("parameter '{key}' is a {found}, expected a {expected}")]
    ShapeMismatch {
        key: String,
        expected: ValueShape,
        found: ValueShape,
    },
    #[error("parameter '{key}' is not present")]
    Missing { key: String },
    #[error("parameter '{key}' has an unsupported value: {reason}")]
    Unsupported { key: String, reason: String },
    #[error("parameter record must be a JSON object")]
    NotAnObject,
}

/// A single parameter value.
///
/// `List` holds both announcement sequences and this-week/next-week schedules.
/// `Map` holds lookups such as `oow_id` (service id to outline id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl ParamValue {
    pub fn shape(&self) -> ValueShape {
        match self {
            ParamValue::Scalar(_) => ValueShape::Scalar,
            ParamValue::List(_) => ValueShape::List,
            ParamValue::Map(_) => ValueShape::Map,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            ParamValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ParamValue::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ParamValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Narrow a raw JSON value stored under `key`.
    ///
    /// Numbers and booleans become scalars in their JSON spelling, so a hymn
    /// number stored as `382` reads the same as `"382"`. Nested arrays or
    /// objects inside a list or map are rejected.
    pub fn from_json(key: &str, raw: Value) -> Result<Self, ValueError> {
        match raw {
            Value::String(text) => Ok(ParamValue::Scalar(text)),
            Value::Number(number) => Ok(ParamValue::Scalar(number.to_string())),
            Value::Bool(flag) => Ok(ParamValue::Scalar(flag.to_string())),
            Value::Array(items) => items
                .into_iter()
                .map(|item| leaf_text(key, item))
                .collect::<Result<Vec<_>, _>>()
                .map(ParamValue::List),
            Value::Object(entries) => entries
                .into_iter()
                .map(|(name, item)| leaf_text(key, item).map(|text| (name, text)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(ParamValue::Map),
            Value::Null => Err(ValueError::Unsupported {
                key: key.to_string(),
                reason: "null".to_string(),
            }),
        }
    }
}

fn leaf_text(key: &str, raw: Value) -> Result<String, ValueError> {
    match raw {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(ValueError::Unsupported {
            key: key.to_string(),
            reason: format!("nested value {other}"),
        }),
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Scalar(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Scalar(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::List(values)
    }
}

impl From<BTreeMap<String, String>> for ParamValue {
    fn from(entries: BTreeMap<String, String>) -> Self {
        ParamValue::Map(entries)
    }
}

/// All bulletin parameters for one service date.
///
/// Built once per bulletin and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSet {
    service_date: String,
    values: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    pub fn new(service_date: impl Into<String>, values: BTreeMap<String, ParamValue>) -> Self {
        Self {
            service_date: service_date.into(),
            values,
        }
    }

    /// Build a set from a stored JSON record.
    pub fn from_record(service_date: impl Into<String>, record: Value) -> Result<Self, ValueError> {
        let Value::Object(entries) = record else {
            return Err(ValueError::NotAnObject);
        };
        let values = entries
            .into_iter()
            .map(|(key, raw)| ParamValue::from_json(&key, raw).map(|value| (key, value)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self::new(service_date, values))
    }

    pub fn service_date(&self) -> &str {
        &self.service_date
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn scalar(&self, key: &str) -> Result<&str, ValueError> {
        let value = self.require(key)?;
        value
            .as_scalar()
            .ok_or_else(|| mismatch(key, ValueShape::Scalar, value))
    }

    pub fn list(&self, key: &str) -> Result<&[String], ValueError> {
        let value = self.require(key)?;
        value
            .as_list()
            .ok_or_else(|| mismatch(key, ValueShape::List, value))
    }

    pub fn map(&self, key: &str) -> Result<&BTreeMap<String, String>, ValueError> {
        let value = self.require(key)?;
        value
            .as_map()
            .ok_or_else(|| mismatch(key, ValueShape::Map, value))
    }

    fn require(&self, key: &str) -> Result<&ParamValue, ValueError> {
        self.values.get(key).ok_or_else(|| ValueError::Missing {
            key: key.to_string(),
        })
    }
}

fn mismatch(key: &str, expected: ValueShape, found: &ParamValue) -> ValueError {
    ValueError::ShapeMismatch {
        key: key.to_string(),
        expected,
        found: found.shape(),
    }
}
