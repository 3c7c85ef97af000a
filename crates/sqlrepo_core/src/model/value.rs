//! Scalar values exchanged between entities, rows and statements.

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Canonical text layout for date/time values bound to statements.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    /// Bound as `TIMESTAMP_FORMAT` text.
    Timestamp(NaiveDateTime),
}

/// A stored value did not fit the field it was assigned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
    InvalidTimestamp(String),
}

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedType { expected, found } => {
                write!(f, "expected {expected} value, found {found}")
            }
            Self::InvalidTimestamp(value) => write!(f, "invalid timestamp `{value}`"),
        }
    }
}

impl Error for MappingError {}

pub type MappingResult<T> = Result<T, MappingError>;

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short type label used in mapping errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
            Self::Timestamp(_) => "timestamp",
        }
    }

    /// Driver value to bind. Timestamps are rendered as text here, right
    /// before binding.
    pub fn to_sql_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Integer(value) => Value::Integer(*value),
            Self::Real(value) => Value::Real(*value),
            Self::Text(value) => Value::Text(value.clone()),
            Self::Blob(value) => Value::Blob(value.clone()),
            Self::Timestamp(value) => Value::Text(value.format(TIMESTAMP_FORMAT).to_string()),
        }
    }

    pub fn into_i64(self) -> MappingResult<i64> {
        match self {
            Self::Integer(value) => Ok(value),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn into_opt_i64(self) -> MappingResult<Option<i64>> {
        match self {
            Self::Null => Ok(None),
            other => other.into_i64().map(Some),
        }
    }

    pub fn into_f64(self) -> MappingResult<f64> {
        match self {
            Self::Real(value) => Ok(value),
            Self::Integer(value) => Ok(value as f64),
            other => Err(other.mismatch("real")),
        }
    }

    pub fn into_bool(self) -> MappingResult<bool> {
        match self {
            Self::Integer(value) => Ok(value != 0),
            other => Err(other.mismatch("boolean")),
        }
    }

    pub fn into_string(self) -> MappingResult<String> {
        match self {
            Self::Text(value) => Ok(value),
            Self::Timestamp(value) => Ok(value.format(TIMESTAMP_FORMAT).to_string()),
            other => Err(other.mismatch("text")),
        }
    }

    pub fn into_opt_string(self) -> MappingResult<Option<String>> {
        match self {
            Self::Null => Ok(None),
            other => other.into_string().map(Some),
        }
    }

    pub fn into_timestamp(self) -> MappingResult<NaiveDateTime> {
        match self {
            Self::Timestamp(value) => Ok(value),
            Self::Text(value) => parse_timestamp(&value),
            other => Err(other.mismatch("timestamp")),
        }
    }

    pub fn into_opt_timestamp(self) -> MappingResult<Option<NaiveDateTime>> {
        match self {
            Self::Null => Ok(None),
            other => other.into_timestamp().map(Some),
        }
    }

    fn mismatch(&self, expected: &'static str) -> MappingError {
        MappingError::UnexpectedType {
            expected,
            found: self.kind(),
        }
    }
}

fn parse_timestamp(value: &str) -> MappingResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|_| MappingError::InvalidTimestamp(value.to_string()))
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Integer(value) => Self::Integer(value),
            Value::Real(value) => Self::Real(value),
            Value::Text(value) => Self::Text(value),
            Value::Blob(value) => Self::Blob(value),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
