use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

pub mod column;
pub mod counter;
pub mod filter;
pub mod statistics;
pub mod table;

/// Display format used for datetime cells
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema/parse error: {0}")]
    Parse(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column index {0} is out of range")]
    ColumnIndex(usize),

    #[error("Type mismatch on column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Row range {start}..{end} exceeds table of {rows} rows")]
    InvalidRange {
        start: usize,
        end: usize,
        rows: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Slide archive error: {0}")]
    Archive(String),
}

impl From<zip::result::ZipError> for ProcessorError {
    fn from(err: zip::result::ZipError) -> Self {
        ProcessorError::Archive(err.to_string())
    }
}

/// A cell that could not be parsed while loading, or a malformed row
#[derive(Debug, Clone)]
pub struct ParseError {
    pub row: usize,
    pub column: String,
    pub value: String,
    pub error: Option<String>,
}

/// Scalar cell value
#[derive(Debug, Clone)]
pub enum Value {
    /// Integer column
    Int(i64),
    /// Float column
    Float(f64),
    /// String column
    Str(String),
    /// Chronological column
    DateTime(NaiveDateTime),
    /// Missing cell
    Null,
}

impl Value {
    // every NaN payload counts as the same key, and so do both zeros
    fn float_bits(v: f64) -> u64 {
        if v.is_nan() {
            f64::NAN.to_bits()
        } else if v == 0.0 {
            0.0f64.to_bits()
        } else {
            v.to_bits()
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Null => "null",
        }
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Ordering between two comparable values.
    ///
    /// Ints and floats compare numerically with each other, datetimes and
    /// strings compare within their own kind. Anything else (including
    /// `Null` and NaN) is incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => Self::float_bits(*a) == Self::float_bits(*b),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int(v) => v.hash(state),
            Value::Float(v) => Self::float_bits(*v).hash(state),
            Value::Str(v) => v.hash(state),
            Value::DateTime(v) => v.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) if *v == 0.0 => write!(f, "0"),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v.format(DATETIME_FORMAT)),
            Value::Null => write!(f, "null"),
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

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_signed_zeros_share_one_key() {
        let zero = Value::Float(0.0);
        let negative = Value::Float(-0.0);
        assert_eq!(zero, negative);
        assert_eq!(negative.to_string(), "0");

        let set: HashSet<Value> = [zero, negative, Value::Float(1.5)].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_nan_values_share_one_key() {
        let quiet = Value::Float(f64::NAN);
        let other = Value::Float(-f64::NAN);
        assert_eq!(quiet, other);

        let set: HashSet<Value> = [quiet, other].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_int_and_float_are_distinct_keys() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn test_compare_mixed_numeric() {
        assert_eq!(
            Value::Int(15).compare(&Value::Float(10.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Null.compare(&Value::Int(1)), None);
        assert_eq!(Value::Float(f64::NAN).compare(&Value::Int(1)), None);
        assert_eq!(Value::from("a").compare(&Value::Int(1)), None);
    }
}
