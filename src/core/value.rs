use super::types::DateTimeValue;
use serde_json::Value as JsonValue;
use std::fmt;

/// Scalar state held by an entity field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    DateTime(DateTimeValue),
    Array(Vec<Value>),
    Json(JsonValue),
}

impl Value {
    /// Converts a JSON-native scalar without any type coercion.
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Boolean(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map(Self::Float).unwrap_or(Self::Null),
            },
            JsonValue::String(s) => Self::Text(s.clone()),
            JsonValue::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            JsonValue::Object(_) => Self::Json(json.clone()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Boolean(_) => "BOOLEAN",
            Self::DateTime(_) => "DATETIME",
            Self::Array(_) => "ARRAY",
            Self::Json(_) => "JSON",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for the values that cannot serve as an identity:
    /// null, zero, `""`, `"0"`, `false` and the empty array.
    pub fn is_empty_identity(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Integer(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::Text(s) => s.is_empty() || s == "0",
            Self::Boolean(b) => !b,
            Self::Array(items) => items.is_empty(),
            Self::DateTime(_) => false,
            Self::Json(json) => json.as_object().is_some_and(|obj| obj.is_empty()),
        }
    }

    /// Strict equality: same variant and same payload, no numeric widening.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits() || a == b,
            (Self::Array(a), Self::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.identical(y))
            }
            _ => self == other,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTimeValue> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Text(s) => write!(f, "{}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::DateTime(dt) => write!(f, "{}", dt),
            Self::Array(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::Json(json) => write!(f, "{}", json),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTimeValue> for Value {
    fn from(dt: DateTimeValue) -> Self {
        Self::DateTime(dt)
    }
}

/// Declared type of a scalar entity field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Array,
    Json,
    Other(String),
}

impl ScalarType {
    /// Maps an ORM column type name (`"datetime"`, `"integer"`, ...) onto a scalar type.
    pub fn from_type_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "string" | "text" | "guid" => Self::String,
            "integer" | "smallint" | "bigint" => Self::Integer,
            "float" | "decimal" => Self::Float,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "datetime" | "datetimetz" => Self::DateTime,
            "array" | "simple_array" => Self::Array,
            "json" | "json_array" | "object" => Self::Json,
            _ => Self::Other(name.to_string()),
        }
    }

    /// Only temporal fields receive coerced values; the rest pass through.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }

    pub fn is_compatible(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Other(_), _) => true,
            (Self::String, Value::Text(_)) => true,
            (Self::Integer, Value::Integer(_)) => true,
            (Self::Float, Value::Float(_) | Value::Integer(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Date | Self::DateTime, Value::DateTime(_)) => true,
            (Self::Array, Value::Array(_)) => true,
            (Self::Json, _) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "boolean"),
            Self::Date => write!(f, "date"),
            Self::DateTime => write!(f, "datetime"),
            Self::Array => write!(f, "array"),
            Self::Json => write!(f, "json"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}
