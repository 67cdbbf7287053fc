use super::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a model attribute, as written in a package manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttributeType {
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Boolean,
    Resource,
    /// Any type the framework has no default for (`string`, `binary`, ...).
    Other(String),
}

impl AttributeType {
    pub fn parse(name: &str) -> Self {
        match name {
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "float" => Self::Float,
            "double" => Self::Double,
            "boolean" => Self::Boolean,
            "resource" => Self::Resource,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Resource => "resource",
            Self::Other(name) => name,
        }
    }

    /// Value a freshly constructed entity carries in a slot of this type.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Int16 | Self::Int32 | Self::Int64 => Value::Integer(0),
            Self::Float | Self::Double => Value::Float(0.0),
            Self::Boolean => Value::Boolean(false),
            Self::Resource => Value::empty_resource(),
            Self::Other(_) => Value::Null,
        }
    }

    pub fn is_compatible(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Int16, Value::Integer(i)) => i16::try_from(*i).is_ok(),
            (Self::Int32, Value::Integer(i)) => i32::try_from(*i).is_ok(),
            (Self::Int64, Value::Integer(_)) => true,
            (Self::Float | Self::Double, Value::Float(_) | Value::Integer(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Resource, Value::Resource(_)) => true,
            (Self::Other(_), _) => true,
            _ => false,
        }
    }
}

impl From<String> for AttributeType {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<AttributeType> for String {
    fn from(ty: AttributeType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
