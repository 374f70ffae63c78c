//! Values crossing the bridge

use crate::{BridgeError, RemoteHandle, Result};

/// A decoded argument or return value.
///
/// Remote objects travel as [`Value::Handle`]; everything else is decoded by the
/// transport before it reaches the proxy.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Array(Vec<Value>),
    Handle(RemoteHandle),
}

impl Value {
    /// Short name of the variant, used in decoding errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Handle(_) => "handle",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn unexpected(&self, expected: &'static str) -> BridgeError {
        BridgeError::UnexpectedValue {
            expected,
            found: self.type_name(),
        }
    }

    pub fn as_handle(&self) -> Result<&RemoteHandle> {
        match self {
            Value::Handle(handle) => Ok(handle),
            other => Err(other.unexpected("handle")),
        }
    }

    pub fn into_handle(self) -> Result<RemoteHandle> {
        match self {
            Value::Handle(handle) => Ok(handle),
            other => Err(other.unexpected("handle")),
        }
    }

    /// Numeric value as `f64`; integers widen
    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Value::Double(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            other => Err(other.unexpected("number")),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(other.unexpected("int")),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(v) => Ok(*v),
            other => Err(other.unexpected("bool")),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(v) => Ok(v),
            other => Err(other.unexpected("string")),
        }
    }

    pub fn into_array(self) -> Result<Vec<Value>> {
        match self {
            Value::Array(values) => Ok(values),
            other => Err(other.unexpected("array")),
        }
    }

    /// Decode an array of strings (column names, labels)
    pub fn into_strings(self) -> Result<Vec<String>> {
        self.into_array()?
            .into_iter()
            .map(|v| match v {
                Value::Str(s) => Ok(s),
                other => Err(other.unexpected("string")),
            })
            .collect()
    }

    /// Build an array argument from anything string-like
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Array(items.into_iter().map(|s| Value::Str(s.into())).collect())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<RemoteHandle> for Value {
    fn from(v: RemoteHandle) -> Self {
        Value::Handle(v)
    }
}

impl From<&RemoteHandle> for Value {
    fn from(v: &RemoteHandle) -> Self {
        Value::Handle(v.clone())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = BridgeError;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None => n
                    .as_f64()
                    .map(Value::Double)
                    .ok_or_else(|| BridgeError::InvalidTable(format!("Unrepresentable number: {}", n))),
            },
            serde_json::Value::String(s) => Ok(Value::Str(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Value::try_from)
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            serde_json::Value::Object(_) => Err(BridgeError::InvalidTable(
                "Nested objects cannot be stored in a table cell".to_string(),
            )),
        }
    }
}
