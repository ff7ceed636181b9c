//! Values held at record keys.
//!
//! A stored value is a JSON value (a tagged union over null, bool, number,
//! string, array and object). Callers put any serializable value in and
//! decode it back out as the type they expect; a shape mismatch surfaces as
//! a decode error rather than a panic.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mapping of record keys to values for one save or load call.
pub type RecordFields = BTreeMap<String, RecordValue>;

/// A value stored under a single record key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordValue(Value);

impl RecordValue {
    /// Serialize any value into a record value.
    ///
    /// Non-finite floats have no JSON form and become `null`.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self)
    }

    /// Decode the stored value as `T`.
    ///
    /// Fails when the stored shape cannot be interpreted as `T` (a string
    /// read as an integer, an object missing a required field, ...).
    pub fn get_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }

    /// Borrow the underlying JSON value.
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_json(self) -> Value {
        self.0
    }

    /// Parse a command-line style literal.
    ///
    /// Valid JSON (`42`, `true`, `{"a":1}`, `"quoted"`) is kept as is;
    /// anything else is stored as a plain string.
    pub fn parse_literal(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self(value),
            Err(_) => Self(Value::String(raw.to_string())),
        }
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

impl From<Value> for RecordValue {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&str> for RecordValue {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}

impl From<String> for RecordValue {
    fn from(value: String) -> Self {
        Self(Value::String(value))
    }
}

impl From<bool> for RecordValue {
    fn from(value: bool) -> Self {
        Self(Value::Bool(value))
    }
}

impl From<i32> for RecordValue {
    fn from(value: i32) -> Self {
        Self(Value::from(value))
    }
}

impl From<i64> for RecordValue {
    fn from(value: i64) -> Self {
        Self(Value::from(value))
    }
}

impl From<u32> for RecordValue {
    fn from(value: u32) -> Self {
        Self(Value::from(value))
    }
}

/// NaN and infinities map to `null`.
impl From<f64> for RecordValue {
    fn from(value: f64) -> Self {
        Self(Value::from(value))
    }
}
