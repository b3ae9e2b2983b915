//! Argument encoding
//!
//! Converts heterogeneous argument values into the canonical token form
//! used by the wire protocol: strings stay strings, numbers keep their
//! numeric value, booleans become "1"/"0", absent values become "".

use std::fmt;

use serde_json::Value;

/// A value that knows its own canonical command-argument form.
///
/// Implementations return the argument to encode in place of the value
/// itself. The substitution is applied one level deep only: if `to_arg`
/// returns another [`Arg::Custom`], the nested value is stringified via
/// its `Display` impl instead of being expanded again.
pub trait CommandArg: fmt::Display + Send + Sync {
    /// The argument to encode in place of this value.
    fn to_arg(&self) -> Arg;
}

/// A single command argument prior to encoding.
pub enum Arg {
    /// A string, passed through as-is
    Str(String),

    /// A byte sequence, encoded as a string view of itself
    Bytes(Vec<u8>),

    /// An integer, preserved as a numeric token
    Int(i64),

    /// A float, preserved as a numeric token
    Float(f64),

    /// A boolean, encoded as "1" or "0"
    Bool(bool),

    /// An absent value, encoded as the empty string
    Nil,

    /// A self-describing value (see [`CommandArg`])
    Custom(Box<dyn CommandArg>),
}

impl Arg {
    /// Wrap a self-describing argument.
    pub fn custom(value: impl CommandArg + 'static) -> Self {
        Arg::Custom(Box::new(value))
    }

    /// Lenient stringification for values with no dedicated variant.
    ///
    /// Never fails; kept for compatibility with the permissive encoders of
    /// classic store clients rather than rejecting unsupported types.
    pub fn display(value: impl fmt::Display) -> Self {
        Arg::Str(value.to_string())
    }

    /// Encode into the JSON token sent on the wire.
    pub fn to_token(&self) -> Value {
        match self {
            Arg::Str(s) => Value::String(s.clone()),
            Arg::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
            Arg::Int(i) => Value::from(*i),
            Arg::Float(f) => Value::from(*f),
            Arg::Bool(true) => Value::String("1".to_string()),
            Arg::Bool(false) => Value::String("0".to_string()),
            Arg::Nil => Value::String(String::new()),
            Arg::Custom(custom) => match custom.to_arg() {
                // one level deep only
                Arg::Custom(nested) => Value::String(nested.to_string()),
                other => other.to_token(),
            },
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Arg::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            Arg::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Arg::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Arg::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Arg::Nil => f.write_str("Nil"),
            Arg::Custom(c) => f.debug_tuple("Custom").field(&c.to_string()).finish(),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(value)
    }
}

impl From<&[u8]> for Arg {
    fn from(value: &[u8]) -> Self {
        Arg::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Arg {
    fn from(value: Vec<u8>) -> Self {
        Arg::Bytes(value)
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Arg::Int(value as i64)
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Int(value)
    }
}

impl From<u32> for Arg {
    fn from(value: u32) -> Self {
        Arg::Int(value as i64)
    }
}

impl From<f32> for Arg {
    fn from(value: f32) -> Self {
        Arg::Float(value as f64)
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::Float(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Arg::Nil,
        }
    }
}
