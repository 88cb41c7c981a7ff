// Sempred - Semantic Predicate Evaluator
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Runtime values visible to predicate expressions.
//!
//! A [`Value`] is what a binding context maps an identifier to. The kinds mirror
//! what the expression subset can produce: booleans, numbers (integer or floating),
//! strings, and host-supplied callables.

use std::{fmt, sync::Arc};

use thiserror::Error;

/// The kind of a [`Value`], used in type error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `true` or `false`
    Boolean,
    /// Integer or floating point number
    Number,
    /// String value
    String,
    /// Host-supplied function
    Callable,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Callable => "callable",
        };
        f.write_str(name)
    }
}

/// Error returned by a [`Callable`] when it cannot produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The callable was invoked with the wrong number of arguments.
    #[error("expected {expected} argument(s), got {found}")]
    Arity {
        /// Number of arguments the callable accepts
        expected: usize,
        /// Number of arguments it received
        found: usize,
    },
    /// An argument had an unusable value.
    #[error("invalid argument {index}: {message}")]
    InvalidArgument {
        /// Zero-based argument position
        index: usize,
        /// What was wrong with it
        message: String,
    },
    /// Any other failure reported by the host.
    #[error("{0}")]
    Failed(String),
}

/// A host function that predicates can call.
///
/// Callables receive already-evaluated argument values and return a value of the
/// same taxonomy. They must be deterministic and free of observable side effects:
/// the same predicate may be evaluated many times while a rule is re-entered, and
/// its result must depend only on the arguments and the bindings at that moment.
pub trait Callable: fmt::Debug + Send + Sync {
    /// Invoke the function with the given arguments.
    fn call(&self, args: &[Value]) -> Result<Value, CallError>;
}

/// A callable that ignores its arguments and always returns the same value.
///
/// This is how a debug setup stubs out helpers such as `doesItBlend()` whose real
/// implementation lives in the generated parser's target language.
#[derive(Debug, Clone)]
pub struct ConstantFunction {
    value: Value,
}

impl ConstantFunction {
    /// Create a callable returning `value` on every call.
    pub fn new(value: impl Into<Value>) -> Self {
        Self { value: value.into() }
    }
}

impl Callable for ConstantFunction {
    fn call(&self, _args: &[Value]) -> Result<Value, CallError> {
        Ok(self.value.clone())
    }
}

type NativeFn = dyn Fn(&[Value]) -> Result<Value, CallError> + Send + Sync;

/// A callable backed by a Rust closure.
pub struct NativeFunction {
    name: String,
    func: Box<NativeFn>,
}

impl NativeFunction {
    /// Wrap a closure as a callable. `name` is only used for debug output.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self { name: name.into(), func: Box::new(func) }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Callable for NativeFunction {
    fn call(&self, args: &[Value]) -> Result<Value, CallError> {
        (self.func)(args)
    }
}

/// A runtime value bound to an identifier or produced by evaluation.
#[derive(Debug, Clone)]
pub enum Value {
    /// Boolean value
    Bool(bool),
    /// Signed 64-bit integer
    Int(i64),
    /// Finite 64-bit float
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Host function
    Callable(Arc<dyn Callable>),
}

impl Value {
    /// Wrap a closure as a callable value.
    pub fn function<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Self]) -> Result<Self, CallError> + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(NativeFunction::new(name, func)))
    }

    /// A callable value that always returns `value`.
    pub fn constant_function(value: impl Into<Self>) -> Self {
        Self::Callable(Arc::new(ConstantFunction::new(value)))
    }

    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Boolean,
            Self::Int(_) | Self::Float(_) => ValueKind::Number,
            Self::Str(_) => ValueKind::String,
            Self::Callable(_) => ValueKind::Callable,
        }
    }

    /// Returns the numeric value widened to `f64` if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Whether this value is an integer or a float.
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Convert a JSON scalar into a value.
    ///
    /// Debug front ends usually ship bindings as JSON. Arrays, objects and `null`
    /// have no counterpart in the predicate subset and are rejected.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ValueError> {
        match json {
            serde_json::Value::Bool(b) => Ok(Self::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else {
                    match n.as_f64() {
                        Some(f) if f.is_finite() => Ok(Self::Float(f)),
                        _ => Err(ValueError::Unrepresentable(n.to_string())),
                    }
                }
            }
            serde_json::Value::String(s) => Ok(Self::Str(s.clone())),
            other => Err(ValueError::Unsupported(json_kind(other))),
        }
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
    }
}

/// Error converting external data into a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The external value has no predicate counterpart.
    #[error("{0} values cannot be bound to predicate identifiers")]
    Unsupported(&'static str),
    /// The number does not fit an `i64` or a finite `f64`.
    #[error("number {0} is not representable")]
    Unrepresentable(String),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Callable(a), Self::Callable(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Callable(c) => write!(f, "<callable {c:?}>"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Arc<dyn Callable>> for Value {
    fn from(value: Arc<dyn Callable>) -> Self {
        Self::Callable(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kinds() {
        assert_eq!(Value::from(true).kind(), ValueKind::Boolean);
        assert_eq!(Value::from(3).kind(), ValueKind::Number);
        assert_eq!(Value::from(2.5).kind(), ValueKind::Number);
        assert_eq!(Value::from("x").kind(), ValueKind::String);
        assert_eq!(Value::constant_function(1).kind(), ValueKind::Callable);
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Int(1), Value::Int(1));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::from("a"), Value::from("b"));

        let f = Value::constant_function(true);
        assert_eq!(f, f.clone());
        assert_ne!(f, Value::constant_function(true));
    }

    #[test]
    fn test_constant_function_ignores_arguments() {
        let f = ConstantFunction::new(42);
        assert_eq!(f.call(&[]).unwrap(), Value::Int(42));
        assert_eq!(f.call(&[Value::Bool(false), Value::from("x")]).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_native_function() {
        let len = Value::function("len", |args| match args {
            [Value::Str(s)] => Ok(Value::Int(s.len() as i64)),
            [_] => Err(CallError::InvalidArgument { index: 0, message: "not a string".into() }),
            _ => Err(CallError::Arity { expected: 1, found: args.len() }),
        });

        let Value::Callable(callable) = len else { panic!("expected callable") };
        assert_eq!(callable.call(&[Value::from("abc")]).unwrap(), Value::Int(3));
        assert_eq!(callable.call(&[]).unwrap_err(), CallError::Arity { expected: 1, found: 0 });
        assert!(format!("{callable:?}").contains("len"));
    }

    #[test]
    fn test_value_from_json() {
        assert_eq!(Value::from_json(&serde_json::json!(true)).unwrap(), Value::Bool(true));
        assert_eq!(Value::from_json(&serde_json::json!(7)).unwrap(), Value::Int(7));
        assert_eq!(Value::from_json(&serde_json::json!(0.5)).unwrap(), Value::Float(0.5));
        assert_eq!(Value::from_json(&serde_json::json!("v")).unwrap(), Value::from("v"));
        assert_eq!(
            Value::from_json(&serde_json::json!(null)).unwrap_err(),
            ValueError::Unsupported("null")
        );
        assert_eq!(
            Value::from_json(&serde_json::json!([1, 2])).unwrap_err(),
            ValueError::Unsupported("array")
        );
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::from("a\"b").to_string(), "\"a\\\"b\"");
    }
}
