//! Script and result types for a run.
//!
//! This module defines what a run executes (source, expected result type,
//! whether the native key-pair class is bound) and what it returns.

use crate::metrics::ExecutionMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Native type a script result is coerced into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coercion {
    /// 32-bit signed integer
    Integer,
    /// String
    String,
}

impl Coercion {
    /// Name used in coercion error messages
    pub fn expected(&self) -> &'static str {
        match self {
            Coercion::Integer => "Int32",
            Coercion::String => "String",
        }
    }
}

/// A coerced script result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptValue {
    /// Integer result
    Integer(i32),
    /// String result
    String(String),
}

impl ScriptValue {
    /// Get as integer
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            ScriptValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Integer(n) => write!(f, "{}", n),
            ScriptValue::String(s) => f.write_str(s),
        }
    }
}

impl From<i32> for ScriptValue {
    fn from(n: i32) -> Self {
        ScriptValue::Integer(n)
    }
}

impl From<String> for ScriptValue {
    fn from(s: String) -> Self {
        ScriptValue::String(s)
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::String(s.to_string())
    }
}

/// A script together with how to run it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// JavaScript source
    pub source: String,
    /// Expected result type
    pub coercion: Coercion,
    /// Bind `CK.Crypto` before executing
    pub bind_crypto: bool,
}

impl Script {
    /// Create a script without native bindings
    pub fn new(source: impl Into<String>, coercion: Coercion) -> Self {
        Self {
            source: source.into(),
            coercion,
            bind_crypto: false,
        }
    }

    /// Bind the native key-pair class before executing
    pub fn with_crypto(mut self) -> Self {
        self.bind_crypto = true;
        self
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// The coerced result
    pub value: ScriptValue,
    /// Execution metrics
    pub metrics: ExecutionMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_value_display() {
        assert_eq!(ScriptValue::Integer(8).to_string(), "8");
        assert_eq!(ScriptValue::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_script_value_accessors() {
        assert_eq!(ScriptValue::from(8).as_integer(), Some(8));
        assert_eq!(ScriptValue::from(8).as_str(), None);
        assert_eq!(ScriptValue::from("k".to_string()).as_str(), Some("k"));
    }

    #[test]
    fn test_script_value_serialization() {
        assert_eq!(serde_json::to_string(&ScriptValue::Integer(8)).unwrap(), "8");
        assert_eq!(
            serde_json::to_string(&ScriptValue::from("ab")).unwrap(),
            "\"ab\""
        );
    }

    #[test]
    fn test_script_builder() {
        let script = Script::new("2 + 6", Coercion::Integer);
        assert!(!script.bind_crypto);
        assert!(script.with_crypto().bind_crypto);
    }

    #[test]
    fn test_coercion_names() {
        assert_eq!(Coercion::Integer.expected(), "Int32");
        assert_eq!(Coercion::String.expected(), "String");
    }
}
