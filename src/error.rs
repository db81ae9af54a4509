//! Error types for the script runner.
//!
//! This module defines the phases a run moves through, the structured
//! error a failed phase produces, and the main error type used throughout
//! the crate.

use serde::{Deserialize, Serialize};

/// Phase of a run in which an error originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Engine (runtime, heap, limits) initialization
    EngineInit,
    /// Global execution context creation
    ContextCreate,
    /// Registration of a native class on the global namespace
    Bind,
    /// Script evaluation
    Execute,
    /// Conversion of the script result into a native value
    Coerce,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::EngineInit => write!(f, "ENGINE_INIT"),
            Phase::ContextCreate => write!(f, "CONTEXT_CREATE"),
            Phase::Bind => write!(f, "BIND"),
            Phase::Execute => write!(f, "EXECUTE"),
            Phase::Coerce => write!(f, "COERCE"),
        }
    }
}

/// Error produced by a single phase of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptError {
    /// Phase the error originated in
    pub phase: Phase,

    /// Human-readable message (the thrown value for script errors)
    pub message: String,

    /// JavaScript stack trace, when the thrown value carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ScriptError {
    /// Create a new script error
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
            stack: None,
        }
    }

    /// Create an engine initialization error
    pub fn engine_init(message: impl Into<String>) -> Self {
        Self::new(Phase::EngineInit, message)
    }

    /// Create a context creation error
    pub fn context_create(message: impl Into<String>) -> Self {
        Self::new(Phase::ContextCreate, message)
    }

    /// Create a binding error
    pub fn bind(message: impl Into<String>) -> Self {
        Self::new(Phase::Bind, message)
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(Phase::Execute, message)
    }

    /// Create a coercion error
    pub fn coercion(expected: &str, actual: &str) -> Self {
        Self::new(
            Phase::Coerce,
            format!("expected {}, got {}", expected, actual),
        )
    }

    /// Add stack trace
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.phase, self.message)
    }
}

impl std::error::Error for ScriptError {}

/// Main error type for the runner
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A run phase failed
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;
