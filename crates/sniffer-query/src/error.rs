//! Error types reported by predicate engines.

/// The filter text could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("syntax error{}: {message}", at_offset(.position))]
pub struct SyntaxError {
    pub message: String,
    /// Byte offset into the filter text, when the engine can point at one.
    pub position: Option<usize>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: Option<usize>) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    pub fn at(message: impl Into<String>, position: usize) -> Self {
        Self::new(message, Some(position))
    }
}

fn at_offset(position: &Option<usize>) -> String {
    position
        .map(|offset| format!(" at offset {offset}"))
        .unwrap_or_default()
}

/// The filter parsed but does not type-check against the schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("type error: {message}")]
pub struct TypeError {
    pub message: String,
}

impl TypeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A valid predicate could not be evaluated against one record.
///
/// Callers treat this as "record does not match".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("evaluation error: {message}")]
pub struct EvaluationError {
    pub message: String,
}

impl EvaluationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
