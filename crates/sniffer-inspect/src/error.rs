//! Error types for the inspector core.

use sniffer_types::RecordId;

/// Errors returned by inspector operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InspectError {
    /// A record arrived with an id that does not follow the last one.
    /// The store is left unchanged.
    #[error("record id {attempted} does not follow last appended id {last}")]
    InvariantViolation { last: RecordId, attempted: RecordId },

    /// A quick filter named a field the schema does not declare.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The inspector task has shut down.
    #[error("inspector is closed")]
    Closed,
}
