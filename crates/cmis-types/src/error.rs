use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("invalid change token: {0}")]
    InvalidChangeToken(String),

    #[error("unknown {kind} value: {value}")]
    UnknownEnumValue { kind: &'static str, value: String },

    #[error("property {id}: expected {expected}, got {actual}")]
    PropertyTypeMismatch {
        id: String,
        expected: &'static str,
        actual: &'static str,
    },
}
