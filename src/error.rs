//! Typed errors
//!
//! These never cross the host boundary: callers log them and carry on with a default value or by
//! skipping the device command.

use thiserror::Error;

/// Why a user-supplied option could not be turned into a device parameter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("option '{0}' is missing")]
    Missing(String),

    #[error("option '{key}' is not a number: '{value}'")]
    NotANumber { key: String, value: String },

    #[error("option '{key}' value {value} is out of range for this model (max {max})")]
    OutOfRange { key: String, value: i64, max: i64 },

    #[error("option '{key}' has unknown choice '{value}'")]
    UnknownChoice { key: String, value: String },

    #[error("source {source_id} is not valid here")]
    InvalidSource { source_id: u16 },

    #[error("required state is not available yet")]
    StateUnavailable,

    #[error("model does not support this operation")]
    Unsupported,
}
