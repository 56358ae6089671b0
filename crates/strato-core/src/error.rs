//! Validation error types shared across core modules.

use thiserror::Error;

/// Result type alias for snippet and policy validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors raised while validating a group definition before an update
/// is allowed to proceed. All of these surface synchronously, before any
/// instance is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The UpdatePolicy mapping contains a key other than
    /// `AutoScalingRollingUpdate`, or the policy body contains an
    /// unrecognized field.
    #[error("unknown policy key: {0}")]
    UnknownPolicyKey(String),

    /// A PauseTime value that does not parse as the supported ISO 8601
    /// duration subset, including durations carrying year or month
    /// components (never approximated).
    #[error(
        "invalid PauseTime {0:?}: Only ISO 8601 duration format of the form PnDTnHnMnS is supported"
    )]
    InvalidDuration(String),

    /// A recognized policy field carrying an out-of-range value.
    #[error("invalid value {value:?} for {field}: {reason}")]
    InvalidPolicyValue {
        field: String,
        value: String,
        reason: String,
    },

    /// A resource snippet missing a required section or carrying a value
    /// of the wrong shape.
    #[error("malformed resource snippet: {0}")]
    MalformedSnippet(String),
}
