use thiserror::Error;

/// A raw record that could not be turned into a `ModalityRecord`.
///
/// Raised per record. A batch keeps going; the caller decides whether to skip the
/// record or abort the whole report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("missing mandatory field `{field}`")]
    MissingField { field: &'static str },

    #[error("field `{field}` has malformed value {value:?}")]
    Malformed { field: &'static str, value: String },

    #[error(transparent)]
    UnknownLiteral(#[from] ParseEnumError),

    #[error("record {id}: completion date precedes selection date")]
    CompletionBeforeSelection { id: u64 },
}

/// An enumerated literal (type, status, distinction, report kind) that matches no variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("`{field}` must be at least {min}, got {value}")]
    WindowTooShort {
        field: &'static str,
        min: usize,
        value: usize,
    },
}
