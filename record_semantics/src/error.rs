//! Copy and rendering failures.

use std::fmt;

use thiserror::Error;

/// Kind of value that has no JSON representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedKind {
    /// A callable attribute.
    Function,
    /// NaN, Infinity or -Infinity.
    NonFiniteNumber,
    /// A record or list that contains itself.
    Cycle,
}

impl fmt::Display for UnsupportedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UnsupportedKind::Function => "function",
            UnsupportedKind::NonFiniteNumber => "non-finite number",
            UnsupportedKind::Cycle => "cyclic reference",
        };
        f.write_str(label)
    }
}

/// All possible copy failures.
#[derive(Debug, Error)]
pub enum CopyError {
    /// The record holds a value the interchange format cannot carry.
    #[error("unsupported value at {path}: {kind}")]
    UnsupportedValue { path: String, kind: UnsupportedKind },

    /// Serializing the record to JSON failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Parsing the JSON back into a record failed.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}

impl CopyError {
    pub fn unsupported(path: impl Into<String>, kind: UnsupportedKind) -> Self {
        CopyError::UnsupportedValue {
            path: path.into(),
            kind,
        }
    }
}
