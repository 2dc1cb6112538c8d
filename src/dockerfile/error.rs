//! Error types for parsing, mutation, and variable resolution.
//!
//! All failures are surfaced synchronously to the caller; there is no retry,
//! no partial-success mode, and no internal recovery. Parsing is all-or-nothing
//! per `parse` call: the first unrecoverable failure is reported and nothing
//! else is attempted.

use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, mutating, or resolving a Dockerfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The grammar could not match the input. Carries the 1-based line and
    /// column of the furthest point the parser reached, plus what it expected
    /// to find there.
    Parse {
        line: usize,
        column: usize,
        expected: String,
    },
    /// A physical line that is neither whitespace, comment, nor a recognized
    /// instruction keyword while no instruction is being accumulated.
    UnexpectedLine { line: usize, content: String },
    /// A `?`/`:?` variable reference whose variable is unset. `detail` holds
    /// the resolved text of the reference's default expression.
    UndefinedVariable { name: String, detail: String },
    /// A mutation that would violate a structural invariant (for example
    /// setting a tag on an image name that already carries a digest). The
    /// tree is left unmodified.
    InvalidState(String),
    /// A setter was handed a value it cannot accept (empty required field,
    /// malformed identifier, non-whitespace text in a whitespace token).
    /// The tree is left unmodified.
    InvalidArgument(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse {
                line,
                column,
                expected,
            } => write!(
                f,
                "parse error at line {}, column {}: expected {}",
                line, column, expected
            ),
            Error::UnexpectedLine { line, content } => {
                write!(f, "unexpected line {}: {:?}", line, content)
            }
            Error::UndefinedVariable { name, detail } => {
                if detail.is_empty() {
                    write!(f, "variable '{}' is not set", name)
                } else {
                    write!(f, "variable '{}' is not set: {}", name, detail)
                }
            }
            Error::InvalidState(msg) => write!(f, "invalid state: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = Error::Parse {
            line: 3,
            column: 7,
            expected: "instruction arguments".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "parse error at line 3, column 7: expected instruction arguments"
        );
    }

    #[test]
    fn test_undefined_variable_display() {
        let err = Error::UndefinedVariable {
            name: "TAG".to_string(),
            detail: "tag must be provided".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "variable 'TAG' is not set: tag must be provided"
        );
    }
}
