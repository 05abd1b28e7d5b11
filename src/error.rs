//! Error types for richdoc.

use crate::rtf::RtfError;
use std::fmt;
use std::io;

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for document operations.
///
/// Contract violations (`OutOfRange`, `InvalidArgument`, `InvalidEnumValue`)
/// are kept apart from data errors (`Rtf`, `Io`) so callers can tell a bug in
/// their own code from a bad input file.
#[derive(Debug)]
pub enum Error {
    /// I/O error while loading or saving text, including allocation failure
    /// while buffering a plain-text load.
    Io(io::Error),
    /// Index-bearing argument outside its valid range.
    OutOfRange {
        what: &'static str,
        value: usize,
        max: usize,
    },
    /// Argument rejected for a reason other than range.
    InvalidArgument(String),
    /// Integer that does not name a variant of the target enum.
    InvalidEnumValue { what: &'static str, value: i32 },
    /// Malformed RTF input.
    Rtf(RtfError),
    /// Internal line/tag invariant broken (reported by `check_invariants`).
    Invariant(String),
}

impl Error {
    pub(crate) fn out_of_range(what: &'static str, value: usize, max: usize) -> Self {
        Self::OutOfRange { what, value, max }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OutOfRange { what, value, max } => {
                write!(f, "{what} {value} out of range (max {max})")
            }
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::InvalidEnumValue { what, value } => {
                write!(f, "invalid {what} value: {value}")
            }
            Self::Rtf(e) => write!(f, "malformed RTF: {e}"),
            Self::Invariant(msg) => write!(f, "document invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Rtf(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<RtfError> for Error {
    fn from(e: RtfError) -> Self {
        Self::Rtf(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtf::RtfErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::out_of_range("line", 7, 3);
        assert_eq!(err.to_string(), "line 7 out of range (max 3)");

        let err = Error::InvalidEnumValue {
            what: "alignment",
            value: 9,
        };
        assert!(err.to_string().contains("alignment"));

        let err = Error::Rtf(RtfError::new(RtfErrorKind::MissingHeader, 0));
        assert!(err.to_string().starts_with("malformed RTF"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
