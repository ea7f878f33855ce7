//! Error types for textfx.

use std::fmt;

/// Result type alias for textfx operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for layout, style and rendering operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Style interval outside the buffer, or empty.
    InvalidInterval {
        offset: usize,
        len: usize,
        bound: usize,
    },
    /// Character offset outside the visible window.
    OutOfBounds { index: usize, len: usize },
    /// Line index outside the laid-out line table.
    LineOutOfRange { line: usize, count: usize },
    /// Unknown policy code or invalid option value.
    InvalidConfig(String),
    /// Overlay layer that was never registered.
    UnknownLayer(usize),
    /// Invalid color format (e.g., malformed hex string).
    InvalidColor(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInterval { offset, len, bound } => {
                write!(
                    f,
                    "invalid interval [{offset}, {}) for buffer of {bound} chars",
                    offset.saturating_add(*len)
                )
            }
            Self::OutOfBounds { index, len } => {
                write!(f, "offset {index} out of bounds for {len} chars")
            }
            Self::LineOutOfRange { line, count } => {
                write!(f, "line {line} out of range for {count} lines")
            }
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::UnknownLayer(id) => write!(f, "unknown overlay layer {id}"),
            Self::InvalidColor(s) => write!(f, "invalid color format: {s}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Bounds check helper: `index` must be strictly below `len`.
    pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
        if index < len {
            Ok(())
        } else {
            Err(Self::OutOfBounds { index, len })
        }
    }

    /// Bounds check helper for insertion points: `index` may equal `len`.
    pub(crate) fn check_position(index: usize, len: usize) -> Result<()> {
        if index <= len {
            Ok(())
        } else {
            Err(Self::OutOfBounds { index, len })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidColor("not-a-color".to_string());
        assert!(err.to_string().contains("invalid color format"));

        let err = Error::InvalidInterval {
            offset: 3,
            len: 10,
            bound: 5,
        };
        assert!(err.to_string().contains("[3, 13)"));

        let err = Error::OutOfBounds { index: 10, len: 4 };
        assert!(err.to_string().contains("offset 10"));

        let err = Error::LineOutOfRange { line: 7, count: 2 };
        assert_eq!(err.to_string(), "line 7 out of range for 2 lines");
    }

    #[test]
    fn test_bounds_helpers() {
        assert!(Error::check_index(0, 1).is_ok());
        assert_eq!(
            Error::check_index(1, 1),
            Err(Error::OutOfBounds { index: 1, len: 1 })
        );
        assert!(Error::check_position(1, 1).is_ok());
        assert!(Error::check_position(2, 1).is_err());
    }
}
