use std::error::Error;
use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    Io,
    Parse,
    GameDetectionAmbiguous,
    UnsupportedOperation,
    OutOfRange,
    Resource,
    InvalidState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Index `index` is not below `bound` for the named collection.
    pub fn out_of_range(what: &str, index: usize, bound: usize) -> Self {
        Self::new(
            CoreErrorCode::OutOfRange,
            format!("{what} index {index} out of range, expected 0..{bound}"),
        )
    }

    pub fn not_editing(operation: &str) -> Self {
        Self::new(
            CoreErrorCode::InvalidState,
            format!("{operation} requires an open editing session"),
        )
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Self::new(CoreErrorCode::Resource, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(CoreErrorCode::UnsupportedOperation, message)
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for CoreError {}

impl From<io::Error> for CoreError {
    fn from(e: io::Error) -> Self {
        Self::new(CoreErrorCode::Io, e.to_string())
    }
}

/// Fails with `OutOfRange` unless `index < bound`.
pub fn check_index(what: &str, index: usize, bound: usize) -> Result<(), CoreError> {
    if index < bound {
        Ok(())
    } else {
        Err(CoreError::out_of_range(what, index, bound))
    }
}
