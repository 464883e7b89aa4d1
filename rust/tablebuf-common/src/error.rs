use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Read of `size` bytes at `position` falls outside a buffer of length `len`.
    pub fn out_of_bounds(position: usize, size: usize, len: usize) -> Error {
        ErrorKind::OutOfBounds {
            position,
            size,
            len,
        }
        .into()
    }

    /// Builder protocol violation detected while executing `operation`.
    pub fn invalid_state(operation: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidState {
            operation: operation.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn allocation_failed(requested: usize, source: Option<TryReserveError>) -> Error {
        ErrorKind::AllocationFailed { requested, source }.into()
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidFormat {
            element: element.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn invalid_utf8(position: usize, source: std::str::Utf8Error) -> Error {
        ErrorKind::InvalidUtf8 { position, source }.into()
    }

    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self.kind(), ErrorKind::OutOfBounds { .. })
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidState { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("read of {size} bytes at position {position} is out of bounds (buffer length {len})")]
    OutOfBounds {
        position: usize,
        size: usize,
        len: usize,
    },

    #[error("invalid builder state in {operation}: {message}")]
    InvalidState { operation: String, message: String },

    #[error("failed to allocate buffer storage of {requested} bytes")]
    AllocationFailed {
        requested: usize,
        #[source]
        source: Option<TryReserveError>,
    },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid buffer format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("invalid UTF-8 string at position {position}")]
    InvalidUtf8 {
        position: usize,
        source: std::str::Utf8Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<TryReserveError> for Error {
    fn from(e: TryReserveError) -> Self {
        Error::allocation_failed(0, Some(e))
    }
}
