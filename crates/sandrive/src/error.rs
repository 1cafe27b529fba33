//! Drive error types.

use std::io;
use thiserror::Error;

/// Drive error type.
///
/// `AccessDenied` is always produced before any store call has been made,
/// so an operation that fails with it has not touched the backing store.
#[derive(Debug, Error)]
pub enum DriveError {
    /// Policy refused the operation (includes sandbox escapes).
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// File or folder not found in the backing store.
    #[error("not found: {0}")]
    NotFound(String),

    /// Folder copied onto a file, or into its own subtree.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Invalid drive configuration (bad root, unparsable config file).
    #[error("configuration error: {0}")]
    Config(String),

    /// Any other I/O failure from the backing store.
    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl DriveError {
    /// Create an AccessDenied error.
    pub fn access_denied(path: impl Into<String>) -> Self {
        Self::AccessDenied(path.into())
    }

    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a Conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true for `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true for `AccessDenied`.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied(_))
    }

    /// Returns true for `Conflict`.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Missing paths surface as `NotFound`; everything else passes through as `Io`.
impl From<io::Error> for DriveError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(e.to_string()),
            _ => Self::Io(e),
        }
    }
}

/// Convert DriveError to std::io::Error for callers that speak `io`.
impl From<DriveError> for io::Error {
    fn from(e: DriveError) -> Self {
        match e {
            DriveError::AccessDenied(msg) => io::Error::new(io::ErrorKind::PermissionDenied, msg),
            DriveError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            DriveError::Conflict(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            DriveError::Config(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            DriveError::Io(e) => e,
        }
    }
}

/// Drive result type.
pub type DriveResult<T> = Result<T, DriveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err: DriveError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_other_io_errors_pass_through() {
        let err: DriveError = io::Error::new(io::ErrorKind::PermissionDenied, "os says no").into();
        match err {
            DriveError::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn test_into_io_error_kinds() {
        let e: io::Error = DriveError::access_denied("/x").into();
        assert_eq!(e.kind(), io::ErrorKind::PermissionDenied);
        let e: io::Error = DriveError::conflict("self").into();
        assert_eq!(e.kind(), io::ErrorKind::AlreadyExists);
    }
}
