//! Filesystem error type.
//!
//! Each variant carries the path it refers to and displays in the
//! `strerror` register that command output expects, e.g.
//! `notes.txt: No such file or directory`. Builtins usually want only the
//! reason, which [`VfsError::reason`] provides.

use thiserror::Error;

/// Result type for VFS operations.
pub type VfsResult<T> = Result<T, VfsError>;

/// Errors from virtual filesystem operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VfsError {
    #[error("{0}: No such file or directory")]
    NotFound(String),

    #[error("{0}: File exists")]
    AlreadyExists(String),

    #[error("{0}: Not a directory")]
    NotADirectory(String),

    #[error("{0}: Is a directory")]
    IsADirectory(String),

    #[error("{0}: Directory not empty")]
    NotEmpty(String),

    #[error("{0}: Operation not permitted")]
    RootProtected(String),

    #[error("{0}: Invalid argument")]
    InvalidArgument(String),

    #[error("{path}: {reason}")]
    InvalidOperation { path: String, reason: String },
}

impl VfsError {
    /// The path this error refers to.
    pub fn path(&self) -> &str {
        match self {
            VfsError::NotFound(p)
            | VfsError::AlreadyExists(p)
            | VfsError::NotADirectory(p)
            | VfsError::IsADirectory(p)
            | VfsError::NotEmpty(p)
            | VfsError::RootProtected(p)
            | VfsError::InvalidArgument(p) => p,
            VfsError::InvalidOperation { path, .. } => path,
        }
    }

    /// The human-readable reason, without the path.
    pub fn reason(&self) -> &str {
        match self {
            VfsError::NotFound(_) => "No such file or directory",
            VfsError::AlreadyExists(_) => "File exists",
            VfsError::NotADirectory(_) => "Not a directory",
            VfsError::IsADirectory(_) => "Is a directory",
            VfsError::NotEmpty(_) => "Directory not empty",
            VfsError::RootProtected(_) => "Operation not permitted",
            VfsError::InvalidArgument(_) => "Invalid argument",
            VfsError::InvalidOperation { reason, .. } => reason,
        }
    }

    pub(crate) fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        VfsError::InvalidOperation {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_reads_like_strerror() {
        let err = VfsError::NotFound("/tmp/missing".into());
        assert_eq!(err.to_string(), "/tmp/missing: No such file or directory");
        assert_eq!(err.reason(), "No such file or directory");
        assert_eq!(err.path(), "/tmp/missing");
    }

    #[test]
    fn invalid_operation_carries_reason() {
        let err = VfsError::invalid("/a", "cannot move a directory into itself");
        assert_eq!(err.to_string(), "/a: cannot move a directory into itself");
    }
}
