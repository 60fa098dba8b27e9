use std::fmt::Display;
use std::io;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Security,
    DirectoryCreate,
    MarkdownWrite,
    AssetWrite,
    Permission,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation",
            ErrorKind::Security => "Security",
            ErrorKind::DirectoryCreate => "DirectoryCreate",
            ErrorKind::MarkdownWrite => "MarkdownWrite",
            ErrorKind::AssetWrite => "AssetWrite",
            ErrorKind::Permission => "Permission",
        }
    }
}

/// Failure of a single save. `field` carries the offending title or asset
/// filename when one can be named.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct VaultError {
    pub kind: ErrorKind,
    pub message: String,
    pub field: Option<String>,
    #[source]
    source: Option<io::Error>,
}

pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), field: None, source: None }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn security(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Security, message)
    }

    /// Wraps a filesystem error. Access denials are reported as
    /// [`ErrorKind::Permission`] whatever step they happened in.
    pub fn io(kind: ErrorKind, context: impl Display, err: io::Error) -> Self {
        let kind = if err.kind() == io::ErrorKind::PermissionDenied { ErrorKind::Permission } else { kind };
        Self { kind, message: format!("{context}: {err}"), field: None, source: Some(err) }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn is_security(&self) -> bool {
        self.kind == ErrorKind::Security
    }
}
