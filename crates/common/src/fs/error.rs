use object_store::BlobStoreError;

use crate::database::DatabaseSetupError;
use crate::model::NodeType;

/// Coarse classification of an [`FsError`], for callers that map failures
/// onto their own vocabulary (status codes, exit codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidArgument,
    TypeMismatch,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("path not found: {0}")]
    NotFound(String),
    #[error("path already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("expected a {expected} at {path}")]
    TypeMismatch { path: String, expected: NodeType },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("database setup error: {0}")]
    Setup(#[from] DatabaseSetupError),
    #[error("blob store error: {0}")]
    BlobStore(#[from] BlobStoreError),
}

impl FsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NotFound(_) => ErrorKind::NotFound,
            FsError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            FsError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            FsError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            FsError::BlobStore(BlobStoreError::NotFound(_)) => ErrorKind::NotFound,
            FsError::Database(_) | FsError::Setup(_) | FsError::BlobStore(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub(crate) fn type_mismatch(path: impl Into<String>, expected: NodeType) -> Self {
        FsError::TypeMismatch {
            path: path.into(),
            expected,
        }
    }

    pub(crate) fn move_into_self(from: &str, to: &str) -> Self {
        FsError::InvalidArgument(format!(
            "cannot place '{}' at '{}': destination is inside source",
            from, to
        ))
    }
}
