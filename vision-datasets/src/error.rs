//! Failure kinds reported by dataset loaders and transforms.
//!
//! Loaders return [anyhow::Result] with file context attached. The kind of a
//! failure is recovered with `error.downcast_ref::<DatasetError>()`.

use crate::common::*;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("file not found: '{}'", .0.display())]
    NotFound(PathBuf),
    #[error("failed to parse '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("lookup failed: {0}")]
    Lookup(String),
    #[error("index {index} is out of range for dataset of length {len}")]
    Index { index: usize, len: usize },
}

impl DatasetError {
    pub fn parse(path: impl AsRef<Path>, message: impl Display) -> Self {
        Self::Parse {
            path: path.as_ref().to_owned(),
            message: message.to_string(),
        }
    }

    pub fn invalid_argument(message: impl Display) -> Self {
        Self::InvalidArgument(message.to_string())
    }
}

impl From<LabelSetError> for DatasetError {
    fn from(err: LabelSetError) -> Self {
        match err {
            LabelSetError::Unknown(_) => Self::Lookup(err.to_string()),
            LabelSetError::Duplicated(_) | LabelSetError::Empty => {
                Self::InvalidArgument(err.to_string())
            }
        }
    }
}

/// Recover the failure kind of an error returned by this crate.
pub fn error_kind(error: &Error) -> Option<&DatasetError> {
    error.downcast_ref::<DatasetError>()
}
