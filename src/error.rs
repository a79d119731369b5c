//! Error types shared by the review controller and asset sources

use crate::domain::AssetId;
use thiserror::Error;

/// Failure reported by a store when a bulk delete did not commit.
///
/// `failed` lists the identifiers the store could not remove, when it reports them.
/// An empty list means the store gave no per-asset detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("delete failed: {message}")]
pub struct DeleteError {
    pub message: String,
    pub failed: Vec<AssetId>,
}

impl DeleteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            failed: Vec::new(),
        }
    }

    pub fn with_failed(message: impl Into<String>, failed: Vec<AssetId>) -> Self {
        Self {
            message: message.into(),
            failed,
        }
    }
}

#[derive(Debug, Error)]
pub enum PhotoTinderError {
    /// The user refused library access; terminal for the session
    #[error("photo library access denied")]
    AccessDenied,

    #[error("photo store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("asset unavailable: {0}")]
    AssetUnavailable(AssetId),

    #[error("failed to decode {id}: {reason}")]
    DecodeFailed { id: AssetId, reason: String },

    #[error(transparent)]
    Delete(#[from] DeleteError),

    #[error("a delete is already in progress")]
    DeleteInProgress,

    /// Only the front of the queue can be resolved
    #[error("index {index} is not actionable (queue length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("review controller has stopped")]
    ControllerStopped,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PhotoTinderError {
    /// Per-asset failures are dropped from a fetch cycle instead of surfacing
    pub fn is_per_asset(&self) -> bool {
        matches!(
            self,
            PhotoTinderError::AssetUnavailable(_) | PhotoTinderError::DecodeFailed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PhotoTinderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_error_display() {
        let err = DeleteError::with_failed("store busy", vec![AssetId::new("a")]);
        assert_eq!(err.to_string(), "delete failed: store busy");
        assert_eq!(err.failed, vec![AssetId::new("a")]);
    }

    #[test]
    fn test_delete_error_converts() {
        let err: PhotoTinderError = DeleteError::new("nope").into();
        assert!(matches!(err, PhotoTinderError::Delete(_)));
        assert_eq!(err.to_string(), "delete failed: nope");
    }

    #[test]
    fn test_per_asset_classification() {
        assert!(PhotoTinderError::AssetUnavailable(AssetId::new("x")).is_per_asset());
        assert!(PhotoTinderError::DecodeFailed {
            id: AssetId::new("x"),
            reason: "bad header".to_string(),
        }
        .is_per_asset());
        assert!(!PhotoTinderError::StoreUnavailable("down".to_string()).is_per_asset());
        assert!(!PhotoTinderError::AccessDenied.is_per_asset());
    }
}
