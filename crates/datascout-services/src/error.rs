use datascout_core::{RemoteError, ScoutError};
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level errors with user-friendly messages
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] RemoteError),

    #[error("Failed to save {what}: {source}")]
    Persistence { what: String, source: RemoteError },

    #[error("Failed to load columns for {table}: {source}")]
    ColumnLoadFailed { table: String, source: RemoteError },

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("No async runtime available for background work")]
    NoRuntime,

    #[error(transparent)]
    Schema(#[from] ScoutError),
}

impl ServiceError {
    pub fn is_stale_reference(&self) -> bool {
        matches!(self, Self::Schema(e) if e.is_stale_reference())
    }

    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::Schema(ScoutError::NotConnected))
    }

    /// The transport failure behind this error, if there is one
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::ConnectionFailed(e) => Some(e),
            Self::Persistence { source, .. } | Self::ColumnLoadFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
