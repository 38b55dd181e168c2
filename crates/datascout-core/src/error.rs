//! Error types for DataScout

use thiserror::Error;

/// Failure reported by the transport for a single remote call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{detail}")]
pub struct RemoteError {
    /// HTTP-like status code, when the transport has one
    pub status: Option<u16>,
    /// Human readable detail, usually taken from the backend's error body
    pub detail: String,
}

impl RemoteError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            status: None,
            detail: detail.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Core error type for schema state operations
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Stale reference: {0}")]
    StaleReference(String),

    #[error("Column {table}.{column} is locked")]
    ColumnLocked { table: String, column: String },

    #[error("No active connection")]
    NotConnected,
}

impl ScoutError {
    pub fn stale_table(table: &str) -> Self {
        Self::StaleReference(format!("table '{}'", table))
    }

    pub fn stale_column(table: &str, column: &str) -> Self {
        Self::StaleReference(format!("column '{}.{}'", table, column))
    }

    pub fn is_stale_reference(&self) -> bool {
        matches!(self, Self::StaleReference(_))
    }
}

/// Result type alias for DataScout core operations
pub type Result<T> = std::result::Result<T, ScoutError>;
