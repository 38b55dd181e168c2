//! Transport seam for backend requests

use async_trait::async_trait;
use serde_json::{Value, json};
use std::fmt::Write;
use std::sync::Arc;

use crate::{Backend, ConnectDetails, RemoteError};

/// Request verbs a transport needs to know about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// A backend endpoint together with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRequest {
    Connect {
        backend: Backend,
        details: ConnectDetails,
    },
    FetchColumns {
        connection_id: i64,
        table: String,
    },
    SaveColumnDescription {
        connection_id: i64,
        table: String,
        column: String,
        description: String,
    },
    SaveTableContext {
        connection_id: i64,
        table: String,
        context: String,
    },
    SaveGlobalContext {
        connection_id: i64,
        context: String,
    },
    SetColumnLock {
        connection_id: i64,
        table: String,
        column: String,
        locked: bool,
    },
    DeleteConnection,
}

impl RemoteRequest {
    /// Short, stable name used in logs
    pub fn endpoint_name(&self) -> &'static str {
        match self {
            RemoteRequest::Connect { .. } => "connect",
            RemoteRequest::FetchColumns { .. } => "fetch_columns",
            RemoteRequest::SaveColumnDescription { .. } => "save_column_description",
            RemoteRequest::SaveTableContext { .. } => "save_table_context",
            RemoteRequest::SaveGlobalContext { .. } => "save_global_context",
            RemoteRequest::SetColumnLock { .. } => "set_column_lock",
            RemoteRequest::DeleteConnection => "delete_connection",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            RemoteRequest::Connect { .. } => Method::Post,
            RemoteRequest::FetchColumns { .. } => Method::Get,
            RemoteRequest::SaveColumnDescription { .. }
            | RemoteRequest::SaveTableContext { .. }
            | RemoteRequest::SaveGlobalContext { .. }
            | RemoteRequest::SetColumnLock { .. } => Method::Put,
            RemoteRequest::DeleteConnection => Method::Delete,
        }
    }

    /// Path relative to the API base URL
    ///
    /// Table and column names are percent-encoded, so a `/` or space in a
    /// name stays inside its own segment.
    pub fn path(&self) -> String {
        match self {
            RemoteRequest::Connect { backend, .. } => format!("/connect/{}", backend),
            RemoteRequest::FetchColumns {
                connection_id,
                table,
            } => format!(
                "/schema/{}/table/{}/columns",
                connection_id,
                encode_segment(table)
            ),
            RemoteRequest::SaveColumnDescription {
                connection_id,
                table,
                column,
                ..
            } => format!(
                "/schema/{}/column/{}/{}/description",
                connection_id,
                encode_segment(table),
                encode_segment(column)
            ),
            RemoteRequest::SaveTableContext {
                connection_id,
                table,
                ..
            } => format!(
                "/schema/{}/table/{}/context",
                connection_id,
                encode_segment(table)
            ),
            RemoteRequest::SaveGlobalContext { connection_id, .. } => {
                format!("/schema/{}/global/context", connection_id)
            }
            RemoteRequest::SetColumnLock {
                connection_id,
                table,
                column,
                ..
            } => format!(
                "/schema/{}/column/{}/{}/lock",
                connection_id,
                encode_segment(table),
                encode_segment(column)
            ),
            RemoteRequest::DeleteConnection => "/connection".to_string(),
        }
    }

    /// JSON body, if the endpoint takes one
    pub fn body(&self) -> Option<Value> {
        match self {
            RemoteRequest::Connect { details, .. } => serde_json::to_value(details).ok(),
            RemoteRequest::SaveColumnDescription { description, .. } => {
                Some(json!({ "description": description }))
            }
            RemoteRequest::SaveTableContext { context, .. }
            | RemoteRequest::SaveGlobalContext { context, .. } => {
                Some(json!({ "context": context }))
            }
            RemoteRequest::SetColumnLock { locked, .. } => Some(json!({ "is_locked": locked })),
            RemoteRequest::FetchColumns { .. } | RemoteRequest::DeleteConnection => None,
        }
    }
}

/// Percent-encode a path segment, keeping only unreserved characters
fn encode_segment(segment: &str) -> String {
    // "." and ".." would be collapsed as dot-segments by the HTTP client
    if segment == "." || segment == ".." {
        return segment.replace('.', "%2E");
    }
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => {
                let _ = write!(encoded, "%{:02X}", byte);
            }
        }
    }
    encoded
}

/// Performs one backend request and yields exactly one success or failure
#[async_trait]
pub trait RemoteCall: Send + Sync + 'static {
    async fn call(&self, request: RemoteRequest) -> Result<Value, RemoteError>;
}

#[async_trait]
impl<T: RemoteCall + ?Sized> RemoteCall for Arc<T> {
    async fn call(&self, request: RemoteRequest) -> Result<Value, RemoteError> {
        (**self).call(request).await
    }
}
