//! Connection lifecycle service
//!
//! Connects to a backend and loads its schema, deletes the connection, and
//! hands off to the agent.

use datascout_confirm::{ModalConfig, Severity};
use datascout_core::{
    Backend, ConnectDetails, ConnectionInfo, RemoteError, RemoteRequest, SchemaResponse,
};

use crate::context::ClientContext;
use crate::error::{ServiceError, ServiceResult};
use crate::notify::Toast;

const UNKNOWN_CONNECT_ERROR: &str = "An unknown error occurred while connecting to the database.";

/// Service for connection lifecycle management
///
/// The only place that replaces the cached table collection.
#[derive(Clone)]
pub struct ConnectionService {
    ctx: ClientContext,
}

impl ConnectionService {
    pub fn new(ctx: ClientContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    pub fn connection(&self) -> Option<ConnectionInfo> {
        self.ctx.cache.connection()
    }

    /// Connect to a database and load its schema
    ///
    /// On failure a "Connection Failed" dialog carrying the backend's detail
    /// message is queued and the error is returned.
    #[tracing::instrument(skip_all, fields(backend = %backend, db_name = %details.display_name()))]
    pub async fn connect(
        &self,
        backend: Backend,
        details: ConnectDetails,
    ) -> ServiceResult<ConnectionInfo> {
        let db_name = details.display_name();
        tracing::info!("connecting to database");

        let request = RemoteRequest::Connect { backend, details };
        let result = tokio::select! {
            _ = self.ctx.shutdown.cancelled() => return Err(ServiceError::Cancelled),
            result = self.ctx.remote.call(request) => result,
        };
        let value = result.map_err(|e| self.connection_failed(e))?;

        let response: SchemaResponse = serde_json::from_value(value)?;
        tracing::info!(
            connection_id = response.connection_id,
            table_count = response.tables.len(),
            "connection established"
        );

        self.ctx.saves.reset();
        self.ctx.cache.set_schema(
            response.tables,
            backend.as_str(),
            &db_name,
            response.connection_id,
        );

        Ok(ConnectionInfo {
            db_type: backend.as_str().to_string(),
            db_name,
            connection_id: response.connection_id,
        })
    }

    /// Forget the active connection locally without telling the backend
    pub fn disconnect(&self) {
        tracing::info!("disconnecting");
        self.ctx.reset();
    }

    /// Delete the connection after the user confirms
    ///
    /// Returns `Ok(false)` when the user declined. Local state survives a
    /// failed delete.
    #[tracing::instrument(skip(self))]
    pub async fn delete_connection(&self) -> ServiceResult<bool> {
        let confirmed = self
            .ctx
            .confirmations
            .request(
                ModalConfig::new(
                    "Delete Connection",
                    "Are you sure you want to delete this connection? This will reset the database and clear all saved context.",
                )
                .with_confirm_text("Delete")
                .with_severity(Severity::Danger),
            )
            .await;
        if !confirmed {
            tracing::debug!("delete declined");
            return Ok(false);
        }

        let result = tokio::select! {
            _ = self.ctx.shutdown.cancelled() => return Err(ServiceError::Cancelled),
            result = self.ctx.remote.call(RemoteRequest::DeleteConnection) => result,
        };

        match result {
            Ok(_) => {
                self.ctx.reset();
                self.ctx
                    .notifier
                    .notify(Toast::success("Connection deleted successfully"));
                Ok(true)
            }
            Err(source) => {
                tracing::error!(error = %source, "failed to delete connection");
                self.ctx
                    .notifier
                    .notify(Toast::error("Failed to delete connection"));
                Err(ServiceError::Persistence {
                    what: "connection deletion".to_string(),
                    source,
                })
            }
        }
    }

    /// Ask before handing the session to the query agent
    #[tracing::instrument(skip(self))]
    pub async fn connect_to_agent(&self) -> bool {
        let confirmed = self
            .ctx
            .confirmations
            .request(
                ModalConfig::new(
                    "Connect to Agent",
                    "Are you sure you want to connect to the agent? This will initiate a secure session.",
                )
                .with_confirm_text("Connect")
                .with_severity(Severity::Info),
            )
            .await;
        if confirmed {
            tracing::info!("connecting to agent");
            self.ctx.notifier.notify(Toast::info("Connecting to agent..."));
        }
        confirmed
    }

    fn connection_failed(&self, error: RemoteError) -> ServiceError {
        tracing::error!(error = %error, status = ?error.status, "connection failed");
        let message = if error.detail.trim().is_empty() {
            UNKNOWN_CONNECT_ERROR.to_string()
        } else {
            error.detail.clone()
        };
        self.ctx.confirmations.alert(
            ModalConfig::new("Connection Failed", message)
                .with_confirm_text("OK")
                .with_cancel_text("Close")
                .with_severity(Severity::Danger),
        );
        ServiceError::ConnectionFailed(error)
    }
}
