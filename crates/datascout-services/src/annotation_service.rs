//! Annotation editing service
//!
//! Drives the schema cache and save tracker for user edits and persists them
//! through the transport.

use datascout_core::{Column, ColumnRecord, RemoteError, RemoteRequest, Table};
use datascout_schema::{Expansion, OptimisticToggle, SaveKey, SaveOutcome, SaveState};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::context::ClientContext;
use crate::error::{ServiceError, ServiceResult};
use crate::notify::Toast;

/// One FIFO lane per save key
///
/// tokio's mutex wakes waiters in the order they started waiting, so calls for
/// the same key reach the transport in the order their saves began.
#[derive(Default)]
struct SaveLanes {
    lanes: Mutex<HashMap<SaveKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl SaveLanes {
    fn lane(&self, key: &SaveKey) -> Arc<tokio::sync::Mutex<()>> {
        self.lanes.lock().entry(key.clone()).or_default().clone()
    }

    /// Hand a lane back, dropping it from the map once nobody else holds it
    fn release(&self, key: &SaveKey, lane: Arc<tokio::sync::Mutex<()>>) {
        let mut lanes = self.lanes.lock();
        // One reference in the map, one here: no save is queued on this key.
        if Arc::strong_count(&lane) == 2 {
            lanes.remove(key);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lanes.lock().len()
    }
}

/// Service for editing table context, column descriptions and lock flags
///
/// Edits land in the cache first; persistence follows and only moves the
/// save state (or rolls back a lock toggle) when it fails.
#[derive(Clone)]
pub struct AnnotationService {
    ctx: ClientContext,
    lanes: Arc<SaveLanes>,
}

impl AnnotationService {
    pub fn new(ctx: ClientContext) -> Self {
        Self {
            ctx,
            lanes: Arc::new(SaveLanes::default()),
        }
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    // ========== Reads ==========

    pub fn tables(&self) -> Vec<Table> {
        self.ctx.cache.list_tables()
    }

    pub fn columns(&self, table: &str) -> Vec<Column> {
        self.ctx.cache.get_columns(table)
    }

    pub fn is_loading_columns(&self, table: &str) -> bool {
        self.ctx.cache.is_columns_loading(table)
    }

    pub fn save_state(&self, key: &SaveKey) -> SaveState {
        self.ctx.saves.state_of(key)
    }

    pub fn column_save_state(&self, table: &str, column: &str) -> SaveState {
        self.save_state(&SaveKey::column(table, column))
    }

    pub fn table_save_state(&self, table: &str) -> SaveState {
        self.save_state(&SaveKey::table(table))
    }

    pub fn global_save_state(&self) -> SaveState {
        self.save_state(&SaveKey::GlobalContext)
    }

    // ========== Tables ==========

    /// Expand or collapse a table, loading its columns the first time it opens
    #[tracing::instrument(skip_all, fields(table = %table))]
    pub async fn expand_table(&self, table: &str) -> ServiceResult<Expansion> {
        let expansion = self.ctx.cache.toggle_expanded(table)?;
        if expansion.needs_columns {
            self.load_columns(table).await?;
        }
        Ok(expansion)
    }

    /// Fetch and cache the columns of a table
    ///
    /// Does nothing when a load for the table is already running. A response
    /// that arrives after the connection changed is dropped.
    #[tracing::instrument(skip_all, fields(table = %table))]
    pub async fn load_columns(&self, table: &str) -> ServiceResult<()> {
        let connection_id = self.ctx.connection_id()?;
        if !self.ctx.cache.mark_columns_loading(table)? {
            return Ok(());
        }

        let request = RemoteRequest::FetchColumns {
            connection_id,
            table: table.to_string(),
        };
        let result = tokio::select! {
            _ = self.ctx.shutdown.cancelled() => {
                self.ctx.cache.clear_columns_loading(table);
                return Err(ServiceError::Cancelled);
            }
            result = self.ctx.remote.call(request) => result,
        };

        if self.ctx.cache.connection_id() != Some(connection_id) {
            tracing::debug!("connection changed while loading columns, dropping result");
            return Ok(());
        }

        let columns = result
            .map_err(|source| ServiceError::ColumnLoadFailed {
                table: table.to_string(),
                source,
            })
            .and_then(parse_columns);

        match columns {
            Ok(columns) => {
                tracing::debug!(column_count = columns.len(), "columns loaded");
                self.ctx.cache.set_columns(table, columns)?;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load columns");
                self.ctx.cache.clear_columns_loading(table);
                self.ctx
                    .notifier
                    .notify(Toast::error(format!("Failed to load columns for {}", table)));
                Err(e)
            }
        }
    }

    // ========== Annotations ==========

    /// Store and persist a column description
    ///
    /// Refused with `ColumnLocked` while the column is locked; nothing is sent.
    #[tracing::instrument(skip_all, fields(table = %table, column = %column))]
    pub async fn save_column_description(
        &self,
        table: &str,
        column: &str,
        description: &str,
    ) -> ServiceResult<()> {
        let connection_id = self.ctx.connection_id()?;
        self.ctx
            .cache
            .set_column_description(table, column, description)?;

        let request = RemoteRequest::SaveColumnDescription {
            connection_id,
            table: table.to_string(),
            column: column.to_string(),
            description: description.to_string(),
        };
        self.persist(SaveKey::column(table, column), request, "description")
            .await
    }

    #[tracing::instrument(skip_all, fields(table = %table))]
    pub async fn save_table_context(&self, table: &str, context: &str) -> ServiceResult<()> {
        let connection_id = self.ctx.connection_id()?;
        self.ctx.cache.set_table_context(table, context)?;

        let request = RemoteRequest::SaveTableContext {
            connection_id,
            table: table.to_string(),
            context: context.to_string(),
        };
        self.persist(SaveKey::table(table), request, "table context")
            .await
    }

    #[tracing::instrument(skip_all)]
    pub async fn save_global_context(&self, context: &str) -> ServiceResult<()> {
        let connection_id = self.ctx.connection_id()?;
        self.ctx.cache.set_global_context(context);

        let request = RemoteRequest::SaveGlobalContext {
            connection_id,
            context: context.to_string(),
        };
        self.persist(SaveKey::GlobalContext, request, "global context")
            .await
    }

    /// Flip a column's lock flag now and persist it in the background
    ///
    /// The returned handle finishes once the call settled; on failure the
    /// flip is rolled back and the user is notified. Without a runtime to
    /// persist on, nothing is flipped and `NoRuntime` is returned.
    #[tracing::instrument(skip_all, fields(table = %table, column = %column))]
    pub fn toggle_lock(&self, table: &str, column: &str) -> ServiceResult<JoinHandle<()>> {
        let connection_id = self.ctx.connection_id()?;
        let runtime = self.ctx.runtime().inspect_err(|_| {
            tracing::warn!("no runtime to persist the lock on, leaving it unchanged");
        })?;
        let toggle = OptimisticToggle::apply(&self.ctx.cache, table, column)?;
        let request = RemoteRequest::SetColumnLock {
            connection_id,
            table: table.to_string(),
            column: column.to_string(),
            locked: toggle.applied(),
        };

        let ctx = self.ctx.clone();
        let task = async move {
            let result = tokio::select! {
                _ = ctx.shutdown.cancelled() => {
                    tracing::debug!("lock toggle cancelled");
                    return;
                }
                result = ctx.remote.call(request) => result,
            };
            let Err(e) = result else {
                tracing::debug!(locked = toggle.applied(), "lock persisted");
                return;
            };

            tracing::warn!(error = %e, "failed to persist lock, rolling back");
            if ctx.cache.connection_id() == Some(connection_id) {
                if let Err(stale) = toggle.rollback(&ctx.cache) {
                    tracing::debug!(error = %stale, "column gone, nothing to roll back");
                }
            }
            ctx.notifier.notify(Toast::error("Failed to toggle lock"));
        };
        Ok(runtime.spawn(task.in_current_span()))
    }

    /// Save cycle shared by all annotation kinds
    async fn persist(&self, key: SaveKey, request: RemoteRequest, what: &str) -> ServiceResult<()> {
        let ticket = self.ctx.saves.begin_save(&key);
        let lane = self.lanes.lane(&key);
        let result: Option<Result<Value, RemoteError>> = {
            let _turn = lane.lock().await;
            tokio::select! {
                _ = self.ctx.shutdown.cancelled() => None,
                result = self.ctx.remote.call(request) => Some(result),
            }
        };
        self.lanes.release(&key, lane);

        let Some(result) = result else {
            return Err(ServiceError::Cancelled);
        };
        match result {
            Ok(_) => {
                self.ctx.saves.settle(&ticket, SaveOutcome::Saved);
                Ok(())
            }
            Err(source) => {
                tracing::warn!(key = %key, error = %source, "save failed");
                self.ctx.saves.settle(&ticket, SaveOutcome::Failed);
                self.ctx
                    .notifier
                    .notify(Toast::error(format!("Failed to save {}", what)));
                Err(ServiceError::Persistence {
                    what: what.to_string(),
                    source,
                })
            }
        }
    }
}

fn parse_columns(value: Value) -> ServiceResult<Vec<ColumnRecord>> {
    Ok(serde_json::from_value(value)?)
}
