//! Shared client state handed to every service

use datascout_confirm::ConfirmationBridge;
use datascout_core::{RemoteCall, ScoutError};
use datascout_schema::{SaveStateTracker, SchemaCache, SharedSchemaCache};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::error::{ServiceError, ServiceResult};
use crate::notify::Notifier;
use crate::settings::ScoutSettings;

/// Everything the services share for one client session
///
/// Cloning is cheap; all clones see the same cache, tracker and dialog queue.
#[derive(Clone)]
pub struct ClientContext {
    pub(crate) cache: SharedSchemaCache,
    pub(crate) saves: SaveStateTracker,
    pub(crate) confirmations: Arc<ConfirmationBridge>,
    pub(crate) remote: Arc<dyn RemoteCall>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) shutdown: CancellationToken,
    runtime: Option<Handle>,
}

impl ClientContext {
    pub fn new(
        remote: Arc<dyn RemoteCall>,
        notifier: Arc<dyn Notifier>,
        settings: &ScoutSettings,
    ) -> Self {
        Self {
            cache: Arc::new(SchemaCache::new(settings.annotation_ingest)),
            saves: SaveStateTracker::new(settings.revert_delay()),
            confirmations: Arc::new(ConfirmationBridge::new()),
            remote,
            notifier,
            shutdown: CancellationToken::new(),
            runtime: Handle::try_current().ok(),
        }
    }

    /// Spawn background work on `runtime`
    ///
    /// Needed when the context is built outside a tokio runtime but commands
    /// are issued from a thread that has none either, such as a UI thread.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    pub fn saves(&self) -> &SaveStateTracker {
        &self.saves
    }

    /// The dialog queue the display layer subscribes to and answers
    pub fn confirmations(&self) -> &ConfirmationBridge {
        &self.confirmations
    }

    pub(crate) fn connection_id(&self) -> ServiceResult<i64> {
        Ok(self.cache.connection_id().ok_or(ScoutError::NotConnected)?)
    }

    /// Runtime for background work: the current one, else the one captured
    /// when the context was built
    pub(crate) fn runtime(&self) -> ServiceResult<Handle> {
        Handle::try_current()
            .ok()
            .or_else(|| self.runtime.clone())
            .ok_or(ServiceError::NoRuntime)
    }

    /// Forget the connection, its schema and every save state
    pub fn reset(&self) {
        self.cache.reset();
        self.saves.reset();
    }

    /// Stop background work and answer every open dialog with "no"
    ///
    /// Results of calls still in flight are discarded. The context cannot be
    /// restarted afterwards.
    pub fn shutdown(&self) {
        tracing::info!("shutting down client context");
        self.shutdown.cancel();
        self.confirmations.cancel_all();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
