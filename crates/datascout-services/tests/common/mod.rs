//! Common test utilities and mocks

#![allow(dead_code)]

use async_trait::async_trait;
use datascout_confirm::ModalConfig;
use datascout_core::{ColumnRecord, RemoteCall, RemoteError, RemoteRequest, TableRecord};
use datascout_services::{
    AnnotationService, ClientContext, ConnectionService, Notifier, ScoutSettings, Toast,
    ToastLevel,
};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Scripted reply for one call
#[derive(Debug, Clone)]
pub struct Reply {
    pub delay: Duration,
    pub result: Result<Value, RemoteError>,
}

impl Reply {
    pub fn ok(value: Value) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(value),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(RemoteError::new(detail).with_status(500)),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Mock transport for testing service logic without a backend.
///
/// Replies are scripted per endpoint name and consumed in call order; an
/// endpoint with nothing scripted answers `{}`.
#[derive(Default)]
pub struct MockRemote {
    replies: parking_lot::Mutex<HashMap<&'static str, VecDeque<Reply>>>,
    /// Log of all requests issued, in the order they reached the transport
    pub request_log: parking_lot::Mutex<Vec<RemoteRequest>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, endpoint: &'static str, reply: Reply) {
        self.replies
            .lock()
            .entry(endpoint)
            .or_default()
            .push_back(reply);
    }

    pub fn request_log(&self) -> Vec<RemoteRequest> {
        self.request_log.lock().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<RemoteRequest> {
        self.request_log()
            .into_iter()
            .filter(|r| r.endpoint_name() == endpoint)
            .collect()
    }
}

#[async_trait]
impl RemoteCall for MockRemote {
    async fn call(&self, request: RemoteRequest) -> Result<Value, RemoteError> {
        let endpoint = request.endpoint_name();
        self.request_log.lock().push(request);
        let reply = self
            .replies
            .lock()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Reply::ok(json!({})));

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.result
    }
}

/// Notifier that keeps every toast for assertions
#[derive(Default)]
pub struct RecordingNotifier {
    pub toasts: parking_lot::Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(ToastLevel, String)> {
        self.toasts
            .lock()
            .iter()
            .map(|t| (t.level, t.message.clone()))
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().push(toast);
    }
}

pub struct Harness {
    pub ctx: ClientContext,
    pub remote: Arc<MockRemote>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(ScoutSettings::default())
    }

    pub fn with_settings(settings: ScoutSettings) -> Self {
        let remote = Arc::new(MockRemote::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let ctx = ClientContext::new(remote.clone(), notifier.clone(), &settings);
        Self {
            ctx,
            remote,
            notifier,
        }
    }

    pub fn annotations(&self) -> AnnotationService {
        AnnotationService::new(self.ctx.clone())
    }

    pub fn connections(&self) -> ConnectionService {
        ConnectionService::new(self.ctx.clone())
    }

    /// Populate the cache as a successful postgres connect would
    /// Spawn background work on `runtime` even when called from outside it
    pub fn on_runtime(mut self, runtime: tokio::runtime::Handle) -> Self {
        self.ctx = self.ctx.with_runtime(runtime);
        self
    }

    pub fn connected(self) -> Self {
        self.ctx
            .cache()
            .set_schema(sample_tables(), "postgresql", "mydb", 7);
        self
    }
}

/// `users` arrives with its columns, `orders` has to be loaded lazily
pub fn sample_tables() -> Vec<TableRecord> {
    vec![
        TableRecord::new("users").with_columns(vec![
            ColumnRecord::new("id", "int"),
            ColumnRecord::new("email", "text"),
        ]),
        TableRecord::new("orders"),
    ]
}

pub fn connect_response() -> Value {
    json!({
        "connection_id": 7,
        "tables": [
            { "name": "users", "columns": [{ "name": "id", "type": "int" }] },
            { "name": "orders", "table_context": "One row per checkout" }
        ]
    })
}

pub fn order_columns() -> Value {
    json!([
        { "name": "id", "type": "int" },
        { "name": "user_id", "type": "int" },
        { "name": "total", "type": "numeric" }
    ])
}

/// Let spawned tasks and timers run after moving the paused clock
pub async fn advance(duration: Duration) {
    tokio::time::advance(duration).await;
    tokio::task::yield_now().await;
}

/// Wait for the next dialog, answer it and return what it showed
pub async fn answer_dialog(ctx: &ClientContext, result: bool) -> ModalConfig {
    let mut dialogs = ctx.confirmations().subscribe();
    // The borrow has to end before deciding, which republishes the slot.
    let active = dialogs
        .wait_for(|modal| modal.is_some())
        .await
        .expect("bridge dropped")
        .clone()
        .expect("dialog shown");
    assert!(ctx.confirmations().decide_for(active.id, result));
    active.config
}
