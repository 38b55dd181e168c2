//! Request queue and decision routing

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{oneshot, watch};

use crate::{ActiveModal, ModalConfig};

/// Identity of one confirmation request, increasing in submission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The user's answer to one request
///
/// Resolves exactly once. A request that can no longer be answered (bridge
/// dropped, `cancel_all`) resolves to `false`.
#[must_use = "a confirmation does nothing unless awaited"]
pub struct Confirmation {
    id: RequestId,
    rx: oneshot::Receiver<bool>,
}

impl Confirmation {
    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl Future for Confirmation {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        Pin::new(&mut self.rx).poll(cx).map(|result| result.unwrap_or(false))
    }
}

struct Waiting {
    id: RequestId,
    config: ModalConfig,
    /// `None` for alerts, which nobody awaits
    resolver: Option<oneshot::Sender<bool>>,
}

impl Waiting {
    fn is_abandoned(&self) -> bool {
        self.resolver.as_ref().is_some_and(|r| r.is_closed())
    }

    fn resolve(self, result: bool) {
        if let Some(resolver) = self.resolver {
            if resolver.send(result).is_err() {
                tracing::debug!(request = %self.id, "confirmation was abandoned by its caller");
            }
        }
    }

    fn active(&self) -> ActiveModal {
        ActiveModal {
            id: self.id,
            config: self.config.clone(),
        }
    }
}

#[derive(Default)]
struct BridgeState {
    /// Front is the request on screen; the rest wait in submission order
    queue: VecDeque<Waiting>,
    next_id: u64,
}

/// Serves confirmation requests one at a time, in submission order
///
/// `idle → pending → resolved → idle`: a request is published on the modal
/// slot when it reaches the front of the queue, and `decide` settles it,
/// clears the slot and publishes the next one.
pub struct ConfirmationBridge {
    state: Mutex<BridgeState>,
    modal: watch::Sender<Option<ActiveModal>>,
}

impl ConfirmationBridge {
    pub fn new() -> Self {
        let (modal, _) = watch::channel(None);
        Self {
            state: Mutex::new(BridgeState::default()),
            modal,
        }
    }

    /// Observe the dialog that should be on screen
    ///
    /// The slot only keeps the latest value; a subscriber that falls behind
    /// sees the current dialog, not every intermediate `None`.
    pub fn subscribe(&self) -> watch::Receiver<Option<ActiveModal>> {
        self.modal.subscribe()
    }

    pub fn active(&self) -> Option<ActiveModal> {
        self.modal.borrow().clone()
    }

    /// Requests not yet decided, the active one included
    pub fn pending_count(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Ask the user to confirm something
    pub fn request(&self, config: ModalConfig) -> Confirmation {
        let (resolver, rx) = oneshot::channel();
        let id = self.enqueue(config, Some(resolver));
        Confirmation { id, rx }
    }

    /// Show a dialog whose answer nobody waits for
    ///
    /// Alerts queue like any other request and are dismissed by `decide`.
    pub fn alert(&self, config: ModalConfig) -> RequestId {
        self.enqueue(config, None)
    }

    fn enqueue(&self, config: ModalConfig, resolver: Option<oneshot::Sender<bool>>) -> RequestId {
        let mut state = self.state.lock();
        let id = RequestId(state.next_id);
        state.next_id += 1;

        let waiting = Waiting {
            id,
            config,
            resolver,
        };
        if state.queue.is_empty() {
            tracing::debug!(request = %id, title = %waiting.config.title, "showing confirmation");
            self.modal.send_replace(Some(waiting.active()));
        } else {
            tracing::debug!(
                request = %id,
                title = %waiting.config.title,
                position = state.queue.len(),
                "confirmation queued"
            );
        }
        state.queue.push_back(waiting);
        id
    }

    /// Settle the oldest outstanding request
    ///
    /// Returns false when nothing is pending; such a decision is a spurious
    /// display event and is ignored.
    pub fn decide(&self, result: bool) -> bool {
        let mut state = self.state.lock();
        let Some(waiting) = state.queue.pop_front() else {
            tracing::debug!(result, "ignoring decision with no pending confirmation");
            return false;
        };
        self.settle(&mut state, waiting, result);
        true
    }

    /// Settle a specific request, only if it is the one on screen
    ///
    /// Guards against a stale dialog answering for a request that replaced it.
    pub fn decide_for(&self, id: RequestId, result: bool) -> bool {
        let mut state = self.state.lock();
        match state.queue.front() {
            Some(front) if front.id == id => {}
            _ => {
                tracing::debug!(request = %id, "ignoring decision for inactive confirmation");
                return false;
            }
        }
        let Some(waiting) = state.queue.pop_front() else {
            return false;
        };
        self.settle(&mut state, waiting, result);
        true
    }

    /// Resolve every outstanding request with `false` and close the dialog
    pub fn cancel_all(&self) {
        let mut state = self.state.lock();
        let count = state.queue.len();
        for waiting in state.queue.drain(..) {
            waiting.resolve(false);
        }
        self.modal.send_replace(None);
        if count > 0 {
            tracing::debug!(count, "cancelled pending confirmations");
        }
    }

    fn settle(&self, state: &mut BridgeState, waiting: Waiting, result: bool) {
        tracing::debug!(request = %waiting.id, result, "confirmation decided");
        waiting.resolve(result);
        self.modal.send_replace(None);

        // Requests whose callers stopped waiting are never shown.
        while let Some(next) = state.queue.front() {
            if next.is_abandoned() {
                tracing::debug!(request = %next.id, "skipping abandoned confirmation");
                state.queue.pop_front();
                continue;
            }
            tracing::debug!(request = %next.id, title = %next.config.title, "showing confirmation");
            self.modal.send_replace(Some(next.active()));
            break;
        }
    }
}

impl Default for ConfirmationBridge {
    fn default() -> Self {
        Self::new()
    }
}
