//! DataScout Confirm - Awaitable confirmation dialogs
//!
//! Turns the "show a dialog, wait for the user's click" interaction into a
//! future per request. The display surface watches a single slot holding the
//! dialog that should be on screen and reports the user's decision back.
//!
//! # Example
//!
//! ```ignore
//! use datascout_confirm::{ConfirmationBridge, ModalConfig, Severity};
//!
//! let bridge = ConfirmationBridge::new();
//! let mut dialogs = bridge.subscribe();
//!
//! let answer = bridge.request(
//!     ModalConfig::new("Delete Connection", "This clears all saved context.")
//!         .with_confirm_text("Delete")
//!         .with_severity(Severity::Danger),
//! );
//!
//! // Display side, once the user clicked:
//! bridge.decide(true);
//!
//! assert!(answer.await);
//! ```

mod bridge;
mod modal;


pub use bridge::{Confirmation, ConfirmationBridge, RequestId};
pub use modal::{ActiveModal, ModalConfig, Severity};
