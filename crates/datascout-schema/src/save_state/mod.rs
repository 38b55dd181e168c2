//! Save lifecycle tracking for annotation fields
//!
//! Every editable field (a column description, a table context, the global
//! context) gets its own `idle → saving → saved | error` lifecycle. A `saved`
//! badge falls back to `idle` on its own after a short delay.

mod key;
mod tracker;

#[cfg(test)]
mod tests;

pub use key::{SaveKey, SaveState};
pub use tracker::{DEFAULT_REVERT_DELAY, SaveOutcome, SaveStateTracker, SaveTicket};
