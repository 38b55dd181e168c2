//! DataScout Schema - In-memory schema state for the annotation UI
//!
//! This crate provides:
//! - The schema cache (tables, lazily loaded columns, annotations, connection context)
//! - Per-key save lifecycle tracking with auto-reverting "saved" badges
//! - Optimistic lock toggles with relative rollback

pub mod cache;
pub mod save_state;
mod toggle;

pub use cache::{AnnotationIngest, Expansion, SchemaCache, SharedSchemaCache};
pub use save_state::{
    DEFAULT_REVERT_DELAY, SaveKey, SaveOutcome, SaveState, SaveStateTracker, SaveTicket,
};
pub use toggle::OptimisticToggle;

// Re-export core schema types that users will cache
pub use datascout_core::{Column, ColumnRecord, ConnectionInfo, Table, TableRecord};
