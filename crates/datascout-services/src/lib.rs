//! DataScout Services Layer
//!
//! This crate provides the service layer that sits between the UI and the
//! schema state. Services orchestrate edits, persistence and confirmations and
//! give the UI a small async API.
//!
//! # Architecture
//!
//! ```text
//! UI Layer (forms, dialogs, toasts)
//!     ↓
//! Service Layer (datascout-services) ← This crate
//!     ↓
//! State Layer (datascout-schema, datascout-confirm)
//!     ↓
//! Core (datascout-core: entities, RemoteCall)
//! ```
//!
//! # Services
//!
//! - [`ConnectionService`] - Connect, delete, agent hand-off
//! - [`AnnotationService`] - Lazy column loading, description/context saves, lock toggles
//!
//! Both hold a [`ClientContext`], the explicitly owned state of one session.
//! Dialogs are answered through `ClientContext::confirmations`; user-facing
//! messages go to a [`Notifier`].

mod annotation_service;
mod connection_service;
mod context;
mod error;
pub mod logging;
mod notify;
mod settings;

pub use annotation_service::AnnotationService;
pub use connection_service::ConnectionService;
pub use context::ClientContext;
pub use error::{ServiceError, ServiceResult};
pub use notify::{Notifier, Toast, ToastLevel, TracingNotifier};
pub use settings::ScoutSettings;
