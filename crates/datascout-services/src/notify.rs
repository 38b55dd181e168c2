//! Notification surface
//!
//! Toasts are fire-and-forget; the display side decides how long they stay.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
    Info,
    Warning,
}

/// A short message for the user
#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Warning, message)
    }
}

/// Where services send user-facing notifications
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, toast: Toast);
}

/// Notifier that only writes toasts to the log
///
/// Used when no display surface is attached, e.g. in headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Error => tracing::error!(message = %toast.message, "toast"),
            ToastLevel::Warning => tracing::warn!(message = %toast.message, "toast"),
            ToastLevel::Success | ToastLevel::Info => {
                tracing::info!(level = ?toast.level, message = %toast.message, "toast")
            }
        }
    }
}
