//! Dialog descriptions

use serde::{Deserialize, Serialize};

use crate::RequestId;

/// Visual weight of a confirmation dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Danger,
}

/// What a confirmation dialog shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalConfig {
    pub title: String,
    pub message: String,
    pub confirm_text: String,
    pub cancel_text: String,
    #[serde(rename = "type")]
    pub severity: Severity,
}

impl ModalConfig {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_text: "Confirm".to_string(),
            cancel_text: "Cancel".to_string(),
            severity: Severity::default(),
        }
    }

    pub fn with_confirm_text(mut self, text: impl Into<String>) -> Self {
        self.confirm_text = text.into();
        self
    }

    pub fn with_cancel_text(mut self, text: impl Into<String>) -> Self {
        self.cancel_text = text.into();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// The dialog currently on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveModal {
    pub id: RequestId,
    pub config: ModalConfig,
}
