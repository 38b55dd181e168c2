use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one editable field
///
/// Each variant is its own namespace, so a table called `global` can never
/// share a lifecycle with the global context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SaveKey {
    GlobalContext,
    TableContext(String),
    ColumnDescription { table: String, column: String },
}

impl SaveKey {
    pub fn table(table: impl Into<String>) -> Self {
        Self::TableContext(table.into())
    }

    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnDescription {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for SaveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveKey::GlobalContext => f.write_str("global"),
            SaveKey::TableContext(table) => write!(f, "table:{}", table),
            SaveKey::ColumnDescription { table, column } => {
                write!(f, "column:{}.{}", table, column)
            }
        }
    }
}

/// Visible save lifecycle of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

impl SaveState {
    pub fn is_saving(&self) -> bool {
        matches!(self, SaveState::Saving)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SaveState::Error)
    }
}
