//! Schema entities and the payloads they are built from

use serde::{Deserialize, Serialize};

/// A column as the UI sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Source-provided type name, never edited client side
    #[serde(rename = "type")]
    pub data_type: String,
    pub description: String,
    pub is_locked: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            description: String::new(),
            is_locked: false,
        }
    }
}

/// A table as the UI sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Table-level annotation
    pub context: Option<String>,
    /// `None` until the columns have been loaded
    pub columns: Option<Vec<Column>>,
    pub expanded: bool,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: None,
            columns: None,
            expanded: false,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.as_ref()?.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.as_mut()?.iter_mut().find(|c| c.name == name)
    }

    pub fn has_columns(&self) -> bool {
        self.columns.is_some()
    }
}

/// Column entry of a schema payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
}

impl ColumnRecord {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            description: None,
            is_locked: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.is_locked = Some(locked);
        self
    }
}

/// Table entry of a schema payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnRecord>>,
}

impl TableRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_context: None,
            columns: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.table_context = Some(context.into());
        self
    }

    pub fn with_columns(mut self, columns: Vec<ColumnRecord>) -> Self {
        self.columns = Some(columns);
        self
    }
}

/// Body of a successful connect response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub connection_id: i64,
    pub tables: Vec<TableRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_schema_response_parses_backend_payload() {
        let body = serde_json::json!({
            "connection_id": 7,
            "tables": [
                {"name": "users", "columns": [{"name": "id", "type": "int"}]},
                {"name": "orders", "table_context": "One row per checkout"}
            ]
        });

        let response: SchemaResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.connection_id, 7);
        assert_eq!(
            response.tables,
            vec![
                TableRecord::new("users").with_columns(vec![ColumnRecord::new("id", "int")]),
                TableRecord::new("orders").with_context("One row per checkout"),
            ]
        );
    }

    #[test]
    fn test_column_lookup() {
        let mut table = Table::new("users");
        assert!(table.column("id").is_none());

        table.columns = Some(vec![Column::new("id", "int"), Column::new("email", "text")]);
        assert_eq!(table.column("email").map(|c| c.data_type.as_str()), Some("text"));

        table.column_mut("id").unwrap().is_locked = true;
        assert!(table.column("id").unwrap().is_locked);
    }
}
