use datascout_core::{
    Column, ColumnRecord, ConnectionInfo, Result, ScoutError, Table, TableRecord,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// How server-provided column annotations are treated when a schema is ingested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationIngest {
    /// Start every column with an empty description and unlocked
    #[default]
    Reset,
    /// Keep descriptions and lock flags the server sent along with the schema
    Merge,
}

impl AnnotationIngest {
    fn column(&self, record: ColumnRecord) -> Column {
        let mut column = Column::new(record.name, record.data_type);
        if *self == AnnotationIngest::Merge {
            column.description = record.description.unwrap_or_default();
            column.is_locked = record.is_locked.unwrap_or(false);
        }
        column
    }

    fn table(&self, record: TableRecord) -> Table {
        let mut table = Table::new(record.name);
        table.context = record.table_context;
        table.columns = record
            .columns
            .map(|columns| columns.into_iter().map(|c| self.column(c)).collect());
        table
    }
}

/// Result of flipping a table's expanded flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expansion {
    pub expanded: bool,
    /// The table is now expanded but has no columns cached; the caller has to load them
    pub needs_columns: bool,
}

#[derive(Debug, Default)]
struct CacheState {
    connection: Option<ConnectionInfo>,
    tables: Vec<Table>,
    global_context: String,
    columns_loading: HashSet<String>,
}

impl CacheState {
    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| ScoutError::stale_table(name))
    }

    fn column_mut(&mut self, table: &str, column: &str) -> Result<&mut Column> {
        self.table_mut(table)?
            .column_mut(column)
            .ok_or_else(|| ScoutError::stale_column(table, column))
    }
}

/// Single source of truth for schema UI state
///
/// Only the connection flow replaces the table collection (`set_schema`,
/// `reset`); everything else reads it or mutates entities already present.
/// Operations naming a table or column that is not cached return
/// `ScoutError::StaleReference` and change nothing.
pub struct SchemaCache {
    state: RwLock<CacheState>,
    ingest: AnnotationIngest,
}

impl SchemaCache {
    /// Create an empty cache with the given ingest policy
    pub fn new(ingest: AnnotationIngest) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            ingest,
        }
    }

    pub fn ingest(&self) -> AnnotationIngest {
        self.ingest
    }

    // ========== Connection Context ==========

    /// Replace the whole table collection after a successful connect
    pub fn set_schema(
        &self,
        tables: Vec<TableRecord>,
        db_type: &str,
        db_name: &str,
        connection_id: i64,
    ) {
        let tables: Vec<Table> = tables.into_iter().map(|t| self.ingest.table(t)).collect();
        tracing::info!(
            connection_id,
            db_type = %db_type,
            db_name = %db_name,
            table_count = tables.len(),
            ingest = ?self.ingest,
            "schema set"
        );

        let mut state = self.state.write();
        *state = CacheState {
            connection: Some(ConnectionInfo {
                db_type: db_type.to_string(),
                db_name: db_name.to_string(),
                connection_id,
            }),
            tables,
            ..CacheState::default()
        };
    }

    pub fn connection(&self) -> Option<ConnectionInfo> {
        self.state.read().connection.clone()
    }

    pub fn connection_id(&self) -> Option<i64> {
        self.state.read().connection.as_ref().map(|c| c.connection_id)
    }

    pub fn is_connected(&self) -> bool {
        self.state.read().connection.is_some()
    }

    /// Drop the connection context and every cached entity
    pub fn reset(&self) {
        let mut state = self.state.write();
        tracing::info!(
            table_count = state.tables.len(),
            "clearing schema cache"
        );
        *state = CacheState::default();
    }

    // ========== Tables ==========

    pub fn list_tables(&self) -> Vec<Table> {
        self.state.read().tables.clone()
    }

    pub fn table(&self, name: &str) -> Option<Table> {
        self.state.read().tables.iter().find(|t| t.name == name).cloned()
    }

    /// Flip the expanded flag of a table
    pub fn toggle_expanded(&self, name: &str) -> Result<Expansion> {
        let mut state = self.state.write();
        let table = state.table_mut(name)?;
        table.expanded = !table.expanded;
        let expansion = Expansion {
            expanded: table.expanded,
            needs_columns: table.expanded && !table.has_columns(),
        };
        tracing::debug!(
            table = %name,
            expanded = expansion.expanded,
            needs_columns = expansion.needs_columns,
            "toggled table"
        );
        Ok(expansion)
    }

    // ========== Columns ==========

    /// Cached columns of a table, empty when unknown or not loaded. Never fetches.
    pub fn get_columns(&self, table: &str) -> Vec<Column> {
        let state = self.state.read();
        let result = state
            .tables
            .iter()
            .find(|t| t.name == table)
            .and_then(|t| t.columns.clone());
        if result.is_some() {
            tracing::trace!(table = %table, "cache hit for columns");
        } else {
            tracing::trace!(table = %table, "cache miss for columns");
        }
        result.unwrap_or_default()
    }

    /// Mark columns as loading to prevent duplicate loads
    ///
    /// Returns false if a load is already running for this table.
    pub fn mark_columns_loading(&self, table: &str) -> Result<bool> {
        let mut state = self.state.write();
        state.table_mut(table)?;
        if state.columns_loading.insert(table.to_string()) {
            tracing::debug!(table = %table, "marked columns as loading");
            Ok(true)
        } else {
            tracing::debug!(table = %table, "columns already loading, skipping");
            Ok(false)
        }
    }

    pub fn is_columns_loading(&self, table: &str) -> bool {
        self.state.read().columns_loading.contains(table)
    }

    /// Abandon a load without storing anything
    pub fn clear_columns_loading(&self, table: &str) {
        self.state.write().columns_loading.remove(table);
    }

    /// Store loaded columns for a table
    pub fn set_columns(&self, table: &str, columns: Vec<ColumnRecord>) -> Result<()> {
        let mut state = self.state.write();
        state.columns_loading.remove(table);
        let ingest = self.ingest;
        let entry = state.table_mut(table)?;
        entry.columns = Some(columns.into_iter().map(|c| ingest.column(c)).collect());
        tracing::debug!(
            table = %table,
            column_count = entry.columns.as_ref().map_or(0, Vec::len),
            "cached columns"
        );
        Ok(())
    }

    // ========== Annotations ==========

    pub fn set_table_context(&self, table: &str, context: &str) -> Result<()> {
        let mut state = self.state.write();
        state.table_mut(table)?.context = Some(context.to_string());
        Ok(())
    }

    /// Store a column description; refused while the column is locked
    pub fn set_column_description(&self, table: &str, column: &str, description: &str) -> Result<()> {
        let mut state = self.state.write();
        let entry = state.column_mut(table, column)?;
        if entry.is_locked {
            return Err(ScoutError::ColumnLocked {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
        entry.description = description.to_string();
        Ok(())
    }

    pub fn column_locked(&self, table: &str, column: &str) -> Option<bool> {
        self.state
            .read()
            .tables
            .iter()
            .find(|t| t.name == table)?
            .column(column)
            .map(|c| c.is_locked)
    }

    /// Set the lock flag of a column and return the value it replaced
    pub fn set_column_locked(&self, table: &str, column: &str, locked: bool) -> Result<bool> {
        let mut state = self.state.write();
        let entry = state.column_mut(table, column)?;
        let previous = std::mem::replace(&mut entry.is_locked, locked);
        Ok(previous)
    }

    /// Invert the lock flag of a column and return the value it replaced
    pub fn toggle_column_locked(&self, table: &str, column: &str) -> Result<bool> {
        let mut state = self.state.write();
        let entry = state.column_mut(table, column)?;
        entry.is_locked = !entry.is_locked;
        Ok(!entry.is_locked)
    }

    pub fn global_context(&self) -> String {
        self.state.read().global_context.clone()
    }

    pub fn set_global_context(&self, context: &str) {
        self.state.write().global_context = context.to_string();
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(AnnotationIngest::default())
    }
}

/// Thread-safe wrapper for sharing a SchemaCache
pub type SharedSchemaCache = Arc<SchemaCache>;
