//! Optimistic lock toggles

use datascout_core::Result;

use crate::SchemaCache;

/// A lock flip that is already visible locally but not yet confirmed remotely
///
/// Captures the value the column had right before this particular flip, so a
/// rollback restores that value rather than some older snapshot. Two quick
/// toggles therefore each undo only their own change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticToggle {
    table: String,
    column: String,
    previous: bool,
}

impl OptimisticToggle {
    /// Flip the lock flag of a column in the cache
    pub fn apply(cache: &SchemaCache, table: &str, column: &str) -> Result<Self> {
        let previous = cache.toggle_column_locked(table, column)?;
        tracing::debug!(
            table = %table,
            column = %column,
            locked = !previous,
            "applied optimistic lock toggle"
        );
        Ok(Self {
            table: table.to_string(),
            column: column.to_string(),
            previous,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Value the column had before this toggle
    pub fn previous(&self) -> bool {
        self.previous
    }

    /// Value this toggle wrote and wants persisted
    pub fn applied(&self) -> bool {
        !self.previous
    }

    /// Undo this toggle after its persistence failed
    ///
    /// A column that disappeared in the meantime (reconnect, disconnect) is
    /// left alone and reported as a stale reference.
    pub fn rollback(&self, cache: &SchemaCache) -> Result<()> {
        cache.set_column_locked(&self.table, &self.column, self.previous)?;
        tracing::debug!(
            table = %self.table,
            column = %self.column,
            locked = self.previous,
            "rolled back lock toggle"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datascout_core::{ColumnRecord, TableRecord};

    fn cache() -> SchemaCache {
        let cache = SchemaCache::default();
        cache.set_schema(
            vec![TableRecord::new("users").with_columns(vec![ColumnRecord::new("email", "text")])],
            "postgresql",
            "mydb",
            7,
        );
        cache
    }

    #[test]
    fn test_apply_flips_immediately() {
        let cache = cache();
        let toggle = OptimisticToggle::apply(&cache, "users", "email").unwrap();

        assert!(!toggle.previous());
        assert!(toggle.applied());
        assert_eq!(cache.column_locked("users", "email"), Some(true));
    }

    #[test]
    fn test_rollback_restores_previous_value() {
        let cache = cache();
        let toggle = OptimisticToggle::apply(&cache, "users", "email").unwrap();
        toggle.rollback(&cache).unwrap();

        assert_eq!(cache.column_locked("users", "email"), Some(false));
    }

    #[test]
    fn test_first_failure_does_not_clobber_second_toggle() {
        let cache = cache();
        let first = OptimisticToggle::apply(&cache, "users", "email").unwrap();
        let second = OptimisticToggle::apply(&cache, "users", "email").unwrap();
        assert_eq!(second.previous(), true);
        assert_eq!(second.applied(), false);

        // First persistence fails, second succeeds.
        first.rollback(&cache).unwrap();

        assert_eq!(cache.column_locked("users", "email"), Some(second.applied()));
    }

    #[test]
    fn test_stale_column() {
        let cache = cache();
        assert!(OptimisticToggle::apply(&cache, "users", "missing")
            .unwrap_err()
            .is_stale_reference());

        let toggle = OptimisticToggle::apply(&cache, "users", "email").unwrap();
        cache.reset();
        assert!(toggle.rollback(&cache).unwrap_err().is_stale_reference());
    }
}
