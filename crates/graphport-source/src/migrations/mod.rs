//! Knowledge base layout migrations.

use graphport_core::{SourceError, SourceResult};
use rusqlite_migration::{Migrations, M};

use crate::pool::SourcePool;

/// SQL schema definition.
const SCHEMA: &str = include_str!("schema.sql");

/// Create or upgrade the relational layout.
pub fn run_migrations(pool: &SourcePool) -> SourceResult<()> {
    let migrations = Migrations::new(vec![M::up(SCHEMA)]);

    pool.with_conn_mut(|conn| {
        migrations
            .to_latest(conn)
            .map_err(|e| SourceError::unavailable(format!("Migration failed: {}", e)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations() {
        let pool = SourcePool::in_memory().unwrap();
        run_migrations(&pool).unwrap();

        pool.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('DatabaseObject', 'attribute_value', 'schema_class', 'schema_attribute')",
                [],
                |row| row.get(0),
            )?;
            assert_eq!(count, 4);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_migrations_are_repeatable() {
        let pool = SourcePool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        run_migrations(&pool).unwrap();
    }
}
