use crate::SqliteSqlWriter;
use kiln_core::{Dialect, DriverError, Error, SqlWriter};

/// Extended result code of a violated UNIQUE constraint.
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;
/// Extended result code of a violated PRIMARY KEY constraint.
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;

#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }
    fn sql_writer(&self) -> &dyn SqlWriter {
        &SqliteSqlWriter
    }
    fn is_unique_constraint_error(&self, error: &Error) -> bool {
        DriverError::find(error).is_some_and(|v| {
            matches!(
                v.vendor_code,
                SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY
            )
        })
    }
    fn is_table_exists_error(&self, error: &Error) -> bool {
        DriverError::find(error).is_some_and(|v| v.message.contains("already exists"))
    }
}
