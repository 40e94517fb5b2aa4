mod mysql;
mod postgres;

pub use mysql::*;
pub use postgres::*;

use crate::{DriverError, Error, GenericSqlWriter, SqlWriter};
use std::fmt::Debug;

/// Everything that changes between databases: the sql writer and the classification of the
/// errors the transport reports.
pub trait Dialect: Send + Sync + Debug {
    fn name(&self) -> &'static str;
    fn sql_writer(&self) -> &dyn SqlWriter;
    /// The error reports a unique constraint violation.
    fn is_unique_constraint_error(&self, error: &Error) -> bool {
        DriverError::find(error).is_some_and(|v| v.sql_state == "23505")
    }
    /// The error reports that a table being created exists already.
    fn is_table_exists_error(&self, error: &Error) -> bool {
        DriverError::find(error).is_some_and(|v| v.sql_state == "42P07")
    }
    /// The error reports that a sequence being created exists already.
    fn is_sequence_exists_error(&self, _error: &Error) -> bool {
        false
    }
}

/// Standard SQL, used by dry runs when no database is involved.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericDialect;

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }
    fn sql_writer(&self) -> &dyn SqlWriter {
        &GenericSqlWriter
    }
}
