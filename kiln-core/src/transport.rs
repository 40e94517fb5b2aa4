use crate::{ExecutionOptions, Result, Statement, Value};
use futures::{future::BoxFuture, stream::BoxStream};
use std::{
    fmt::{self, Display},
    sync::Arc,
};

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v.eq_ignore_ascii_case(name))
            .map(|i| &self.values()[i])
    }
}

/// Outcome of a data changing statement.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    /// Rows affected.
    pub count: u64,
    /// Keys generated by the database, in insertion order.
    pub generated_keys: Vec<i64>,
}

/// Outcome of a batch: one count per statement, in order.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub counts: Vec<u64>,
    pub generated_keys: Vec<i64>,
}

impl Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rows affected", self.count)
    }
}

/// Blocking execution of statements, one statement in flight at a time.
pub trait Transport: Send {
    /// Runs a query, every row is handed to `handler` as soon as it is read.
    fn execute_query(
        &mut self,
        statement: &Statement,
        options: &ExecutionOptions,
        handler: &mut dyn FnMut(RowLabeled) -> Result<()>,
    ) -> Result<()>;

    fn execute_update(
        &mut self,
        statement: &Statement,
        options: &ExecutionOptions,
        return_generated_keys: bool,
    ) -> Result<UpdateResult>;

    fn execute_batch(
        &mut self,
        statements: &[Statement],
        options: &ExecutionOptions,
        return_generated_keys: bool,
    ) -> Result<BatchResult>;

    /// Runs a statement producing neither rows nor counts of interest.
    fn execute(&mut self, statement: &Statement, options: &ExecutionOptions) -> Result<()>;
}

/// Asynchronous execution, queries produce a lazy, single consumer stream of rows.
///
/// Dropping the stream before its end releases the underlying cursor.
pub trait StreamTransport: Send {
    fn execute_query<'a>(
        &'a mut self,
        statement: Statement,
        options: ExecutionOptions,
    ) -> BoxStream<'a, Result<RowLabeled>>;

    fn execute_update<'a>(
        &'a mut self,
        statement: Statement,
        options: ExecutionOptions,
        return_generated_keys: bool,
    ) -> BoxFuture<'a, Result<UpdateResult>>;

    fn execute_batch<'a>(
        &'a mut self,
        statements: Vec<Statement>,
        options: ExecutionOptions,
        return_generated_keys: bool,
    ) -> BoxFuture<'a, Result<BatchResult>>;

    fn execute<'a>(
        &'a mut self,
        statement: Statement,
        options: ExecutionOptions,
    ) -> BoxFuture<'a, Result<()>>;
}
